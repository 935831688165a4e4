//! Read-only catalog repository for `SQLite` persistence.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::conversation::CatalogGateway;
use crate::models::catalog::{Category, Product};
use crate::models::money::Money;
use crate::Result;

use super::db::Database;

/// Repository for active categories and products.
#[derive(Clone)]
pub struct CatalogRepo {
    db: Arc<Database>,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    price_cents: i64,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: Money::from_cents(self.price_cents),
        }
    }
}

impl CatalogRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Active categories ordered by `display_order`, then name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, name FROM category
             WHERE active = 1
             ORDER BY display_order ASC, name ASC",
        )
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Category {
                id: row.id,
                name: row.name,
            })
            .collect())
    }

    /// Active products of `category_id` ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_products(&self, category_id: &str) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT id, name, description, price_cents FROM product
             WHERE category_id = ?1 AND active = 1
             ORDER BY name ASC",
        )
        .bind(category_id)
        .fetch_all(self.db.as_ref())
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }
}

impl CatalogGateway for CatalogRepo {
    fn list_categories(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Category>>> + Send + '_>> {
        Box::pin(CatalogRepo::list_categories(self))
    }

    fn list_products<'a>(
        &'a self,
        category_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Product>>> + Send + 'a>> {
        Box::pin(CatalogRepo::list_products(self, category_id))
    }
}
