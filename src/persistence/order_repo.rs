//! Order repository for `SQLite` persistence.
//!
//! An order is written as one transaction: the header first, with its
//! public `order_number` allocated inside the insert statement, then every
//! item row keyed by the header's internal `id`, and finally the
//! customer's session is put back to WELCOME. Any failure drops the
//! transaction, which rolls back, so a header is never visible without
//! its items and a committed order never leaves its session at CONFIRM.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use crate::conversation::status::{phone_digits, phone_suffix, PHONE_SUFFIX_DIGITS};
use crate::conversation::{OrderLookup, OrderSink};
use crate::models::money::Money;
use crate::models::order::{
    NewOrder, Order, OrderItem, OrderStatus, OrderType, PaymentMethod, CHANNEL_WHATSAPP,
};
use crate::{AppError, Result};

use super::db::Database;
use super::session_repo;

/// Repository for order headers and items.
#[derive(Clone)]
pub struct OrderRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: i64,
    channel: String,
    order_type: String,
    status: String,
    customer_name: String,
    phone: String,
    delivery_address: Option<String>,
    payment_method: String,
    subtotal_cents: i64,
    delivery_fee_cents: i64,
    total_cents: i64,
    created_at: String,
}

impl OrderRow {
    fn into_order(self) -> Result<Order> {
        let created_at = chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| AppError::Db(format!("invalid created_at: {e}")))?
            .with_timezone(&Utc);

        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            channel: self.channel,
            order_type: OrderType::parse(&self.order_type)?,
            status: OrderStatus::parse(&self.status)?,
            customer_name: self.customer_name,
            phone: self.phone,
            delivery_address: self.delivery_address,
            payment_method: PaymentMethod::parse(&self.payment_method)?,
            subtotal: Money::from_cents(self.subtotal_cents),
            delivery_fee: Money::from_cents(self.delivery_fee_cents),
            total: Money::from_cents(self.total_cents),
            created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
}

impl OrderItemRow {
    fn into_item(self) -> Result<OrderItem> {
        let quantity = u32::try_from(self.quantity)
            .map_err(|e| AppError::Db(format!("invalid quantity: {e}")))?;
        Ok(OrderItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity,
            unit_price: Money::from_cents(self.unit_price_cents),
            total_price: Money::from_cents(self.total_price_cents),
        })
    }
}

// `phone` with the usual formatting characters stripped, for comparing
// stored numbers against digit strings.
const STORED_PHONE_DIGITS: &str = "REPLACE(REPLACE(REPLACE(REPLACE(REPLACE(REPLACE(
         phone, '+', ''), ' ', ''), '-', ''), '(', ''), ')', ''), '.', '')";

const ORDER_COLUMNS: &str = "id, order_number, channel, order_type, status, customer_name, phone,
     delivery_address, payment_method, subtotal_cents, delivery_fee_cents, total_cents, created_at";

impl OrderRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Persist a header and its items atomically; returns the public number.
    ///
    /// The ordering customer's session is reset in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an order without items, or
    /// `AppError::Db` if any write fails (nothing is persisted).
    pub async fn create_order(&self, order: &NewOrder) -> Result<i64> {
        if order.items.is_empty() {
            return Err(AppError::Validation("order has no items".into()));
        }

        let order_id = Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        let mut tx = self.db.begin().await?;

        let (order_number,): (i64,) = sqlx::query_as(
            "INSERT INTO customer_order (id, order_number, channel, order_type, status,
                 customer_name, phone, delivery_address, payment_method,
                 subtotal_cents, delivery_fee_cents, total_cents, created_at)
             VALUES (?1, (SELECT COALESCE(MAX(order_number), 0) + 1 FROM customer_order),
                 ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             RETURNING order_number",
        )
        .bind(&order_id)
        .bind(CHANNEL_WHATSAPP)
        .bind(order.order_type.as_str())
        .bind(OrderStatus::Pending.as_str())
        .bind(&order.customer_name)
        .bind(&order.phone)
        .bind(&order.delivery_address)
        .bind(order.payment_method.as_str())
        .bind(order.subtotal.cents())
        .bind(order.delivery_fee.cents())
        .bind(order.total.cents())
        .bind(&created_at)
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_item (id, order_id, product_id, product_name, quantity,
                     unit_price_cents, total_price_cents)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.cents())
            .bind(item.total_price().cents())
            .execute(&mut *tx)
            .await?;
        }

        session_repo::reset_on(&mut *tx, &order.phone).await?;

        tx.commit().await?;

        info!(
            order_id = %order_id,
            order_number,
            items = order.items.len(),
            "order persisted"
        );
        Ok(order_number)
    }

    /// Open (non-terminal) orders for `phone`, newest first.
    ///
    /// Matches the stored phone exactly, or compares the digits of both
    /// sides in full or by their last eight.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn find_open_orders(&self, phone: &str, limit: u32) -> Result<Vec<Order>> {
        let digits = phone_digits(phone);
        let suffix_pattern = if digits.len() >= PHONE_SUFFIX_DIGITS {
            format!("%{}", phone_suffix(&digits, PHONE_SUFFIX_DIGITS))
        } else {
            // Too short to suffix-match safely; fall back to exact digits.
            digits.clone()
        };

        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order
             WHERE (phone = ?1
                    OR (?2 <> '' AND ({STORED_PHONE_DIGITS} = ?2
                                      OR {STORED_PHONE_DIGITS} LIKE ?3)))
               AND status NOT IN ('delivered', 'cancelled')
             ORDER BY created_at DESC, order_number DESC
             LIMIT ?4"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&query)
            .bind(phone)
            .bind(&digits)
            .bind(&suffix_pattern)
            .bind(i64::from(limit))
            .fetch_all(self.db.as_ref())
            .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    /// Order by public number, in any status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn find_by_number(&self, order_number: i64) -> Result<Option<Order>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM customer_order WHERE order_number = ?1");
        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(order_number)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// Item rows of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_items(&self, order_id: &str) -> Result<Vec<OrderItem>> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, product_id, product_name, quantity,
                    unit_price_cents, total_price_cents
             FROM order_item WHERE order_id = ?1 ORDER BY rowid ASC",
        )
        .bind(order_id)
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(OrderItemRow::into_item).collect()
    }
}

impl OrderSink for OrderRepo {
    fn create_order<'a>(
        &'a self,
        order: &'a NewOrder,
    ) -> Pin<Box<dyn Future<Output = Result<i64>> + Send + 'a>> {
        Box::pin(OrderRepo::create_order(self, order))
    }
}

impl OrderLookup for OrderRepo {
    fn find_open_orders<'a>(
        &'a self,
        phone: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Order>>> + Send + 'a>> {
        Box::pin(OrderRepo::find_open_orders(self, phone, limit))
    }

    fn find_by_number(
        &self,
        number: i64,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Order>>> + Send + '_>> {
        Box::pin(OrderRepo::find_by_number(self, number))
    }
}
