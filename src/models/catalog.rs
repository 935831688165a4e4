//! Read-only catalog entities.

use serde::{Deserialize, Serialize};

use super::money::Money;

/// An active menu category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Catalog identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// An active product within a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Catalog identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional short description.
    pub description: Option<String>,
    /// Current unit price.
    pub price: Money,
}
