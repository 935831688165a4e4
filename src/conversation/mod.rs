//! Conversational ordering core.
//!
//! A turn flows through the [`interceptor`] (global commands and status
//! queries) and, when nothing there matches, the [`engine`] state machine.
//! Both talk to storage only through the [`CatalogGateway`],
//! [`OrderSink`], and [`OrderLookup`] traits so the flow can be driven
//! against `SQLite` in production and against fakes in tests.

pub mod engine;
pub mod interceptor;
pub mod render;
pub mod rules;
pub mod service;
pub mod status;

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::models::catalog::{Category, Product};
use crate::models::order::{NewOrder, Order};
use crate::models::session::{ConversationState, SessionContext};
use crate::Result;

pub use service::ConversationService;

/// One selectable option of a button reply.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReplyOption {
    /// Value returned by the provider when the button is tapped.
    pub id: String,
    /// Button caption.
    pub label: String,
}

impl ReplyOption {
    /// Build an option.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Outbound message produced by a turn.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// Plain text.
    Text {
        /// Message body.
        text: String,
    },
    /// Structured message with reply buttons.
    Buttons {
        /// Bold heading.
        title: String,
        /// Body shown above the buttons.
        description: String,
        /// Buttons in display order.
        options: Vec<ReplyOption>,
    },
}

impl Reply {
    /// Plain-text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Button reply.
    pub fn buttons(
        title: impl Into<String>,
        description: impl Into<String>,
        options: Vec<ReplyOption>,
    ) -> Self {
        Self::Buttons {
            title: title.into(),
            description: description.into(),
            options,
        }
    }

    /// Render as a single text message; buttons become `*1* - label` lines.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Buttons {
                title,
                description,
                options,
            } => render::buttons_as_text(title, description, options),
        }
    }
}

/// Result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// State to persist.
    pub state: ConversationState,
    /// Context to persist.
    pub context: SessionContext,
    /// Message to send back.
    pub reply: Reply,
}

impl Turn {
    /// Bundle a turn result.
    #[must_use]
    pub fn new(state: ConversationState, context: SessionContext, reply: Reply) -> Self {
        Self {
            state,
            context,
            reply,
        }
    }
}

/// Read-only access to the active catalog.
///
/// Queried on every turn; implementations must not cache across turns.
pub trait CatalogGateway: Send + Sync {
    /// Active categories ordered by display order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Db`](crate::AppError::Db) if the query fails.
    fn list_categories(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Category>>> + Send + '_>>;

    /// Active products of a category ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Db`](crate::AppError::Db) if the query fails.
    fn list_products<'a>(
        &'a self,
        category_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Product>>> + Send + 'a>>;
}

/// Atomic creation of an order header with its items.
pub trait OrderSink: Send + Sync {
    /// Persist `order` and return its public order number.
    ///
    /// Either the header and every item become visible, or nothing does.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Db`](crate::AppError::Db) on any storage failure.
    fn create_order<'a>(
        &'a self,
        order: &'a NewOrder,
    ) -> Pin<Box<dyn Future<Output = Result<i64>> + Send + 'a>>;
}

/// Order queries backing status questions.
pub trait OrderLookup: Send + Sync {
    /// Open orders for `phone`, newest first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Db`](crate::AppError::Db) if the query fails.
    fn find_open_orders<'a>(
        &'a self,
        phone: &'a str,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Order>>> + Send + 'a>>;

    /// Order with public number `number`, in any status.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Db`](crate::AppError::Db) if the query fails.
    fn find_by_number(
        &self,
        number: i64,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Order>>> + Send + '_>>;
}
