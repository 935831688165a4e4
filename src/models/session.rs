//! Conversation session model: state, context, and cart helpers.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::order::{OrderType, PaymentMethod};
use crate::AppError;

/// Position of a customer in the conversational flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    /// Initial state; waits for a greeting or menu request.
    #[default]
    Welcome,
    /// Category list shown.
    Menu,
    /// Product list of the selected category shown.
    Category,
    /// Asking for the customer name.
    CheckoutName,
    /// Asking for pickup or delivery.
    CheckoutType,
    /// Asking for the delivery address.
    CheckoutAddress,
    /// Asking for the payment method.
    CheckoutPayment,
    /// Order summary shown; waiting for confirmation.
    Confirm,
    /// Cart view.
    Cart,
    /// Several open orders listed; waiting for the customer to pick one.
    AwaitingOrderNumber,
}

impl ConversationState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Welcome,
        Self::Menu,
        Self::Category,
        Self::CheckoutName,
        Self::CheckoutType,
        Self::CheckoutAddress,
        Self::CheckoutPayment,
        Self::Confirm,
        Self::Cart,
        Self::AwaitingOrderNumber,
    ];

    /// Persisted name of the state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "WELCOME",
            Self::Menu => "MENU",
            Self::Category => "CATEGORY",
            Self::CheckoutName => "CHECKOUT_NAME",
            Self::CheckoutType => "CHECKOUT_TYPE",
            Self::CheckoutAddress => "CHECKOUT_ADDRESS",
            Self::CheckoutPayment => "CHECKOUT_PAYMENT",
            Self::Confirm => "CONFIRM",
            Self::Cart => "CART",
            Self::AwaitingOrderNumber => "AWAITING_ORDER_NUMBER",
        }
    }
}

impl Display for ConversationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| AppError::Db(format!("invalid conversation state: {s}")))
    }
}

/// One product line in the cart.
///
/// Name and price are snapshots taken when the product was first added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Catalog product identifier.
    pub product_id: String,
    /// Product name at add-time.
    pub product_name: String,
    /// Units selected.
    pub quantity: u32,
    /// Unit price at add-time.
    #[serde(rename = "price")]
    pub unit_price: Money,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Mutable per-customer data accumulated by the flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Cart lines in insertion order.
    #[serde(default)]
    pub cart: Vec<CartLine>,
    /// Category currently being browsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_category: Option<String>,
    /// Name given at checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Pickup or delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    /// Only set for delivery orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    /// Chosen payment method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

impl SessionContext {
    /// Add one unit of a product, incrementing an existing line with the
    /// same product id. An existing line keeps its original price and name.
    pub fn add_to_cart(&mut self, product_id: &str, product_name: &str, unit_price: Money) {
        if let Some(line) = self.cart.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity += 1;
            return;
        }
        self.cart.push(CartLine {
            product_id: product_id.to_owned(),
            product_name: product_name.to_owned(),
            quantity: 1,
            unit_price,
        });
    }

    /// Σ line totals.
    #[must_use]
    pub fn cart_total(&self) -> Money {
        self.cart.iter().map(CartLine::line_total).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn cart_is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Drop the cart lines but keep the rest of the context.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }
}

/// Persisted conversation record, one per phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Customer phone number (primary key).
    pub phone_number: String,
    /// Current flow position.
    pub current_state: ConversationState,
    /// Accumulated context.
    pub context: SessionContext,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last save timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session at WELCOME with an empty cart.
    #[must_use]
    pub fn new(phone_number: String) -> Self {
        let now = Utc::now();
        Self {
            phone_number,
            current_state: ConversationState::Welcome,
            context: SessionContext::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
