//! Order header, order item, and their enumerations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::Money;
use super::session::SessionContext;
use crate::{AppError, Result};

/// Sales channel recorded on every order created by this service.
pub const CHANNEL_WHATSAPP: &str = "WHATSAPP";

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Pickup / eat-in.
    Presencial,
    /// Delivered to an address; carries the delivery fee.
    Delivery,
}

impl OrderType {
    /// Persisted code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Presencial => "PRESENCIAL",
            Self::Delivery => "DELIVERY",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Presencial => "Retirada no local",
            Self::Delivery => "Delivery",
        }
    }

    /// Parse a persisted code.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` for unknown codes.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PRESENCIAL" => Ok(Self::Presencial),
            "DELIVERY" => Ok(Self::Delivery),
            other => Err(AppError::Db(format!("invalid order type: {other}"))),
        }
    }
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash.
    Dinheiro,
    /// PIX instant transfer.
    Pix,
    /// Card on delivery/pickup.
    Cartao,
}

impl PaymentMethod {
    /// Persisted code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dinheiro => "DINHEIRO",
            Self::Pix => "PIX",
            Self::Cartao => "CARTAO",
        }
    }

    /// Customer-facing label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Dinheiro => "Dinheiro",
            Self::Pix => "PIX",
            Self::Cartao => "Cartão",
        }
    }

    /// Parse a persisted code.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` for unknown codes.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "DINHEIRO" => Ok(Self::Dinheiro),
            "PIX" => Ok(Self::Pix),
            "CARTAO" => Ok(Self::Cartao),
            other => Err(AppError::Db(format!("invalid payment method: {other}"))),
        }
    }
}

/// Kitchen/delivery lifecycle status, owned by staff-facing tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received, not yet acknowledged by the store.
    Pending,
    /// Acknowledged by the store.
    Confirmed,
    /// In the kitchen.
    Preparing,
    /// Ready for pickup or dispatch.
    Ready,
    /// With the courier.
    OutForDelivery,
    /// Terminal: handed to the customer.
    Delivered,
    /// Terminal: cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Persisted code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a persisted code.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` for unknown codes.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::Db(format!("invalid order status: {other}"))),
        }
    }

    /// Delivered and cancelled orders are closed.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// A persisted order header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Internal record identity (uuid); referenced by item rows.
    pub id: String,
    /// Customer-facing sequence number.
    pub order_number: i64,
    /// Sales channel.
    pub channel: String,
    /// Pickup or delivery.
    pub order_type: OrderType,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Name given at checkout.
    pub customer_name: String,
    /// Customer phone number.
    pub phone: String,
    /// Delivery address, delivery orders only.
    pub delivery_address: Option<String>,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Σ item totals.
    pub subtotal: Money,
    /// Delivery fee, zero for pickup.
    pub delivery_fee: Money,
    /// `subtotal + delivery_fee`.
    pub total: Money,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A persisted, denormalized order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    /// Row identifier.
    pub id: String,
    /// Internal identity of the owning header.
    pub order_id: String,
    /// Catalog product identifier.
    pub product_id: String,
    /// Product name snapshot.
    pub product_name: String,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price snapshot.
    pub unit_price: Money,
    /// `unit_price × quantity`.
    pub total_price: Money,
}

/// Item row of an order about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    /// Catalog product identifier.
    pub product_id: String,
    /// Product name snapshot.
    pub product_name: String,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price snapshot.
    pub unit_price: Money,
}

impl NewOrderItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Fully validated checkout, ready to be written by an order sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Customer phone number.
    pub phone: String,
    /// Name given at checkout.
    pub customer_name: String,
    /// Pickup or delivery.
    pub order_type: OrderType,
    /// Delivery address, delivery orders only.
    pub delivery_address: Option<String>,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Lines copied from the cart.
    pub items: Vec<NewOrderItem>,
    /// Σ item totals.
    pub subtotal: Money,
    /// Fee applied (zero unless delivery).
    pub delivery_fee: Money,
    /// `subtotal + delivery_fee`.
    pub total: Money,
}

/// Totals computed from a cart snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    /// Σ line totals.
    pub subtotal: Money,
    /// Delivery fee (zero unless delivery).
    pub delivery_fee: Money,
    /// `subtotal + delivery_fee`.
    pub total: Money,
}

impl OrderTotals {
    /// Compute totals for the context's cart and order type.
    #[must_use]
    pub fn compute(context: &SessionContext, delivery_fee: Money) -> Self {
        let subtotal = context.cart_total();
        let delivery_fee = if context.order_type == Some(OrderType::Delivery) {
            delivery_fee
        } else {
            Money::ZERO
        };
        Self {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}

impl NewOrder {
    /// Build an order from a completed checkout context.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the cart is empty or a checkout
    /// field required by the order type is missing.
    pub fn from_context(phone: &str, context: &SessionContext, delivery_fee: Money) -> Result<Self> {
        if context.cart_is_empty() {
            return Err(AppError::Validation("cart is empty".into()));
        }
        let customer_name = context
            .customer_name
            .clone()
            .ok_or_else(|| AppError::Validation("customer name missing".into()))?;
        let order_type = context
            .order_type
            .ok_or_else(|| AppError::Validation("order type missing".into()))?;
        let payment_method = context
            .payment_method
            .ok_or_else(|| AppError::Validation("payment method missing".into()))?;
        let delivery_address = match order_type {
            OrderType::Delivery => Some(
                context
                    .delivery_address
                    .clone()
                    .ok_or_else(|| AppError::Validation("delivery address missing".into()))?,
            ),
            OrderType::Presencial => None,
        };

        let totals = OrderTotals::compute(context, delivery_fee);
        let items = context
            .cart
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        Ok(Self {
            phone: phone.to_owned(),
            customer_name,
            order_type,
            delivery_address,
            payment_method,
            items,
            subtotal: totals.subtotal,
            delivery_fee: totals.delivery_fee,
            total: totals.total,
        })
    }
}
