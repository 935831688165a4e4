//! Order status presentation, order-number extraction, and phone matching.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use super::rules;
use crate::models::order::{Order, OrderStatus};

/// Human presentation of an order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInfo {
    /// Leading emoji.
    pub emoji: &'static str,
    /// Short label.
    pub label: &'static str,
    /// One-sentence explanation.
    pub description: &'static str,
}

/// Presentation for each status code.
#[must_use]
pub fn status_info(status: OrderStatus) -> StatusInfo {
    match status {
        OrderStatus::Pending => StatusInfo {
            emoji: "🕐",
            label: "Recebido",
            description: "Seu pedido foi recebido e aguarda confirmação da loja.",
        },
        OrderStatus::Confirmed => StatusInfo {
            emoji: "✅",
            label: "Confirmado",
            description: "A loja confirmou seu pedido.",
        },
        OrderStatus::Preparing => StatusInfo {
            emoji: "👨‍🍳",
            label: "Em preparo",
            description: "Seu pedido está sendo preparado.",
        },
        OrderStatus::Ready => StatusInfo {
            emoji: "📦",
            label: "Pronto",
            description: "Seu pedido está pronto.",
        },
        OrderStatus::OutForDelivery => StatusInfo {
            emoji: "🛵",
            label: "Saiu para entrega",
            description: "Seu pedido está a caminho.",
        },
        OrderStatus::Delivered => StatusInfo {
            emoji: "🎉",
            label: "Entregue",
            description: "Seu pedido foi entregue. Bom apetite!",
        },
        OrderStatus::Cancelled => StatusInfo {
            emoji: "❌",
            label: "Cancelado",
            description: "Este pedido foi cancelado.",
        },
    }
}

/// Detail message for a single order.
#[must_use]
pub fn format_order(order: &Order) -> String {
    let info = status_info(order.status);
    format!(
        "{emoji} *Pedido #{number}*\n\
         Status: *{label}*\n\
         {description}\n\n\
         📦 Tipo: {order_type}\n\
         💰 Total: {total}",
        emoji = info.emoji,
        number = order.order_number,
        label = info.label,
        description = info.description,
        order_type = order.order_type.label(),
        total = order.total,
    )
}

/// List of open orders asking the customer to pick one by order number.
///
/// Lines carry no position index: a bare number typed back is read as an
/// order number, never as a list position.
#[must_use]
pub fn format_order_list(orders: &[Order]) -> String {
    let mut text = String::from("📋 Você tem mais de um pedido em andamento:\n\n");
    for order in orders {
        let info = status_info(order.status);
        let _ = writeln!(
            text,
            "• Pedido #{} — {} {}",
            order.order_number,
            info.emoji,
            info.label
        );
    }
    text.push_str("\nDigite o *número do pedido* (ex: #123) que deseja consultar.");
    text
}

/// No open orders for this phone.
pub const NO_OPEN_ORDERS: &str =
    "📭 Você não tem pedidos em andamento. Digite *cardápio* para fazer um pedido.";

/// Disambiguation input carried no order number.
pub const ORDER_NUMBER_PROMPT: &str =
    "🔢 Não identifiquei o número do pedido. Digite o número (ex: #123) ou *cancelar* para sair.";

/// Order number not found (or not this customer's).
#[must_use]
pub fn order_not_found(number: i64) -> String {
    format!("🔍 Não encontrei o pedido #{number}. Confira o número e tente novamente, ou digite *cancelar* para sair.")
}

// Tried in order; first capture wins. Operates on normalized input.
const EXPLICIT_NUMBER_PATTERNS: &[&str] = &[
    r"pedido\s*#?\s*(\d+)",
    r"#\s*(\d+)",
    r"n[úu]mero\s*(\d+)",
];

const BARE_NUMBER_PATTERN: &str = r"^(\d+)$";

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
}

static EXPLICIT_NUMBER: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(EXPLICIT_NUMBER_PATTERNS));

static BARE_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(BARE_NUMBER_PATTERN).ok());

static HASH_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"#\s*\d+").ok());

fn capture_number(regex: &Regex, text: &str) -> Option<i64> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extract an order number from a disambiguation reply.
///
/// A message holding several numbers yields whichever the first matching
/// alternative captures.
#[must_use]
pub fn extract_order_number(input: &str) -> Option<i64> {
    let text = rules::normalize(input);
    EXPLICIT_NUMBER
        .iter()
        .chain(BARE_NUMBER.as_ref())
        .find_map(|regex| capture_number(regex, &text))
}

/// Extract an order number only when it is explicitly marked
/// (`pedido 12`, `#12`, `número 12`), never from a bare number.
#[must_use]
pub fn extract_explicit_order_number(input: &str) -> Option<i64> {
    let text = rules::normalize(input);
    EXPLICIT_NUMBER
        .iter()
        .find_map(|regex| capture_number(regex, &text))
}

/// Whether the message looks like an order status question.
#[must_use]
pub fn is_status_query(text: &str) -> bool {
    rules::contains_any(text, rules::STATUS_KEYWORDS)
        || HASH_NUMBER.as_ref().is_some_and(|regex| regex.is_match(text))
}

/// Digits of a phone number, all formatting removed.
#[must_use]
pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Last `n` digits of a phone number.
#[must_use]
pub fn phone_suffix(phone: &str, n: usize) -> String {
    let digits = phone_digits(phone);
    let start = digits.len().saturating_sub(n);
    digits[start..].to_owned()
}

/// Digits compared when matching phones written in different formats.
pub const PHONE_SUFFIX_DIGITS: usize = 8;

/// Whether two phone numbers refer to the same customer: equal, equal
/// digit strings, or equal last eight digits.
#[must_use]
pub fn phones_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (da, db) = (phone_digits(a), phone_digits(b));
    if da.is_empty() || db.is_empty() {
        return false;
    }
    da == db
        || (da.len() >= PHONE_SUFFIX_DIGITS
            && db.len() >= PHONE_SUFFIX_DIGITS
            && phone_suffix(&da, PHONE_SUFFIX_DIGITS) == phone_suffix(&db, PHONE_SUFFIX_DIGITS))
}
