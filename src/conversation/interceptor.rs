//! Global commands evaluated before the state machine.
//!
//! Evaluation order:
//! 1. Reset keywords → WELCOME with a fresh context.
//! 2. Cart keywords → cart view (state CART when the cart has items).
//! 3. In AWAITING_ORDER_NUMBER, the message is consumed as an order pick.
//! 4. Status heuristic → open-order lookup.
//!
//! Anything else falls through to the [`engine`](super::engine).

use tracing::{debug, info};

use super::rules::{self, Rule};
use super::status::{self, NO_OPEN_ORDERS, ORDER_NUMBER_PROMPT};
use super::{render, OrderLookup, Reply, Turn};
use crate::models::session::{ConversationState, SessionContext};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlobalCommand {
    Reset,
    ShowCart,
}

const GLOBAL_RULES: &[Rule<GlobalCommand>] = &[
    Rule {
        name: "reset",
        matches: rules::is_reset,
        action: GlobalCommand::Reset,
    },
    Rule {
        name: "cart",
        matches: rules::is_cart_command,
        action: GlobalCommand::ShowCart,
    },
];

/// State-independent command pre-pass.
pub struct Interceptor<'a> {
    orders: &'a dyn OrderLookup,
    page_size: u32,
}

impl<'a> Interceptor<'a> {
    /// Create an interceptor listing at most `page_size` open orders.
    #[must_use]
    pub fn new(orders: &'a dyn OrderLookup, page_size: u32) -> Self {
        Self { orders, page_size }
    }

    /// Handle `input` if it is a global command; `None` lets the state
    /// machine handle it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if an order lookup fails.
    pub async fn intercept(
        &self,
        phone: &str,
        state: ConversationState,
        context: &SessionContext,
        input: &str,
    ) -> Result<Option<Turn>> {
        let text = rules::normalize(input);

        if let Some(rule) = rules::first_match(GLOBAL_RULES, &text) {
            debug!(rule = rule.name, "global command matched");
            return Ok(Some(match rule.action {
                GlobalCommand::Reset => Turn::new(
                    ConversationState::Welcome,
                    SessionContext::default(),
                    render::reset_ack(),
                ),
                GlobalCommand::ShowCart => show_cart(state, context),
            }));
        }

        if state == ConversationState::AwaitingOrderNumber {
            return self.resolve_pick(phone, context, input).await.map(Some);
        }

        if status::is_status_query(&text) {
            return self.answer_status(phone, state, context, input).await.map(Some);
        }

        Ok(None)
    }

    async fn resolve_pick(
        &self,
        phone: &str,
        context: &SessionContext,
        input: &str,
    ) -> Result<Turn> {
        let Some(number) = status::extract_order_number(input) else {
            return Ok(Turn::new(
                ConversationState::AwaitingOrderNumber,
                context.clone(),
                Reply::text(ORDER_NUMBER_PROMPT),
            ));
        };

        match self.owned_order(phone, number).await? {
            Some(detail) => Ok(Turn::new(
                ConversationState::Welcome,
                context.clone(),
                Reply::text(detail),
            )),
            None => Ok(Turn::new(
                ConversationState::AwaitingOrderNumber,
                context.clone(),
                Reply::text(status::order_not_found(number)),
            )),
        }
    }

    async fn answer_status(
        &self,
        phone: &str,
        state: ConversationState,
        context: &SessionContext,
        input: &str,
    ) -> Result<Turn> {
        if let Some(number) = status::extract_explicit_order_number(input) {
            if let Some(detail) = self.owned_order(phone, number).await? {
                return Ok(Turn::new(state, context.clone(), Reply::text(detail)));
            }
        }

        let orders = self.orders.find_open_orders(phone, self.page_size).await?;
        info!(phone = %phone, open_orders = orders.len(), "status query");

        Ok(match orders.as_slice() {
            [] => Turn::new(state, context.clone(), Reply::text(NO_OPEN_ORDERS)),
            [order] => Turn::new(
                state,
                context.clone(),
                Reply::text(status::format_order(order)),
            ),
            many => Turn::new(
                ConversationState::AwaitingOrderNumber,
                context.clone(),
                Reply::text(status::format_order_list(many)),
            ),
        })
    }

    /// Detail text for order `number` if it belongs to `phone`.
    async fn owned_order(&self, phone: &str, number: i64) -> Result<Option<String>> {
        let order = self.orders.find_by_number(number).await?;
        Ok(order
            .filter(|order| status::phones_match(&order.phone, phone))
            .map(|order| status::format_order(&order)))
    }
}

fn show_cart(state: ConversationState, context: &SessionContext) -> Turn {
    if context.cart_is_empty() {
        Turn::new(state, context.clone(), render::empty_cart())
    } else {
        Turn::new(
            ConversationState::Cart,
            context.clone(),
            render::cart_view(context),
        )
    }
}
