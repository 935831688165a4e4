//! Checkout state machine.
//!
//! [`Engine::step`] maps `(state, context, input)` to the next
//! `(state, context, reply)`. Each state is handled by an ordered rule
//! table; input that matches no rule yields a corrective reply in the same
//! state. The catalog is re-read on every turn, and cart lines keep the
//! name and price captured when they were added.

use tracing::{info, warn};

use super::rules::{self, Rule};
use super::{render, CatalogGateway, OrderSink, Turn};
use crate::models::catalog::Category;
use crate::models::money::Money;
use crate::models::order::{NewOrder, OrderTotals, OrderType, PaymentMethod};
use crate::models::session::{ConversationState, SessionContext};
use crate::Result;

/// Minimum characters accepted as a customer name.
pub const MIN_NAME_CHARS: usize = 2;

/// Minimum characters accepted as a delivery address.
pub const MIN_ADDRESS_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Greeting,
    Choice,
    Back,
    Cart,
    Finalize,
    Clear,
    Confirm,
    Decline,
}

const WELCOME_RULES: &[Rule<Intent>] = &[Rule {
    name: "greeting",
    matches: rules::is_greeting,
    action: Intent::Greeting,
}];

const MENU_RULES: &[Rule<Intent>] = &[
    Rule {
        name: "choice",
        matches: rules::is_numeric,
        action: Intent::Choice,
    },
    Rule {
        name: "back",
        matches: rules::is_back,
        action: Intent::Back,
    },
    Rule {
        name: "greeting",
        matches: rules::is_greeting,
        action: Intent::Greeting,
    },
];

const CATEGORY_RULES: &[Rule<Intent>] = &[
    Rule {
        name: "choice",
        matches: rules::is_numeric,
        action: Intent::Choice,
    },
    Rule {
        name: "back",
        matches: rules::is_back,
        action: Intent::Back,
    },
    Rule {
        name: "cart",
        matches: rules::mentions_cart,
        action: Intent::Cart,
    },
    Rule {
        name: "finalize",
        matches: rules::is_finalize,
        action: Intent::Finalize,
    },
];

const CART_RULES: &[Rule<Intent>] = &[
    Rule {
        name: "clear",
        matches: rules::is_clear,
        action: Intent::Clear,
    },
    Rule {
        name: "finalize",
        matches: rules::is_finalize,
        action: Intent::Finalize,
    },
    Rule {
        name: "menu",
        matches: rules::is_greeting,
        action: Intent::Greeting,
    },
];

const CONFIRM_RULES: &[Rule<Intent>] = &[
    Rule {
        name: "confirm",
        matches: rules::is_confirm,
        action: Intent::Confirm,
    },
    Rule {
        name: "decline",
        matches: rules::is_decline,
        action: Intent::Decline,
    },
];

fn intent(table: &[Rule<Intent>], text: &str) -> Option<Intent> {
    rules::first_match(table, text).map(|rule| rule.action)
}

/// The checkout state machine bound to its collaborators.
pub struct Engine<'a> {
    catalog: &'a dyn CatalogGateway,
    orders: &'a dyn OrderSink,
    delivery_fee: Money,
}

impl<'a> Engine<'a> {
    /// Bind the engine to a catalog, an order sink, and the delivery fee.
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogGateway, orders: &'a dyn OrderSink, delivery_fee: Money) -> Self {
        Self {
            catalog,
            orders,
            delivery_fee,
        }
    }

    /// Advance the conversation by one message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if a catalog query fails. A failed order
    /// write is not an error: the turn stays in CONFIRM with a retry prompt.
    pub async fn step(
        &self,
        phone: &str,
        state: ConversationState,
        context: SessionContext,
        input: &str,
    ) -> Result<Turn> {
        let text = rules::normalize(input);
        match state {
            ConversationState::Welcome | ConversationState::AwaitingOrderNumber => {
                self.on_welcome(context, &text).await
            }
            ConversationState::Menu => self.on_menu(context, &text).await,
            ConversationState::Category => self.on_category(context, &text).await,
            ConversationState::Cart => self.on_cart(context, &text).await,
            ConversationState::CheckoutName => Ok(on_checkout_name(context, input)),
            ConversationState::CheckoutType => Ok(on_checkout_type(context, &text)),
            ConversationState::CheckoutAddress => Ok(on_checkout_address(context, input)),
            ConversationState::CheckoutPayment => Ok(self.on_checkout_payment(context, &text)),
            ConversationState::Confirm => Ok(self.on_confirm(phone, context, &text).await),
        }
    }

    async fn on_welcome(&self, context: SessionContext, text: &str) -> Result<Turn> {
        match intent(WELCOME_RULES, text) {
            Some(Intent::Greeting) => self.open_menu(context, render::MENU_PREAMBLE).await,
            _ => Ok(Turn::new(
                ConversationState::Welcome,
                context,
                render::welcome_help(),
            )),
        }
    }

    async fn on_menu(&self, mut context: SessionContext, text: &str) -> Result<Turn> {
        match intent(MENU_RULES, text) {
            Some(Intent::Choice) => {
                let categories = self.catalog.list_categories().await?;
                let chosen = rules::numeric_choice(text).and_then(|n| rules::pick(&categories, n));
                let Some(category) = chosen else {
                    return Ok(menu_turn(context, render::MENU_CORRECTION_PREAMBLE, &categories));
                };

                let products = self.catalog.list_products(&category.id).await?;
                if products.is_empty() {
                    return Ok(Turn::new(
                        ConversationState::Menu,
                        context,
                        render::empty_category(&categories),
                    ));
                }

                context.selected_category = Some(category.id.clone());
                let reply = render::product_list(&render::category_heading(&category.name), &products);
                Ok(Turn::new(ConversationState::Category, context, reply))
            }
            Some(Intent::Back) => Ok(Turn::new(
                ConversationState::Welcome,
                context,
                render::welcome_help(),
            )),
            Some(Intent::Greeting) => self.open_menu(context, render::MENU_GREETING_PREAMBLE).await,
            _ => self.open_menu(context, render::MENU_CORRECTION_PREAMBLE).await,
        }
    }

    async fn on_category(&self, mut context: SessionContext, text: &str) -> Result<Turn> {
        let Some(category_id) = context.selected_category.clone() else {
            return self.open_menu(context, render::MENU_PREAMBLE).await;
        };

        match intent(CATEGORY_RULES, text) {
            Some(Intent::Choice) => {
                let products = self.catalog.list_products(&category_id).await?;
                let chosen = rules::numeric_choice(text).and_then(|n| rules::pick(&products, n));
                let Some(product) = chosen else {
                    return Ok(Turn::new(
                        ConversationState::Category,
                        context,
                        render::product_list(render::PRODUCT_CORRECTION_HEADING, &products),
                    ));
                };

                context.add_to_cart(&product.id, &product.name, product.price);
                info!(product_id = %product.id, cart_lines = context.cart.len(), "item added to cart");
                let reply = render::item_added(product, &context);
                Ok(Turn::new(ConversationState::Category, context, reply))
            }
            Some(Intent::Back) => self.open_menu(context, render::MENU_PREAMBLE).await,
            Some(Intent::Cart) => {
                let reply = render::cart_view(&context);
                Ok(Turn::new(ConversationState::Cart, context, reply))
            }
            Some(Intent::Finalize) if context.cart_is_empty() => Ok(Turn::new(
                ConversationState::Category,
                context,
                render::finalize_empty_cart(),
            )),
            Some(Intent::Finalize) => Ok(Turn::new(
                ConversationState::CheckoutName,
                context,
                render::name_prompt(),
            )),
            _ => {
                let products = self.catalog.list_products(&category_id).await?;
                Ok(Turn::new(
                    ConversationState::Category,
                    context,
                    render::product_list(render::PRODUCT_CORRECTION_HEADING, &products),
                ))
            }
        }
    }

    async fn on_cart(&self, mut context: SessionContext, text: &str) -> Result<Turn> {
        match intent(CART_RULES, text) {
            Some(Intent::Clear) => {
                context.clear_cart();
                Ok(Turn::new(
                    ConversationState::Welcome,
                    context,
                    render::cart_cleared(),
                ))
            }
            Some(Intent::Finalize) if context.cart_is_empty() => Ok(Turn::new(
                ConversationState::Welcome,
                context,
                render::empty_cart(),
            )),
            Some(Intent::Finalize) => Ok(Turn::new(
                ConversationState::CheckoutName,
                context,
                render::name_prompt(),
            )),
            Some(Intent::Greeting) => self.open_menu(context, render::MENU_PREAMBLE).await,
            _ => Ok(Turn::new(ConversationState::Cart, context, render::cart_help())),
        }
    }

    fn on_checkout_payment(&self, mut context: SessionContext, text: &str) -> Turn {
        let method = match text {
            "1" => PaymentMethod::Dinheiro,
            "2" => PaymentMethod::Pix,
            "3" => PaymentMethod::Cartao,
            _ => {
                return Turn::new(
                    ConversationState::CheckoutPayment,
                    context,
                    render::payment_invalid(),
                )
            }
        };

        context.payment_method = Some(method);
        let totals = OrderTotals::compute(&context, self.delivery_fee);
        let reply = render::order_summary(&context, &totals);
        Turn::new(ConversationState::Confirm, context, reply)
    }

    async fn on_confirm(&self, phone: &str, context: SessionContext, text: &str) -> Turn {
        match intent(CONFIRM_RULES, text) {
            Some(Intent::Confirm) => self.place_order(phone, context).await,
            Some(Intent::Decline) => {
                let reply = render::cart_view(&context);
                Turn::new(ConversationState::Cart, context, reply)
            }
            _ => {
                let totals = OrderTotals::compute(&context, self.delivery_fee);
                let reply = render::order_summary(&context, &totals);
                Turn::new(ConversationState::Confirm, context, reply)
            }
        }
    }

    async fn place_order(&self, phone: &str, context: SessionContext) -> Turn {
        let order = match NewOrder::from_context(phone, &context, self.delivery_fee) {
            Ok(order) => order,
            Err(err) => {
                warn!(phone = %phone, %err, "checkout context incomplete");
                let reply = render::cart_view(&context);
                return Turn::new(ConversationState::Cart, context, reply);
            }
        };

        match self.orders.create_order(&order).await {
            Ok(order_number) => {
                info!(phone = %phone, order_number, total = order.total.cents(), "order created");
                Turn::new(
                    ConversationState::Welcome,
                    SessionContext::default(),
                    render::order_success(order_number, order.total),
                )
            }
            Err(err) => {
                warn!(phone = %phone, %err, "order creation failed; cart kept for retry");
                Turn::new(ConversationState::Confirm, context, render::order_failure())
            }
        }
    }

    async fn open_menu(&self, context: SessionContext, preamble: &str) -> Result<Turn> {
        let categories = self.catalog.list_categories().await?;
        if categories.is_empty() {
            return Ok(Turn::new(
                ConversationState::Welcome,
                context,
                render::menu_unavailable(),
            ));
        }
        Ok(menu_turn(context, preamble, &categories))
    }
}

fn menu_turn(context: SessionContext, preamble: &str, categories: &[Category]) -> Turn {
    Turn::new(
        ConversationState::Menu,
        context,
        render::category_list(preamble, categories),
    )
}

fn on_checkout_name(mut context: SessionContext, input: &str) -> Turn {
    let name = input.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return Turn::new(
            ConversationState::CheckoutName,
            context,
            render::name_invalid(),
        );
    }

    context.customer_name = Some(name.to_owned());
    let reply = render::order_type_prompt(name);
    Turn::new(ConversationState::CheckoutType, context, reply)
}

fn on_checkout_type(mut context: SessionContext, text: &str) -> Turn {
    match text {
        "1" => {
            context.order_type = Some(OrderType::Presencial);
            context.delivery_address = None;
            Turn::new(
                ConversationState::CheckoutPayment,
                context,
                render::payment_prompt(),
            )
        }
        "2" => {
            context.order_type = Some(OrderType::Delivery);
            Turn::new(
                ConversationState::CheckoutAddress,
                context,
                render::address_prompt(),
            )
        }
        _ => Turn::new(
            ConversationState::CheckoutType,
            context,
            render::order_type_invalid(),
        ),
    }
}

fn on_checkout_address(mut context: SessionContext, input: &str) -> Turn {
    let address = input.trim();
    if address.chars().count() < MIN_ADDRESS_CHARS {
        return Turn::new(
            ConversationState::CheckoutAddress,
            context,
            render::address_invalid(),
        );
    }

    context.delivery_address = Some(address.to_owned());
    Turn::new(
        ConversationState::CheckoutPayment,
        context,
        render::payment_prompt(),
    )
}

