//! Customer-facing message texts.
//!
//! WhatsApp markdown: `*bold*`, `_italic_`.

use std::fmt::Write as _;

use super::{Reply, ReplyOption};
use crate::models::catalog::{Category, Product};
use crate::models::money::Money;
use crate::models::order::{OrderTotals, OrderType, PaymentMethod};
use crate::models::session::SessionContext;

/// Help shown at WELCOME for unrecognized input.
#[must_use]
pub fn welcome_help() -> Reply {
    Reply::text(
        "👋 Olá! Eu sou o assistente de pedidos.\n\n\
         Digite *cardápio* para ver nosso menu.\n\
         Digite *meu pedido* para acompanhar um pedido.\n\
         Digite *carrinho* para ver seu carrinho.",
    )
}

/// Catalog has no active categories.
#[must_use]
pub fn menu_unavailable() -> Reply {
    Reply::text("😕 Nosso cardápio está indisponível no momento. Tente novamente mais tarde.")
}

/// Numbered category list.
#[must_use]
pub fn category_list(preamble: &str, categories: &[Category]) -> Reply {
    let mut text = format!("{preamble}\n\n");
    for (i, category) in categories.iter().enumerate() {
        let _ = writeln!(text, "*{}* - {}", i + 1, category.name);
    }
    text.push_str("\nDigite o *número* da categoria desejada.");
    Reply::text(text)
}

/// Preamble used when the category list is first shown.
pub const MENU_PREAMBLE: &str = "📋 *Nosso cardápio*";

/// Preamble used when the customer greets again inside the menu.
pub const MENU_GREETING_PREAMBLE: &str = "😊 Que bom te ver! Escolha uma categoria:";

/// Preamble used after an unrecognized menu choice.
pub const MENU_CORRECTION_PREAMBLE: &str = "❌ Opção inválida. Escolha uma das categorias:";

/// Numbered product list with description and price.
#[must_use]
pub fn product_list(heading: &str, products: &[Product]) -> Reply {
    let mut text = format!("{heading}\n\n");
    for (i, product) in products.iter().enumerate() {
        let _ = writeln!(text, "*{}* - {} — {}", i + 1, product.name, product.price);
        if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(text, "   _{description}_");
        }
    }
    text.push_str(
        "\nDigite o *número* do produto para adicionar ao carrinho.\n\
         Digite *carrinho* para ver o carrinho, *finalizar* para fechar o pedido \
         ou *voltar* para as categorias.",
    );
    Reply::text(text)
}

/// Heading for a product list of a named category.
#[must_use]
pub fn category_heading(name: &str) -> String {
    format!("🍽️ *{name}*")
}

/// Heading used when re-rendering after an invalid product choice.
pub const PRODUCT_CORRECTION_HEADING: &str = "❌ Opção inválida. Escolha um dos produtos:";

/// Selected category has no active products.
#[must_use]
pub fn empty_category(categories: &[Category]) -> Reply {
    category_list(
        "😕 Esta categoria não tem produtos disponíveis no momento. Escolha outra:",
        categories,
    )
}

/// Confirmation after adding a product.
#[must_use]
pub fn item_added(product: &Product, context: &SessionContext) -> Reply {
    let quantity = context
        .cart
        .iter()
        .find(|line| line.product_id == product.id)
        .map_or(1, |line| line.quantity);
    Reply::text(format!(
        "✅ *{}* adicionado ao carrinho (quantidade: {quantity}).\n\
         🛒 Total do carrinho: *{}*\n\n\
         Digite outro *número* para adicionar mais, *carrinho* para revisar \
         ou *finalizar* para fechar o pedido.",
        product.name,
        context.cart_total()
    ))
}

/// Itemized cart with total.
#[must_use]
pub fn cart_view(context: &SessionContext) -> Reply {
    if context.cart_is_empty() {
        return empty_cart();
    }
    let mut text = String::from("🛒 *Seu carrinho*\n\n");
    for line in &context.cart {
        let _ = writeln!(
            text,
            "{}x {} — {}",
            line.quantity,
            line.product_name,
            line.line_total()
        );
    }
    let _ = write!(
        text,
        "\n*Total: {}*\n\n\
         Digite *finalizar* para fechar o pedido, *limpar* para esvaziar o carrinho \
         ou *cardápio* para continuar comprando.",
        context.cart_total()
    );
    Reply::text(text)
}

/// Cart is empty; nudge toward the menu.
#[must_use]
pub fn empty_cart() -> Reply {
    Reply::text("🛒 Seu carrinho está vazio. Digite *cardápio* para ver nossos produtos.")
}

/// Checkout requested with an empty cart from the product list.
#[must_use]
pub fn finalize_empty_cart() -> Reply {
    Reply::text(
        "🛒 Seu carrinho está vazio. Digite o *número* de um produto para adicioná-lo antes de finalizar.",
    )
}

/// Cart emptied by `limpar`.
#[must_use]
pub fn cart_cleared() -> Reply {
    Reply::text("🗑️ Carrinho esvaziado. Digite *cardápio* para começar de novo.")
}

/// Unrecognized input while viewing the cart.
#[must_use]
pub fn cart_help() -> Reply {
    Reply::text(
        "Não entendi. No carrinho você pode digitar:\n\
         *finalizar* - fechar o pedido\n\
         *limpar* - esvaziar o carrinho\n\
         *cardápio* - continuar comprando",
    )
}

/// Global reset acknowledgment.
#[must_use]
pub fn reset_ack() -> Reply {
    Reply::text("🔄 Tudo certo, recomeçamos do início. Digite *cardápio* para ver o menu.")
}

/// First checkout step.
#[must_use]
pub fn name_prompt() -> Reply {
    Reply::text("📝 Vamos finalizar! Qual é o seu *nome*?")
}

/// Name shorter than two characters.
#[must_use]
pub fn name_invalid() -> Reply {
    Reply::text("❌ Nome muito curto. Por favor, digite seu *nome* (mínimo 2 letras).")
}

/// Pickup or delivery choice.
#[must_use]
pub fn order_type_prompt(customer_name: &str) -> Reply {
    Reply::buttons(
        format!("Prazer, {customer_name}!"),
        "Como você quer receber seu pedido?",
        vec![
            ReplyOption::new("1", "Retirar no local"),
            ReplyOption::new("2", "Delivery"),
        ],
    )
}

/// Unrecognized order type.
#[must_use]
pub fn order_type_invalid() -> Reply {
    Reply::buttons(
        "Opção inválida",
        "Escolha *1* para retirar no local ou *2* para delivery.",
        vec![
            ReplyOption::new("1", "Retirar no local"),
            ReplyOption::new("2", "Delivery"),
        ],
    )
}

/// Delivery address request.
#[must_use]
pub fn address_prompt() -> Reply {
    Reply::text("📍 Informe o *endereço completo* para entrega (rua, número, bairro).")
}

/// Address shorter than ten characters.
#[must_use]
pub fn address_invalid() -> Reply {
    Reply::text(
        "❌ Endereço muito curto. Informe o *endereço completo* (mínimo 10 caracteres).",
    )
}

fn payment_options() -> Vec<ReplyOption> {
    vec![
        ReplyOption::new("1", PaymentMethod::Dinheiro.label()),
        ReplyOption::new("2", PaymentMethod::Pix.label()),
        ReplyOption::new("3", PaymentMethod::Cartao.label()),
    ]
}

/// Payment method choice.
#[must_use]
pub fn payment_prompt() -> Reply {
    Reply::buttons(
        "Forma de pagamento",
        "Como você vai pagar?",
        payment_options(),
    )
}

/// Unrecognized payment choice.
#[must_use]
pub fn payment_invalid() -> Reply {
    Reply::buttons(
        "Opção inválida",
        "Escolha *1* Dinheiro, *2* PIX ou *3* Cartão.",
        payment_options(),
    )
}

/// Full order summary awaiting confirmation.
#[must_use]
pub fn order_summary(context: &SessionContext, totals: &OrderTotals) -> Reply {
    let mut text = String::new();
    for line in &context.cart {
        let _ = writeln!(
            text,
            "{}x {} — {}",
            line.quantity,
            line.product_name,
            line.line_total()
        );
    }
    let _ = write!(text, "\nSubtotal: {}", totals.subtotal);
    if totals.delivery_fee.is_positive() {
        let _ = write!(text, "\nTaxa de entrega: {}", totals.delivery_fee);
    }
    let _ = write!(text, "\n*Total: {}*\n", totals.total);

    if let Some(name) = context.customer_name.as_deref() {
        let _ = write!(text, "\n👤 Nome: {name}");
    }
    if let Some(order_type) = context.order_type {
        let _ = write!(text, "\n📦 Tipo: {}", order_type.label());
        if order_type == OrderType::Delivery {
            if let Some(address) = context.delivery_address.as_deref() {
                let _ = write!(text, "\n📍 Endereço: {address}");
            }
        }
    }
    if let Some(payment) = context.payment_method {
        let _ = write!(text, "\n💳 Pagamento: {}", payment.label());
    }
    text.push_str("\n\nConfirma o pedido?");

    Reply::buttons(
        "📋 Resumo do pedido",
        text,
        vec![
            ReplyOption::new("1", "Confirmar"),
            ReplyOption::new("2", "Voltar ao carrinho"),
        ],
    )
}

/// Order persisted.
#[must_use]
pub fn order_success(order_number: i64, total: Money) -> Reply {
    Reply::text(format!(
        "🎉 Pedido *#{order_number}* confirmado!\n\
         Total: *{total}*\n\n\
         Você receberá atualizações por aqui. Digite *meu pedido* para acompanhar."
    ))
}

/// Order write failed; the summary stays in place for a retry.
#[must_use]
pub fn order_failure() -> Reply {
    Reply::buttons(
        "😕 Não conseguimos registrar seu pedido",
        "Ocorreu um problema ao salvar o pedido. Seu carrinho foi mantido. Deseja tentar novamente?",
        vec![
            ReplyOption::new("1", "Tentar novamente"),
            ReplyOption::new("2", "Voltar ao carrinho"),
        ],
    )
}

/// Generic apology for unexpected failures.
#[must_use]
pub fn apology() -> Reply {
    Reply::text("😕 Desculpe, tivemos um problema ao processar sua mensagem. Tente novamente em instantes.")
}

/// Text fallback for a button reply.
#[must_use]
pub fn buttons_as_text(title: &str, description: &str, options: &[ReplyOption]) -> String {
    let mut text = String::new();
    if !title.is_empty() {
        let _ = write!(text, "*{title}*\n\n");
    }
    text.push_str(description);
    text.push('\n');
    for (i, option) in options.iter().enumerate() {
        let _ = write!(text, "\n*{}* - {}", i + 1, option.label);
    }
    text
}
