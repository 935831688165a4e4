//! Keyword tables and input predicates.
//!
//! Free text is matched literally: the message is trimmed and lowercased,
//! then compared against fixed keyword lists either as a whole message or
//! as a whole-word phrase inside it. Each predicate is a plain
//! `fn(&str) -> bool` over normalized input so state handlers can be
//! expressed as ordered [`Rule`] tables.

/// A named predicate paired with the action it selects.
#[derive(Debug, Clone, Copy)]
pub struct Rule<A> {
    /// Identifier used in logs.
    pub name: &'static str,
    /// Predicate over normalized input.
    pub matches: fn(&str) -> bool,
    /// Action selected when the predicate holds.
    pub action: A,
}

/// Evaluate `rules` top-down and return the first matching rule.
#[must_use]
pub fn first_match<'r, A>(rules: &'r [Rule<A>], input: &str) -> Option<&'r Rule<A>> {
    rules.iter().find(|rule| (rule.matches)(input))
}

/// Whole-message commands that restart the conversation.
pub const RESET_KEYWORDS: &[&str] = &[
    "cancelar",
    "sair",
    "voltar ao inicio",
    "voltar ao início",
    "reiniciar",
];

/// Whole-message commands that show the cart.
pub const CART_KEYWORDS: &[&str] = &["carrinho", "ver carrinho"];

/// Phrases that open the menu.
pub const GREETING_KEYWORDS: &[&str] = &[
    "oi",
    "olá",
    "ola",
    "menu",
    "cardápio",
    "cardapio",
    "bom dia",
    "boa tarde",
    "boa noite",
    "começar",
    "comecar",
    "fazer pedido",
];

/// Phrases that step back one level.
pub const BACK_KEYWORDS: &[&str] = &["voltar"];

/// Phrases that start checkout.
pub const FINALIZE_KEYWORDS: &[&str] = &["finalizar", "fechar", "concluir"];

/// Phrases that empty the cart.
pub const CLEAR_KEYWORDS: &[&str] = &["limpar"];

/// Answers accepted as order confirmation. `1` is the confirm button id.
pub const CONFIRM_KEYWORDS: &[&str] = &["confirmar", "sim", "ok", "confirma", "1"];

/// Answers accepted as declining the summary. `2` is the cancel button id.
///
/// `cancelar` is absent: the global reset command handles it first.
pub const DECLINE_KEYWORDS: &[&str] = &["nao", "não", "2"];

/// Phrases that look like an order status question.
pub const STATUS_KEYWORDS: &[&str] = &[
    "meu pedido",
    "status",
    "onde está",
    "onde esta",
    "rastrear",
    "acompanhar",
    "cadê",
    "cade",
];

/// Trim, lowercase, and collapse inner whitespace.
#[must_use]
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whether `text` equals one of `keywords`.
#[must_use]
pub fn is_exactly(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| *k == text)
}

/// Whether `phrase` occurs in `text` as a run of whole words.
#[must_use]
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let haystack = words(text);
    let needle = words(phrase);
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle.as_slice())
}

/// Whether any of `phrases` occurs in `text` as whole words.
#[must_use]
pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(text, p))
}

/// First whitespace-separated token parsed as a 1-based choice.
#[must_use]
pub fn numeric_choice(text: &str) -> Option<usize> {
    text.split_whitespace()
        .next()
        .and_then(|token| token.parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// Resolve a 1-based choice against a list.
#[must_use]
pub fn pick<T>(items: &[T], choice: usize) -> Option<&T> {
    choice.checked_sub(1).and_then(|index| items.get(index))
}

/// Global reset command.
#[must_use]
pub fn is_reset(text: &str) -> bool {
    is_exactly(text, RESET_KEYWORDS)
}

/// Global cart command.
#[must_use]
pub fn is_cart_command(text: &str) -> bool {
    is_exactly(text, CART_KEYWORDS)
}

/// Mentions the cart anywhere in the message.
#[must_use]
pub fn mentions_cart(text: &str) -> bool {
    contains_phrase(text, "carrinho")
}

/// Greeting or menu request.
#[must_use]
pub fn is_greeting(text: &str) -> bool {
    contains_any(text, GREETING_KEYWORDS)
}

/// Step-back request.
#[must_use]
pub fn is_back(text: &str) -> bool {
    contains_any(text, BACK_KEYWORDS)
}

/// Checkout request.
#[must_use]
pub fn is_finalize(text: &str) -> bool {
    contains_any(text, FINALIZE_KEYWORDS)
}

/// Empty-cart request.
#[must_use]
pub fn is_clear(text: &str) -> bool {
    contains_any(text, CLEAR_KEYWORDS)
}

/// Order confirmation.
#[must_use]
pub fn is_confirm(text: &str) -> bool {
    is_exactly(text, CONFIRM_KEYWORDS) || contains_any(text, &["confirmar", "confirma"])
}

/// Declining the order summary.
#[must_use]
pub fn is_decline(text: &str) -> bool {
    is_exactly(text, DECLINE_KEYWORDS)
}

/// A numeric choice.
#[must_use]
pub fn is_numeric(text: &str) -> bool {
    numeric_choice(text).is_some()
}
