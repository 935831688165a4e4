//! `HttpTransport` and `Dispatcher` against a mock provider.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use order_intercom::config::TransportConfig;
use order_intercom::conversation::{render, ReplyOption};
use order_intercom::transport::client::HttpTransport;
use order_intercom::transport::Dispatcher;
use order_intercom::AppError;

use super::test_helpers::{spawn_provider, MockProvider, PHONE};

fn transport_config(base_url: &str, buttons_enabled: bool) -> TransportConfig {
    TransportConfig {
        base_url: base_url.to_owned(),
        instance: "loja".into(),
        buttons_enabled,
        request_timeout_seconds: 5,
        api_key: "test-key".into(),
    }
}

#[tokio::test]
async fn send_buttons_posts_provider_shape() {
    let ct = CancellationToken::new();
    let provider = MockProvider::default();
    let url = spawn_provider(provider.clone(), ct.clone()).await;
    let client = HttpTransport::new(&transport_config(&url, true)).expect("client");

    client
        .send_buttons(
            PHONE,
            "Forma de pagamento",
            "Como você vai pagar?",
            &[ReplyOption::new("1", "Dinheiro"), ReplyOption::new("2", "PIX")],
        )
        .await
        .expect("buttons accepted");

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    let body = &calls[0].body;
    assert_eq!(calls[0].operation, "sendButtons");
    assert_eq!(body["number"], PHONE);
    assert_eq!(body["title"], "Forma de pagamento");
    assert_eq!(body["description"], "Como você vai pagar?");
    assert_eq!(body["buttons"][1]["type"], "reply");
    assert_eq!(body["buttons"][1]["displayText"], "PIX");
    assert_eq!(body["buttons"][1]["id"], "2");

    ct.cancel();
}

#[tokio::test]
async fn non_success_status_is_transport_error() {
    let ct = CancellationToken::new();
    let provider = MockProvider {
        fail_buttons: true,
        ..MockProvider::default()
    };
    let url = spawn_provider(provider, ct.clone()).await;
    let client = HttpTransport::new(&transport_config(&url, true)).expect("client");

    let result = client.send_buttons(PHONE, "t", "d", &[]).await;
    assert!(matches!(result, Err(AppError::Transport(_))));

    ct.cancel();
}

#[tokio::test]
async fn disabled_buttons_fail_without_a_request() {
    let ct = CancellationToken::new();
    let provider = MockProvider::default();
    let url = spawn_provider(provider.clone(), ct.clone()).await;
    let client = HttpTransport::new(&transport_config(&url, false)).expect("client");

    let result = client.send_buttons(PHONE, "t", "d", &[]).await;
    assert!(matches!(result, Err(AppError::Transport(_))));
    assert!(provider.calls().is_empty());

    ct.cancel();
}

#[tokio::test]
async fn dispatcher_degrades_to_text_when_buttons_disabled() {
    let ct = CancellationToken::new();
    let provider = MockProvider::default();
    let url = spawn_provider(provider.clone(), ct.clone()).await;
    let client = HttpTransport::new(&transport_config(&url, false)).expect("client");
    let dispatcher = Dispatcher::new(Arc::new(client));

    assert!(dispatcher.send_reply(PHONE, &render::payment_prompt()).await);

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, "sendText");
    let text = calls[0].body["text"].as_str().expect("text");
    assert!(text.starts_with("*Forma de pagamento*"));
    assert!(text.contains("*3* - Cartão"));

    ct.cancel();
}
