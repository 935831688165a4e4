//! Webhook HTTP surface with a mock chat provider.

use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::test_helpers::{
    app_state, seeded_db, spawn_app, spawn_provider, upsert, MockProvider, PHONE,
};

async fn post(base_url: &str, body: &Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base_url}/webhook"))
        .json(body)
        .send()
        .await
        .expect("POST /webhook");
    let status = resp.status().as_u16();
    (status, resp.json().await.expect("json body"))
}

#[tokio::test]
async fn message_runs_turn_and_replies() {
    let ct = CancellationToken::new();
    let provider = MockProvider::default();
    let provider_url = spawn_provider(provider.clone(), ct.clone()).await;
    let app_url = spawn_app(app_state(seeded_db().await, Some(&provider_url)), ct.clone()).await;

    let (status, body) = post(&app_url, &upsert(PHONE, "cardápio")).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "status": "ok", "state": "MENU" }));

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, "sendText");
    assert_eq!(calls[0].instance, "loja");
    assert_eq!(calls[0].api_key.as_deref(), Some("test-key"));
    assert_eq!(calls[0].body["number"], PHONE);
    assert!(calls[0].body["text"]
        .as_str()
        .expect("text")
        .contains("Lanches"));

    ct.cancel();
}

#[tokio::test]
async fn button_failure_still_delivers_text() {
    let ct = CancellationToken::new();
    let provider = MockProvider {
        fail_buttons: true,
        ..MockProvider::default()
    };
    let provider_url = spawn_provider(provider.clone(), ct.clone()).await;
    let app_url = spawn_app(app_state(seeded_db().await, Some(&provider_url)), ct.clone()).await;

    for text in ["oi", "1", "1", "finalizar"] {
        let (status, _) = post(&app_url, &upsert(PHONE, text)).await;
        assert_eq!(status, 200);
    }
    let before = provider.calls().len();

    let (status, body) = post(&app_url, &upsert(PHONE, "Maria")).await;
    assert_eq!(status, 200);
    assert_eq!(body["state"], "CHECKOUT_TYPE");

    let calls = provider.calls();
    let new_calls = &calls[before..];
    assert_eq!(new_calls.len(), 2);
    assert_eq!(new_calls[0].operation, "sendButtons");
    assert_eq!(new_calls[1].operation, "sendText");
    let fallback = new_calls[1].body["text"].as_str().expect("text");
    assert!(fallback.contains("*1* - Retirar no local"));
    assert!(fallback.contains("*2* - Delivery"));

    ct.cancel();
}

#[tokio::test]
async fn unreachable_provider_does_not_fail_webhook() {
    let ct = CancellationToken::new();
    let app_url = spawn_app(
        app_state(seeded_db().await, Some("http://127.0.0.1:9")),
        ct.clone(),
    )
    .await;

    let (status, body) = post(&app_url, &upsert(PHONE, "oi")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    ct.cancel();
}

#[tokio::test]
async fn non_message_events_are_ignored() {
    let ct = CancellationToken::new();
    let provider = MockProvider::default();
    let provider_url = spawn_provider(provider.clone(), ct.clone()).await;
    let app_url = spawn_app(app_state(seeded_db().await, Some(&provider_url)), ct.clone()).await;

    let (status, body) = post(&app_url, &json!({ "event": "presence.update", "data": {} })).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "status": "ignored" }));

    let mut echo = upsert(PHONE, "oi");
    echo["data"]["key"]["fromMe"] = json!(true);
    let (_, body) = post(&app_url, &echo).await;
    assert_eq!(body, json!({ "status": "ignored" }));

    assert!(provider.calls().is_empty());
    ct.cancel();
}

#[tokio::test]
async fn payload_without_text_is_no_message() {
    let ct = CancellationToken::new();
    let app_url = spawn_app(app_state(seeded_db().await, None), ct.clone()).await;

    let mut body = upsert(PHONE, "");
    body["data"]["message"] = json!({ "stickerMessage": {} });
    let (status, resp) = post(&app_url, &body).await;
    assert_eq!(status, 200);
    assert_eq!(resp, json!({ "status": "no_message" }));

    let resp = reqwest::Client::new()
        .post(format!("{app_url}/webhook"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("POST");
    assert_eq!(resp.status(), 200);
    let resp: Value = resp.json().await.expect("json");
    assert_eq!(resp, json!({ "status": "no_message" }));

    ct.cancel();
}

#[tokio::test]
async fn pipeline_error_returns_500_and_apologizes() {
    let ct = CancellationToken::new();
    let provider = MockProvider::default();
    let provider_url = spawn_provider(provider.clone(), ct.clone()).await;
    let pool = seeded_db().await;
    let app_url = spawn_app(app_state(pool.clone(), Some(&provider_url)), ct.clone()).await;

    sqlx::query("DROP TABLE conversation_session")
        .execute(pool.as_ref())
        .await
        .expect("drop table");

    let (status, body) = post(&app_url, &upsert(PHONE, "oi")).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({ "status": "error" }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].body["text"]
        .as_str()
        .expect("text")
        .contains("Desculpe"));

    ct.cancel();
}
