//! Shared test helpers for integration tests.
//!
//! Provides a seeded in-memory database, a minimal `GlobalConfig`, a
//! recording mock of the chat provider, and an in-process webhook server
//! bound to an ephemeral port.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use order_intercom::config::GlobalConfig;
use order_intercom::conversation::ConversationService;
use order_intercom::persistence::{db, SqlitePool};
use order_intercom::transport::automation::AutomationForwarder;
use order_intercom::transport::client::HttpTransport;
use order_intercom::transport::Dispatcher;
use order_intercom::webhook::{self, AppState};

pub const PHONE: &str = "5511988887777";

/// Minimal config; the transport section points at `provider_url` when given.
pub fn test_config(provider_url: Option<&str>) -> GlobalConfig {
    let mut config = GlobalConfig::from_toml_str(
        r#"
http_port = 0
delivery_fee_cents = 500
status_page_size = 5
"#,
    )
    .expect("valid test config");
    if let Some(url) = provider_url {
        config.transport.base_url = url.to_owned();
        config.transport.instance = "loja".into();
        config.transport.api_key = "test-key".into();
    }
    config
}

/// In-memory database with two categories; "Lanches" has two products,
/// "Bebidas" has one.
pub async fn seeded_db() -> Arc<SqlitePool> {
    let pool = db::connect_memory().await.expect("db connect");
    sqlx::raw_sql(
        "INSERT INTO category (id, name, display_order, active) VALUES
             ('c-lanches', 'Lanches', 1, 1),
             ('c-bebidas', 'Bebidas', 2, 1);
         INSERT INTO product (id, category_id, name, description, price_cents, active) VALUES
             ('p-xburger', 'c-lanches', 'X-Burger', 'Pão, carne e queijo', 2500, 1),
             ('p-xsalada', 'c-lanches', 'X-Salada', NULL, 2800, 1),
             ('p-refri', 'c-bebidas', 'Refrigerante', NULL, 600, 1);",
    )
    .execute(&pool)
    .await
    .expect("seed catalog");
    Arc::new(pool)
}

/// Conversation service over `pool` with default settings.
pub fn service(pool: &Arc<SqlitePool>) -> ConversationService {
    ConversationService::from_db(pool, &test_config(None))
}

/// Feed `messages` in order and return the last turn's state and reply text.
pub async fn converse(
    service: &ConversationService,
    phone: &str,
    messages: &[&str],
) -> order_intercom::conversation::Turn {
    let mut last = None;
    for message in messages {
        last = Some(
            service
                .handle_message(phone, message)
                .await
                .unwrap_or_else(|e| panic!("message {message:?} failed: {e}")),
        );
    }
    last.expect("at least one message")
}

/// A request received by the mock provider.
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub operation: String,
    pub instance: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Recording mock of the chat provider's send endpoints.
#[derive(Clone, Default)]
pub struct MockProvider {
    pub calls: Arc<Mutex<Vec<ProviderCall>>>,
    pub fail_buttons: bool,
}

impl MockProvider {
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn record(
    State(provider): State<MockProvider>,
    Path((operation, instance)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let failing = provider.fail_buttons && operation == "sendButtons";
    provider.calls.lock().unwrap().push(ProviderCall {
        operation,
        instance,
        api_key: headers
            .get("apikey")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body,
    });
    if failing {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::CREATED
    }
}

/// Serve `router` on an ephemeral port; returns its base URL.
pub async fn spawn_router(router: Router, ct: CancellationToken) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(async move { ct.cancelled().await })
            .await;
    });
    format!("http://{addr}")
}

/// Start a mock provider; returns its base URL.
pub async fn spawn_provider(provider: MockProvider, ct: CancellationToken) -> String {
    let router = Router::new()
        .route("/message/{operation}/{instance}", post(record))
        .with_state(provider);
    spawn_router(router, ct).await
}

/// Build application state wired to the provider at `provider_url`.
pub fn app_state(pool: Arc<SqlitePool>, provider_url: Option<&str>) -> Arc<AppState> {
    let config = test_config(provider_url);
    let dispatcher = if config.transport.is_configured() {
        Dispatcher::new(Arc::new(
            HttpTransport::new(&config.transport).expect("http transport"),
        ))
    } else {
        Dispatcher::disabled()
    };
    Arc::new(AppState {
        conversation: ConversationService::from_db(&pool, &config),
        config: Arc::new(config),
        db: pool,
        dispatcher,
        automation: AutomationForwarder::default(),
    })
}

/// Serve the webhook router for `state`; returns its base URL.
pub async fn spawn_app(state: Arc<AppState>, ct: CancellationToken) -> String {
    spawn_router(webhook::router(state), ct).await
}

/// An Evolution-style `messages.upsert` body.
pub fn upsert(phone: &str, text: &str) -> Value {
    serde_json::json!({
        "event": "messages.upsert",
        "instance": "loja",
        "data": {
            "key": { "remoteJid": format!("{phone}@s.whatsapp.net"), "fromMe": false },
            "message": { "conversation": text }
        }
    })
}
