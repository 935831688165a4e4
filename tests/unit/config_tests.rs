use std::io::Write;
use std::path::PathBuf;

use order_intercom::config::GlobalConfig;
use order_intercom::AppError;

const FULL: &str = r#"
http_port = 8080
bind_address = "0.0.0.0"
db_path = "/var/lib/orders/orders.db"
delivery_fee_cents = 700
status_page_size = 3

[transport]
base_url = "https://evolution.example.com/"
instance = "loja"
buttons_enabled = false
request_timeout_seconds = 4

[automation]
webhook_url = "https://n8n.example.com/hook"
"#;

#[test]
fn parses_full_config() {
    let config = GlobalConfig::from_toml_str(FULL).expect("valid config");

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.db_path, PathBuf::from("/var/lib/orders/orders.db"));
    assert_eq!(config.delivery_fee_cents, 700);
    assert_eq!(config.status_page_size, 3);
    assert_eq!(config.transport.base_url, "https://evolution.example.com");
    assert_eq!(config.transport.instance, "loja");
    assert!(!config.transport.buttons_enabled);
    assert_eq!(config.transport.request_timeout_seconds, 4);
    assert_eq!(
        config.automation.webhook_url.as_deref(),
        Some("https://n8n.example.com/hook")
    );
}

#[test]
fn empty_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("defaults");

    assert_eq!(config.http_port, 3000);
    assert_eq!(config.bind_address, "127.0.0.1");
    assert_eq!(config.db_path, PathBuf::from("data").join("orders.db"));
    assert_eq!(config.delivery_fee_cents, 500);
    assert_eq!(config.status_page_size, 5);
    assert!(config.transport.buttons_enabled);
    assert_eq!(config.transport.request_timeout_seconds, 10);
    assert!(config.automation.webhook_url.is_none());
    assert!(!config.transport.is_configured());
}

#[test]
fn api_key_is_never_read_from_toml() {
    let config = GlobalConfig::from_toml_str(
        r#"
[transport]
base_url = "http://localhost:8080"
instance = "loja"
api_key = "leaked"
"#,
    )
    .expect("unknown keys are ignored");
    assert!(config.transport.api_key.is_empty());
}

#[test]
fn blank_webhook_url_disables_forwarding() {
    let config = GlobalConfig::from_toml_str("[automation]\nwebhook_url = \"  \"\n")
        .expect("valid config");
    assert!(config.automation.webhook_url.is_none());
}

#[test]
fn negative_fee_is_rejected() {
    let result = GlobalConfig::from_toml_str("delivery_fee_cents = -1");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn zero_fee_is_rejected() {
    let result = GlobalConfig::from_toml_str("delivery_fee_cents = 0");
    match result {
        Err(AppError::Config(msg)) => assert!(msg.contains("greater than zero")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn zero_page_size_is_rejected() {
    let result = GlobalConfig::from_toml_str("status_page_size = 0");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn invalid_toml_is_a_config_error() {
    let result = GlobalConfig::from_toml_str("http_port = \"eighty\"");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(FULL.as_bytes()).expect("write config");

    let config = GlobalConfig::load_from_path(file.path()).expect("load");
    assert_eq!(config.http_port, 8080);
}

#[test]
fn missing_file_is_a_config_error() {
    let result = GlobalConfig::load_from_path("/nonexistent/order-intercom.toml");
    assert!(matches!(result, Err(AppError::Config(_))));
}
