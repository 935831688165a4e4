//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which runtime credentials are stored.
pub const KEYRING_SERVICE: &str = "order-intercom";

/// Chat provider (Evolution-style REST API) connectivity.
///
/// The API key is loaded at runtime via OS keychain or environment
/// variable, never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct TransportConfig {
    /// Provider base URL, e.g. `https://evolution.example.com`.
    #[serde(default)]
    pub base_url: String,
    /// Provider instance identifier appended to every send path.
    #[serde(default)]
    pub instance: String,
    /// Whether structured button messages may be attempted.
    #[serde(default = "default_true")]
    pub buttons_enabled: bool,
    /// Per-request timeout for outbound calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Static API key (populated at runtime).
    #[serde(skip)]
    pub api_key: String,
}

impl TransportConfig {
    /// Whether enough settings are present to reach the provider at all.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.instance.is_empty() && !self.api_key.is_empty()
    }
}

/// Optional automation endpoint that receives a copy of every processed turn.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct AutomationConfig {
    /// Target URL; forwarding is disabled when absent.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    10
}

fn default_http_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data").join("orders.db")
}

fn default_delivery_fee_cents() -> i64 {
    500
}

fn default_status_page_size() -> u32 {
    5
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port for the webhook listener.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Interface the webhook listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// `SQLite` database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Flat fee charged on delivery orders, in cents.
    #[serde(default = "default_delivery_fee_cents")]
    pub delivery_fee_cents: i64,
    /// Maximum number of open orders listed by a status query.
    #[serde(default = "default_status_page_size")]
    pub status_page_size: u32,
    /// Chat provider settings.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Turn forwarding settings.
    #[serde(default)]
    pub automation: AutomationConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the transport API key from OS keychain with env-var fallback.
    ///
    /// A missing key is not fatal: the server still runs and logs every
    /// reply it cannot deliver.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keychain task panics.
    pub async fn load_credentials(&mut self) -> Result<()> {
        match load_credential("transport_api_key", "TRANSPORT_API_KEY").await? {
            Some(key) => self.transport.api_key = key,
            None => warn!("transport api key not found; outbound messages are disabled"),
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.delivery_fee_cents <= 0 {
            return Err(AppError::Config(
                "delivery_fee_cents must be greater than zero".into(),
            ));
        }

        if self.status_page_size == 0 {
            return Err(AppError::Config(
                "status_page_size must be greater than zero".into(),
            ));
        }

        self.transport.base_url = self.transport.base_url.trim_end_matches('/').to_owned();

        if let Some(url) = self.automation.webhook_url.as_deref() {
            if url.trim().is_empty() {
                self.automation.webhook_url = None;
            }
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
///
/// Returns `Ok(None)` when neither source provides a value.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    Ok(env::var(env_key).ok().filter(|value| !value.is_empty()))
}
