//! HTTP client for an Evolution-style chat provider.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::MessageTransport;
use crate::config::TransportConfig;
use crate::conversation::ReplyOption;
use crate::{AppError, Result};

#[derive(Debug, Serialize)]
struct SendTextBody<'a> {
    number: &'a str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ButtonBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    display_text: &'a str,
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct SendButtonsBody<'a> {
    number: &'a str,
    title: &'a str,
    description: &'a str,
    buttons: Vec<ButtonBody<'a>>,
}

/// `reqwest`-backed [`MessageTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    instance: String,
    api_key: String,
    buttons_enabled: bool,
}

impl HttpTransport {
    /// Build a client from transport settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the HTTP client cannot be built.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            instance: config.instance.clone(),
            api_key: config.api_key.clone(),
            buttons_enabled: config.buttons_enabled,
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/message/{operation}/{}", self.base_url, self.instance)
    }

    async fn post<B: Serialize + Sync>(&self, operation: &str, body: &B) -> Result<()> {
        let url = self.endpoint(operation);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "{operation} returned {status}: {detail}"
            )));
        }

        debug!(operation, %status, "provider accepted message");
        Ok(())
    }

    /// Send a plain text message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` on network failure or non-2xx status.
    pub async fn send_text(&self, phone: &str, text: &str) -> Result<()> {
        self.post(
            "sendText",
            &SendTextBody {
                number: phone,
                text,
            },
        )
        .await
    }

    /// Send a button message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` when buttons are disabled, on network
    /// failure, or on a non-2xx status.
    pub async fn send_buttons(
        &self,
        phone: &str,
        title: &str,
        description: &str,
        options: &[ReplyOption],
    ) -> Result<()> {
        if !self.buttons_enabled {
            return Err(AppError::Transport("buttons are disabled".into()));
        }

        let body = SendButtonsBody {
            number: phone,
            title,
            description,
            buttons: options
                .iter()
                .map(|option| ButtonBody {
                    kind: "reply",
                    display_text: &option.label,
                    id: &option.id,
                })
                .collect(),
        };
        self.post("sendButtons", &body).await
    }
}

impl MessageTransport for HttpTransport {
    fn send_text<'a>(
        &'a self,
        phone: &'a str,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(HttpTransport::send_text(self, phone, text))
    }

    fn send_buttons<'a>(
        &'a self,
        phone: &'a str,
        title: &'a str,
        description: &'a str,
        options: &'a [ReplyOption],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(HttpTransport::send_buttons(
            self,
            phone,
            title,
            description,
            options,
        ))
    }
}
