//! Best-effort forwarding of processed turns to an automation endpoint.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::conversation::{Reply, Turn};
use crate::models::session::{ConversationState, SessionContext};
use crate::Result;

const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Body posted for every processed turn.
#[derive(Debug, Serialize)]
pub struct TurnEvent<'a> {
    /// Sender phone number.
    pub phone: &'a str,
    /// Inbound text as received.
    pub message: &'a str,
    /// State after the turn.
    pub state: ConversationState,
    /// Context after the turn.
    pub context: &'a SessionContext,
    /// Reply sent to the customer.
    pub reply: &'a Reply,
}

impl<'a> TurnEvent<'a> {
    /// Describe `turn` as produced for `phone`/`message`.
    #[must_use]
    pub fn new(phone: &'a str, message: &'a str, turn: &'a Turn) -> Self {
        Self {
            phone,
            message,
            state: turn.state,
            context: &turn.context,
            reply: &turn.reply,
        }
    }
}

/// Posts turn events to the configured webhook, if any.
#[derive(Debug, Clone, Default)]
pub struct AutomationForwarder {
    target: Option<(reqwest::Client, String)>,
}

impl AutomationForwarder {
    /// Forwarder for `webhook_url`; disabled when `None`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the HTTP client cannot be built.
    pub fn new(webhook_url: Option<&str>) -> Result<Self> {
        let Some(url) = webhook_url else {
            return Ok(Self::default());
        };
        let http = reqwest::Client::builder()
            .timeout(FORWARD_TIMEOUT)
            .build()?;
        Ok(Self {
            target: Some((http, url.to_owned())),
        })
    }

    /// Whether a target URL is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Post `event`; errors are logged and swallowed.
    pub async fn forward(&self, event: &TurnEvent<'_>) {
        let Some((http, url)) = self.target.as_ref() else {
            return;
        };

        match http.post(url).json(event).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(phone = event.phone, "turn forwarded to automation");
            }
            Ok(response) => {
                warn!(status = %response.status(), "automation webhook rejected turn");
            }
            Err(err) => {
                warn!(%err, "automation webhook unreachable");
            }
        }
    }
}
