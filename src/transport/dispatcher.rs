//! Reply delivery with button-to-text fallback.
//!
//! Delivery is best effort: failures are logged and never surface to the
//! conversation, whose state is already persisted by the time a reply is
//! sent.

use std::sync::Arc;

use tracing::{debug, warn};

use super::MessageTransport;
use crate::conversation::render::buttons_as_text;
use crate::conversation::{Reply, ReplyOption};

/// Sends conversation replies through an optional transport.
#[derive(Clone, Default)]
pub struct Dispatcher {
    transport: Option<Arc<dyn MessageTransport>>,
}

impl Dispatcher {
    /// Dispatcher that delivers through `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    /// Dispatcher that only logs; used when no provider is configured.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether a transport is attached.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send plain text. Returns whether the provider accepted it.
    pub async fn send_text(&self, phone: &str, text: &str) -> bool {
        let Some(transport) = self.transport.as_ref() else {
            debug!(phone, "no transport configured; text reply dropped");
            return false;
        };

        match transport.send_text(phone, text).await {
            Ok(()) => true,
            Err(err) => {
                warn!(phone, %err, "text reply failed");
                false
            }
        }
    }

    /// Send a button message, falling back to one numbered text message
    /// when the structured send fails.
    pub async fn send_buttons(
        &self,
        phone: &str,
        title: &str,
        description: &str,
        options: &[ReplyOption],
    ) -> bool {
        let Some(transport) = self.transport.as_ref() else {
            debug!(phone, "no transport configured; button reply dropped");
            return false;
        };

        match transport
            .send_buttons(phone, title, description, options)
            .await
        {
            Ok(()) => true,
            Err(err) => {
                debug!(phone, %err, "button send failed; falling back to text");
                let text = buttons_as_text(title, description, options);
                self.send_text(phone, &text).await
            }
        }
    }

    /// Deliver a conversation reply in whichever form it was built.
    pub async fn send_reply(&self, phone: &str, reply: &Reply) -> bool {
        match reply {
            Reply::Text { text } => self.send_text(phone, text).await,
            Reply::Buttons {
                title,
                description,
                options,
            } => self.send_buttons(phone, title, description, options).await,
        }
    }
}
