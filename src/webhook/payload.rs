//! Evolution-style inbound webhook envelope.
//!
//! Only the fields the conversation needs are modelled; everything else
//! in the provider payload is ignored by serde.

use serde::Deserialize;
use tracing::debug;

use crate::{AppError, Result};

/// Event name accepted for inbound messages, after normalization.
pub const MESSAGES_UPSERT: &str = "messages.upsert";

/// Top-level webhook body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEnvelope {
    /// Provider event name (`messages.upsert`, `MESSAGES_UPSERT`, ...).
    #[serde(default)]
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub data: Option<MessageData>,
}

/// Payload of a `messages.upsert` event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageData {
    /// Conversation key.
    #[serde(default)]
    pub key: Option<MessageKey>,
    /// Message content variants.
    #[serde(default)]
    pub message: Option<MessageContent>,
}

/// Sender identity of a message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    /// JID such as `5511999999999@s.whatsapp.net`.
    #[serde(default)]
    pub remote_jid: Option<String>,
    /// Set when the message was sent by this instance.
    #[serde(default)]
    pub from_me: bool,
}

/// The content shapes a customer message can arrive in.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    #[serde(default)]
    pub conversation: Option<String>,
    #[serde(default)]
    pub extended_text_message: Option<ExtendedText>,
    #[serde(default)]
    pub buttons_response_message: Option<ButtonsResponse>,
    #[serde(default)]
    pub template_button_reply_message: Option<TemplateButtonReply>,
    #[serde(default)]
    pub list_response_message: Option<ListResponse>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtendedText {
    #[serde(default)]
    pub text: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonsResponse {
    #[serde(default)]
    pub selected_button_id: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateButtonReply {
    #[serde(default)]
    pub selected_id: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    #[serde(default)]
    pub single_select_reply: Option<SingleSelectReply>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleSelectReply {
    #[serde(default)]
    pub selected_row_id: Option<String>,
}

/// What an inbound webhook amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A customer text to run through the conversation.
    Message {
        /// Sender phone (JID without the `@` suffix).
        phone: String,
        /// Message text.
        text: String,
    },
    /// Not a customer message event (other event type, own echo, group).
    Ignored,
    /// Right event, but no usable phone or text.
    NoMessage,
}

/// Lowercase and turn `_` into `.` so `MESSAGES_UPSERT` reads as
/// `messages.upsert`.
#[must_use]
pub fn normalize_event(event: &str) -> String {
    event.trim().to_lowercase().replace('_', ".")
}

impl MessageContent {
    /// First non-empty text among the supported shapes, in priority order.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        let candidates = [
            self.conversation.as_deref(),
            self.extended_text_message
                .as_ref()
                .and_then(|m| m.text.as_deref()),
            self.buttons_response_message
                .as_ref()
                .and_then(|m| m.selected_button_id.as_deref()),
            self.template_button_reply_message
                .as_ref()
                .and_then(|m| m.selected_id.as_deref()),
            self.list_response_message
                .as_ref()
                .and_then(|m| m.single_select_reply.as_ref())
                .and_then(|r| r.selected_row_id.as_deref()),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
    }
}

/// Phone part of a JID.
#[must_use]
pub fn phone_from_jid(jid: &str) -> &str {
    jid.split_once('@').map_or(jid, |(phone, _)| phone)
}

impl WebhookEnvelope {
    /// Classify this webhook.
    #[must_use]
    pub fn classify(&self) -> Inbound {
        if normalize_event(&self.event) != MESSAGES_UPSERT {
            return Inbound::Ignored;
        }

        let Some(data) = self.data.as_ref() else {
            return Inbound::NoMessage;
        };

        let key = data.key.as_ref();
        if key.is_some_and(|k| k.from_me) {
            return Inbound::Ignored;
        }

        let Some(jid) = key.and_then(|k| k.remote_jid.as_deref()) else {
            return Inbound::NoMessage;
        };
        if jid.ends_with("@g.us") {
            return Inbound::Ignored;
        }

        let phone = phone_from_jid(jid).trim();
        let text = data.message.as_ref().and_then(MessageContent::text);

        match text {
            Some(text) if !phone.is_empty() => Inbound::Message {
                phone: phone.to_owned(),
                text: text.trim().to_owned(),
            },
            _ => Inbound::NoMessage,
        }
    }
}

impl WebhookEnvelope {
    /// Decode a raw webhook body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedRequest` if the body is not a JSON
    /// object of the expected shape.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|err| AppError::MalformedRequest(err.to_string()))
    }
}

/// Classify a raw webhook body; undecodable JSON counts as no message.
#[must_use]
pub fn classify_body(body: &[u8]) -> Inbound {
    match WebhookEnvelope::from_slice(body) {
        Ok(envelope) => envelope.classify(),
        Err(err) => {
            debug!(%err, "undecodable webhook body");
            Inbound::NoMessage
        }
    }
}
