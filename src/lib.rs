#![forbid(unsafe_code)]

//! Conversational ordering over a WhatsApp-style chat provider.
//!
//! Inbound webhooks drive a per-phone state machine backed by `SQLite`;
//! replies go back through the provider's REST API.

pub mod config;
pub mod conversation;
pub mod errors;
pub mod models;
pub mod persistence;
pub mod transport;
pub mod webhook;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
