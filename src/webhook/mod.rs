//! Inbound HTTP surface: provider webhook and health probe.

pub mod payload;
pub mod server;

pub use server::{router, serve, AppState};
