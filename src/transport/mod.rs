//! Outbound messaging to the chat provider.
//!
//! [`MessageTransport`] is the raw provider seam; the [`dispatcher`]
//! turns a conversation [`Reply`](crate::conversation::Reply) into one
//! delivered message, degrading buttons to numbered text when needed.

pub mod automation;
pub mod client;
pub mod dispatcher;

use std::future::Future;
use std::pin::Pin;

use crate::conversation::ReplyOption;
use crate::Result;

pub use dispatcher::Dispatcher;

/// Provider operations used to deliver replies.
pub trait MessageTransport: Send + Sync {
    /// Send a plain text message to `phone`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the provider rejects the request
    /// or cannot be reached.
    fn send_text<'a>(
        &'a self,
        phone: &'a str,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Send a structured message with reply buttons to `phone`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if buttons are unsupported, the
    /// provider rejects the request, or it cannot be reached.
    fn send_buttons<'a>(
        &'a self,
        phone: &'a str,
        title: &'a str,
        description: &'a str,
        options: &'a [ReplyOption],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
