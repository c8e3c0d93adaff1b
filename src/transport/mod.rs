//! Outbound message transport
//!
//! The runtime only needs one primitive from the chat platform: send a
//! message to a user. Inbound messages reach the runtime through
//! [`Scheduler::respond`](crate::session::Scheduler::respond).

pub mod recording;
pub mod telegram;

use async_trait::async_trait;
use serde_json::Value;

use crate::utils::errors::Result;
use crate::UserId;

pub use recording::RecordingTransport;
pub use telegram::TelegramTransport;

/// Sends messages to users
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, user: UserId, message: Value) -> Result<()>;
}

/// Render a payload as chat text: strings verbatim, everything else as JSON
pub fn render_text(message: &Value) -> String {
    match message {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
