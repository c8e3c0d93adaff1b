//! In-process transport that records every send

use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, Ordering};
use async_trait::async_trait;
use serde_json::Value;

use crate::utils::errors::{ConversationError, Result};
use crate::UserId;
use super::Transport;

/// Keeps sent messages in memory. Used by tests and local dry runs.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(UserId, Value)>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All sends in order
    pub fn sent(&self) -> Vec<(UserId, Value)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Messages sent to one user, in order
    pub fn sent_to(&self, user: UserId) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, user: UserId, message: Value) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConversationError::Transport(format!("send to {} refused", user)));
        }
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push((user, message));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_per_user() {
        let transport = RecordingTransport::new();
        transport.send(1, json!("a")).await.unwrap();
        transport.send(2, json!("b")).await.unwrap();
        transport.send(1, json!("c")).await.unwrap();

        assert_eq!(transport.sent_to(1), vec![json!("a"), json!("c")]);
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_failing() {
        let transport = RecordingTransport::new();
        transport.set_failing(true);
        assert!(transport.send(1, json!("a")).await.is_err());
        assert!(transport.sent().is_empty());
    }
}
