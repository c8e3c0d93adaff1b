//! Receivers for failed drives

use crate::utils::errors::ConversationError;
use crate::utils::logging::log_conversation_error;
use crate::UserId;

/// Told about every failed drive. Must not block.
pub trait ErrorSink: Send + Sync {
    fn on_error(&self, user_id: UserId, error: &ConversationError);
}

impl<F> ErrorSink for F
where
    F: Fn(UserId, &ConversationError) + Send + Sync,
{
    fn on_error(&self, user_id: UserId, error: &ConversationError) {
        self(user_id, error)
    }
}

/// Reports failures through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn on_error(&self, user_id: UserId, error: &ConversationError) {
        log_conversation_error(user_id, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |user_id: UserId, error: &ConversationError| {
            seen.lock().unwrap().push((user_id, error.to_string()));
        };

        sink.on_error(3, &ConversationError::ProtocolViolation("yield 1".to_string()));
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, 3);
        assert!(seen[0].1.contains("yield 1"));
    }
}
