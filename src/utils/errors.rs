//! Error handling for the conversation runtime
//!
//! This module defines the error types reported by conversation scripts,
//! the coroutine driver, storage backends and transports.

use thiserror::Error;

/// Main error type for the conversation runtime
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Script fault: {0}")]
    ScriptFault(String),

    #[error("Storage fault: {0}")]
    StorageFault(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Conversation detached from its session")]
    Detached,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Invalid stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for conversation runtime operations
pub type Result<T> = std::result::Result<T, ConversationError>;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl ConversationError {
    /// Build a script fault from anything printable
    pub fn script(message: impl Into<String>) -> Self {
        ConversationError::ScriptFault(message.into())
    }

    /// Check if a later message for the same user can be expected to succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            ConversationError::ProtocolViolation(_) => false,
            ConversationError::ScriptFault(_) => false,
            ConversationError::StorageFault(StorageError::Serialization(_)) => false,
            ConversationError::StorageFault(_) => true,
            ConversationError::Transport(_) => true,
            ConversationError::Telegram(_) => true,
            ConversationError::Detached => false,
            ConversationError::Config(_) => false,
            ConversationError::ConfigLoad(_) => false,
            ConversationError::UrlParse(_) => false,
            ConversationError::Serialization(_) => false,
            ConversationError::Io(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ConversationError::Config(_) => ErrorSeverity::Critical,
            ConversationError::ConfigLoad(_) => ErrorSeverity::Critical,
            ConversationError::UrlParse(_) => ErrorSeverity::Critical,
            ConversationError::Detached => ErrorSeverity::Info,
            ConversationError::Transport(_) | ConversationError::Telegram(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_fault_conversion() {
        let err: ConversationError = StorageError::Unavailable("down".to_string()).into();
        assert!(matches!(err, ConversationError::StorageFault(_)));
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Storage fault: Storage unavailable: down");
    }

    #[test]
    fn test_severity() {
        assert_eq!(ConversationError::script("boom").severity(), ErrorSeverity::Error);
        assert_eq!(ConversationError::Detached.severity(), ErrorSeverity::Info);
        assert_eq!(ConversationError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert!(!ConversationError::ProtocolViolation("1".into()).is_recoverable());
    }
}
