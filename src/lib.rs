//! Chatbot conversation coroutines
//!
//! Drives stateful, multi-turn conversations for many users over a
//! message-based transport. Each conversation is an async script that can
//! pause waiting for the user's next message; a per-user scheduler keeps each
//! user's messages in order and never resumes one user's script twice at once.

pub mod config;
pub mod conversations;
pub mod coroutine;
pub mod session;
pub mod storage;
pub mod transport;
pub mod utils;

/// Identity of a conversation partner (the Telegram chat id)
pub type UserId = i64;

// Re-export commonly used types
pub use config::Settings;
pub use coroutine::{Context, Conversation, DriveResult, Intent, Signal};
pub use session::{ErrorSink, Outcome, Scheduler, SessionReaper};
pub use storage::{MemoryStorage, RedisStorage, StorageBackend, StorageScope};
pub use transport::{RecordingTransport, TelegramTransport, Transport};
pub use utils::errors::{ConversationError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
