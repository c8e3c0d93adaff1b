//! Test helpers module
//!
//! Mock Telegram Bot API server, a small harness around the scheduler and a
//! storage backend that fails on demand.

#![allow(dead_code)]

pub mod telegram_mock;
pub mod harness;
pub mod failing_storage;

pub use telegram_mock::*;
pub use harness::*;
pub use failing_storage::*;

/// Bot token understood by the mock server
pub fn test_bot_token() -> String {
    "12345:test_token".to_string()
}
