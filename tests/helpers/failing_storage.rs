//! Storage backend that refuses selected operations

use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value;
use chatbot_coroutine::utils::errors::{StorageError, StorageResult};
use chatbot_coroutine::{MemoryStorage, StorageBackend, UserId};

/// Delegates to a [`MemoryStorage`] except for writes of `blocked_key` and
/// `clear`, which report the backend as unavailable
pub struct FailingStorage {
    inner: Arc<MemoryStorage>,
    blocked_key: String,
}

impl FailingStorage {
    pub fn new(inner: Arc<MemoryStorage>, blocked_key: &str) -> Self {
        Self { inner, blocked_key: blocked_key.to_string() }
    }
}

#[async_trait]
impl StorageBackend for FailingStorage {
    async fn read(&self, user: UserId, key: &str) -> StorageResult<Option<Value>> {
        self.inner.read(user, key).await
    }

    async fn write(&self, user: UserId, key: &str, value: Value) -> StorageResult<()> {
        if key == self.blocked_key {
            return Err(StorageError::Unavailable(format!("write of {} refused", key)));
        }
        self.inner.write(user, key, value).await
    }

    async fn clear(&self, _user: UserId) -> StorageResult<()> {
        Err(StorageError::Unavailable("clear refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
