//! Per-user key/value storage
//!
//! Conversation scripts remember facts about a user through a [`StorageScope`],
//! which binds one of the pluggable [`StorageBackend`]s to a single user so two
//! users' keys never collide.

pub mod memory;
pub mod redis;

use std::sync::Arc;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::config::{StorageBackendKind, StorageConfig};
use crate::utils::errors::{Result, StorageResult};
use crate::UserId;

pub use self::memory::MemoryStorage;
pub use self::redis::RedisStorage;

/// Backing store shared by all users
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read a key of `user`, `None` when absent
    async fn read(&self, user: UserId, key: &str) -> StorageResult<Option<Value>>;

    /// Write a key of `user`
    async fn write(&self, user: UserId, key: &str, value: Value) -> StorageResult<()>;

    /// Remove every key of `user` and nothing else
    async fn clear(&self, user: UserId) -> StorageResult<()>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Storage access bound to a single user
#[derive(Clone)]
pub struct StorageScope {
    user: UserId,
    backend: Arc<dyn StorageBackend>,
}

impl StorageScope {
    pub fn new(user: UserId, backend: Arc<dyn StorageBackend>) -> Self {
        Self { user, backend }
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub async fn read(&self, key: &str) -> StorageResult<Option<Value>> {
        self.backend.read(self.user, key).await
    }

    /// Read and deserialize a key
    pub async fn read_as<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.read(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn write(&self, key: &str, value: Value) -> StorageResult<()> {
        self.backend.write(self.user, key, value).await
    }

    pub async fn clear(&self) -> StorageResult<()> {
        self.backend.clear(self.user).await
    }
}

impl std::fmt::Debug for StorageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageScope")
            .field("user", &self.user)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Build the backend selected in the configuration
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config.backend {
        StorageBackendKind::Memory => Arc::new(MemoryStorage::new()),
        StorageBackendKind::Redis => {
            let storage = RedisStorage::new(config.clone()).await?;
            storage.test_connection().await?;
            Arc::new(storage)
        }
    };

    info!(backend = backend.name(), "Storage backend ready");
    Ok(backend)
}
