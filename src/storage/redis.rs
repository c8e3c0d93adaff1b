//! Redis storage implementation
//!
//! Durable per-user storage. Keys are laid out as `{prefix}{user}:{key}` and
//! values are stored as JSON strings, optionally with an expiry.

use ::redis::{AsyncCommands, Client};
use ::redis::aio::ConnectionManager;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::StorageConfig;
use crate::utils::errors::StorageResult;
use crate::UserId;
use super::StorageBackend;

/// Redis-based storage backend
#[derive(Clone)]
pub struct RedisStorage {
    /// Redis connection manager
    connection_manager: ConnectionManager,
    /// Storage configuration
    config: StorageConfig,
}

impl RedisStorage {
    /// Create a new storage instance
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection_manager = ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    /// Test Redis connection
    pub async fn test_connection(&self) -> StorageResult<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = ::redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Get the Redis key for a user's entry
    fn entry_key(&self, user: UserId, key: &str) -> String {
        format!("{}{}", self.user_prefix(user), key)
    }

    fn user_prefix(&self, user: UserId) -> String {
        format!("{}{}:", self.config.prefix, user)
    }
}

#[async_trait]
impl StorageBackend for RedisStorage {
    async fn read(&self, user: UserId, key: &str) -> StorageResult<Option<Value>> {
        let key = self.entry_key(user, key);
        let mut conn = self.connection_manager.clone();

        let serialized: Option<String> = conn.get(&key).await?;
        debug!(user_id = user, key = %key, found = serialized.is_some(), "Redis read");

        match serialized {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn write(&self, user: UserId, key: &str, value: Value) -> StorageResult<()> {
        let key = self.entry_key(user, key);
        let serialized = serde_json::to_string(&value)?;
        let mut conn = self.connection_manager.clone();

        let result = match self.config.ttl_seconds {
            Some(ttl_seconds) => conn.set_ex::<_, _, ()>(&key, serialized, ttl_seconds).await,
            None => conn.set::<_, _, ()>(&key, serialized).await,
        };

        if let Err(e) = result {
            error!(user_id = user, key = %key, error = %e, "Failed to write to Redis");
            return Err(e.into());
        }

        debug!(user_id = user, key = %key, "Redis write");
        Ok(())
    }

    async fn clear(&self, user: UserId) -> StorageResult<()> {
        let pattern = format!("{}*", self.user_prefix(user));
        let mut conn = self.connection_manager.clone();

        let keys: Vec<String> = conn.keys(&pattern).await?;
        if keys.is_empty() {
            debug!(user_id = user, "No keys to clear");
            return Ok(());
        }

        let deleted: u32 = conn.del(&keys).await?;
        debug!(user_id = user, deleted = deleted, "Cleared user keys");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStorage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
