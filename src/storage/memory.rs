//! Volatile in-process storage

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use async_trait::async_trait;
use serde_json::Value;

use crate::utils::errors::StorageResult;
use crate::UserId;
use super::StorageBackend;

/// In-memory backend, one map per user
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<UserId, HashMap<String, Value>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored for a user
    pub fn keys(&self, user: UserId) -> Vec<String> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = data
            .get(&user)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Number of users with at least one key
    pub fn user_count(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn read(&self, user: UserId, key: &str) -> StorageResult<Option<Value>> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(&user).and_then(|entries| entries.get(key)).cloned())
    }

    async fn write(&self, user: UserId, key: &str, value: Value) -> StorageResult<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.entry(user).or_default().insert(key.to_string(), value);
        Ok(())
    }

    async fn clear(&self, user: UserId) -> StorageResult<()> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.remove(&user);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_clear_only_touches_owner() {
        let storage = MemoryStorage::new();
        storage.write(1, "a", json!(1)).await.unwrap();
        storage.write(1, "b", json!(2)).await.unwrap();
        storage.write(12, "a", json!("other")).await.unwrap();

        storage.clear(1).await.unwrap();

        assert!(storage.keys(1).is_empty());
        assert_eq!(storage.read(1, "a").await.unwrap(), None);
        assert_eq!(storage.read(12, "a").await.unwrap(), Some(json!("other")));
        assert_eq!(storage.user_count(), 1);
    }

    #[tokio::test]
    async fn test_overwrite() {
        let storage = MemoryStorage::new();
        storage.write(5, "k", json!("v1")).await.unwrap();
        storage.write(5, "k", json!("v2")).await.unwrap();
        assert_eq!(storage.read(5, "k").await.unwrap(), Some(json!("v2")));
        assert_eq!(storage.keys(5), vec!["k".to_string()]);
    }
}
