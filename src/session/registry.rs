//! Session registry
//!
//! Maps users to their sessions. The map lock only guards lookup, insertion
//! and eviction; everything else a session does happens under its own lock.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use serde::Serialize;
use tracing::{debug, info};

use crate::UserId;
use super::{Phase, Session, SessionSnapshot};

/// Concurrency-safe map of user sessions
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<UserId, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<UserId, Arc<Session>>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<UserId, Arc<Session>>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session of `user`, created on first sight
    pub fn get_or_create(&self, user: UserId) -> Arc<Session> {
        if let Some(session) = self.read().get(&user) {
            return session.clone();
        }

        self.write()
            .entry(user)
            .or_insert_with(|| {
                debug!(user_id = user, "Creating session");
                Arc::new(Session::new(user))
            })
            .clone()
    }

    pub fn get(&self, user: UserId) -> Option<Arc<Session>> {
        self.read().get(&user).cloned()
    }

    pub fn remove(&self, user: UserId) -> Option<Arc<Session>> {
        self.write().remove(&user)
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.read().contains_key(&user)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn users(&self) -> Vec<UserId> {
        self.read().keys().copied().collect()
    }

    pub fn snapshot(&self, user: UserId) -> Option<SessionSnapshot> {
        self.get(user).map(|session| session.snapshot())
    }

    /// Drop sessions idle for at least `ttl`.
    ///
    /// A session is only evicted when nothing outside the registry holds it,
    /// so a pending or running drive keeps its session alive. Dropping a
    /// session aborts its script.
    pub fn evict_idle(&self, ttl: Duration) -> Vec<UserId> {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let mut evicted = Vec::new();

        self.write().retain(|user, session| {
            let idle = Arc::strong_count(session) == 1
                && !session.is_busy()
                && session.idle_for() >= ttl;
            if idle {
                evicted.push(*user);
            }
            !idle
        });

        if !evicted.is_empty() {
            info!(evicted = evicted.len(), "Evicted idle sessions");
        }
        evicted
    }

    pub fn statistics(&self) -> RegistryStatistics {
        let sessions: Vec<Arc<Session>> = self.read().values().cloned().collect();
        let mut by_phase = HashMap::new();
        let mut queued_messages = 0;

        for session in &sessions {
            let snapshot = session.snapshot();
            *by_phase.entry(snapshot.phase).or_insert(0) += 1;
            queued_messages += snapshot.queue_depth;
        }

        RegistryStatistics {
            total_sessions: sessions.len(),
            by_phase,
            queued_messages,
        }
    }
}

/// Registry-wide counters
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatistics {
    pub total_sessions: usize,
    pub by_phase: HashMap<Phase, usize>,
    pub queued_messages: usize,
}

impl RegistryStatistics {
    pub fn count(&self, phase: Phase) -> usize {
        self.by_phase.get(&phase).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_or_create_is_stable() {
        let registry = SessionRegistry::new();
        let a = registry.get_or_create(1);
        let b = registry.get_or_create(1);
        assert!(Arc::ptr_eq(&a, &b));

        registry.get_or_create(2);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(2));
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_evict_skips_held_sessions() {
        let registry = SessionRegistry::new();
        let held = registry.get_or_create(1);
        registry.get_or_create(2);

        let evicted = registry.evict_idle(Duration::ZERO);
        assert_eq!(evicted, vec![2]);
        assert!(registry.contains(1));

        drop(held);
        assert_eq!(registry.evict_idle(Duration::ZERO), vec![1]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_evict_respects_ttl() {
        let registry = SessionRegistry::new();
        registry.get_or_create(1);
        assert!(registry.evict_idle(Duration::from_secs(3600)).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_evict_with_huge_ttl_keeps_sessions() {
        let registry = SessionRegistry::new();
        registry.get_or_create(1);
        assert!(registry.evict_idle(Duration::from_secs(u64::MAX)).is_empty());
        assert!(registry.evict_idle(Duration::MAX).is_empty());
        assert!(registry.contains(1));
    }

    #[test]
    fn test_statistics() {
        let registry = SessionRegistry::new();
        let session = registry.get_or_create(1);
        session.inbox().deliver(json!("hey"));
        session.inbox().deliver(json!("in1"));
        registry.get_or_create(2);

        let stats = registry.statistics();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.count(Phase::Idle), 2);
        assert_eq!(stats.count(Phase::Running), 0);
        assert_eq!(stats.queued_messages, 1);
    }
}
