//! Background eviction of idle sessions

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use super::SessionRegistry;

/// Periodically evicts sessions idle longer than a TTL
#[derive(Debug)]
pub struct SessionReaper {
    registry: Arc<SessionRegistry>,
    idle_ttl: Duration,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl SessionReaper {
    pub fn new(registry: Arc<SessionRegistry>, idle_ttl: Duration, interval: Duration) -> Self {
        Self {
            registry,
            idle_ttl,
            interval,
            handle: None,
        }
    }

    pub fn from_config(registry: Arc<SessionRegistry>, config: &SessionConfig) -> Self {
        Self::new(
            registry,
            Duration::from_secs(config.idle_ttl_seconds),
            Duration::from_secs(config.reap_interval_seconds),
        )
    }

    /// A zero TTL disables reaping
    pub fn is_enabled(&self) -> bool {
        !self.idle_ttl.is_zero() && !self.interval.is_zero()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Run one eviction pass now
    pub fn reap_now(&self) -> usize {
        self.registry.evict_idle(self.idle_ttl).len()
    }

    /// Start the background task
    pub fn start(&mut self) {
        if !self.is_enabled() {
            debug!("Session reaper disabled");
            return;
        }
        if self.handle.is_some() {
            warn!("Session reaper is already running");
            return;
        }

        let registry = self.registry.clone();
        let idle_ttl = self.idle_ttl;
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(idle_ttl);
                if !evicted.is_empty() {
                    debug!(users = ?evicted, "Reaped idle sessions");
                }
            }
        });

        self.handle = Some(handle);
        info!(idle_ttl = ?self.idle_ttl, interval = ?self.interval, "Started session reaper");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Stopped session reaper");
        }
    }
}

impl Drop for SessionReaper {
    fn drop(&mut self) {
        self.stop();
    }
}
