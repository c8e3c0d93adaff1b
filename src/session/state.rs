//! Per-user session state

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::coroutine::{Coroutine, DriveResult, Signal};
use crate::UserId;
use super::Inbox;

/// Where the current script instance stopped
#[derive(Debug, Clone, PartialEq)]
pub enum Park {
    /// No script instance
    Idle,
    AwaitingInput,
    Suspended { output: Value, await_input: bool },
    /// The last drive failed; the next trigger re-enters the script
    Failed,
}

impl Park {
    /// Signal to re-enter a parked script with
    pub fn entry(&self) -> Signal {
        match self {
            Park::Idle | Park::Failed => Signal::plain(Value::Null),
            Park::AwaitingInput => Signal::await_input(Value::Null),
            Park::Suspended { output, await_input: true } => Signal::await_input(output.clone()),
            Park::Suspended { output, await_input: false } => Signal::plain(output.clone()),
        }
    }

    pub fn from_drive(result: &DriveResult) -> Self {
        match result {
            DriveResult::Suspended { output, await_input } => Park::Suspended {
                output: output.clone(),
                await_input: *await_input,
            },
            DriveResult::AwaitingInput => Park::AwaitingInput,
            DriveResult::Completed => Park::Idle,
            DriveResult::Failed(_) => Park::Failed,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Park::Idle => Phase::Idle,
            Park::AwaitingInput => Phase::AwaitingInput,
            Park::Suspended { .. } => Phase::Suspended,
            Park::Failed => Phase::Failed,
        }
    }
}

/// Externally visible session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    /// A drive is in flight
    Running,
    AwaitingInput,
    Suspended,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::AwaitingInput => "awaiting_input",
            Phase::Suspended => "suspended",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Script instance and its park state, owned by whoever holds the drive lock
#[derive(Debug)]
pub struct Script {
    pub coroutine: Option<Coroutine>,
    pub park: Park,
}

/// One user's session
#[derive(Debug)]
pub struct Session {
    user: UserId,
    inbox: Inbox,
    script: Mutex<Script>,
    last_activity: AtomicI64,
    drives: AtomicU64,
}

impl Session {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            inbox: Inbox::new(),
            script: Mutex::new(Script { coroutine: None, park: Park::Idle }),
            last_activity: AtomicI64::new(Utc::now().timestamp_millis()),
            drives: AtomicU64::new(0),
        }
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    /// Take the drive lock. Waiters are served in the order they asked.
    pub async fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().await
    }

    /// Count a drive of the script. Lock holders that don't resume it
    /// (resets, idle turns) don't call this.
    pub fn record_drive(&self) {
        self.drives.fetch_add(1, Ordering::Relaxed);
    }

    /// Whether a drive currently holds the lock
    pub fn is_busy(&self) -> bool {
        self.script.try_lock().is_err()
    }

    pub fn touch(&self) {
        self.last_activity.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        let millis = self.last_activity.load(Ordering::Relaxed);
        Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
    }

    /// Seconds since the last activity
    pub fn idle_for(&self) -> i64 {
        (Utc::now() - self.last_activity()).num_seconds()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let (phase, instance) = match self.script.try_lock() {
            Ok(script) => (
                script.park.phase(),
                script.coroutine.as_ref().map(Coroutine::id),
            ),
            Err(_) => (Phase::Running, None),
        };

        SessionSnapshot {
            user_id: self.user,
            phase,
            instance,
            queue_depth: self.inbox.len(),
            drives: self.drives.load(Ordering::Relaxed),
            last_activity: self.last_activity(),
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub user_id: UserId,
    pub phase: Phase,
    /// Unknown while a drive is in flight
    pub instance: Option<Uuid>,
    pub queue_depth: usize,
    /// Drives that resumed a script, across all instances
    pub drives: u64,
    pub last_activity: DateTime<Utc>,
}
