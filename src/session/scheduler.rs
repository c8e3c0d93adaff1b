//! Scheduler: the single entry point for inbound messages
//!
//! `respond` queues a message on the user's session and then drives the
//! user's script under the session lock. Waiters on that lock are served in
//! arrival order, so drives of one user run one after another in the order
//! their messages were scheduled, while different users never wait on each
//! other.

use std::sync::Arc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::coroutine::{drive, Conversation, Coroutine, DriveResult, Signal};
use crate::storage::{StorageBackend, StorageScope};
use crate::transport::Transport;
use crate::utils::errors::ConversationError;
use crate::utils::logging::{log_drive_result, log_session_recycled};
use crate::UserId;
use super::{Delivery, ErrorSink, LogErrorSink, Park, RegistryStatistics, Session, SessionRegistry, SessionSnapshot};

/// Result of one scheduling turn
#[derive(Debug)]
pub enum Outcome {
    /// There was nothing to resume
    Idle,
    Drove(DriveResult),
}

impl Outcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, Outcome::Idle)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Drove(DriveResult::Completed))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Drove(DriveResult::Failed(_)))
    }

    pub fn drive_result(&self) -> Option<&DriveResult> {
        match self {
            Outcome::Idle => None,
            Outcome::Drove(result) => Some(result),
        }
    }

    pub fn error(&self) -> Option<&ConversationError> {
        match self {
            Outcome::Drove(DriveResult::Failed(error)) => Some(error),
            _ => None,
        }
    }
}

/// Drives every user's conversation
#[derive(Clone)]
pub struct Scheduler {
    conversation: Arc<dyn Conversation>,
    storage: Arc<dyn StorageBackend>,
    transport: Arc<dyn Transport>,
    registry: Arc<SessionRegistry>,
    error_sink: Arc<dyn ErrorSink>,
}

impl Scheduler {
    pub fn new(
        conversation: Arc<dyn Conversation>,
        storage: Arc<dyn StorageBackend>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            conversation,
            storage,
            transport,
            registry: Arc::new(SessionRegistry::new()),
            error_sink: Arc::new(LogErrorSink),
        }
    }

    /// Replace the default error sink, which only logs
    pub fn with_error_sink(mut self, error_sink: Arc<dyn ErrorSink>) -> Self {
        self.error_sink = error_sink;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Accept `message` from `user` and drive their conversation.
    ///
    /// The message is queued before this future first suspends, so the order
    /// in which `respond` calls are first polled is the order the script
    /// sees their messages in.
    pub async fn respond(&self, user: UserId, message: Value) -> Outcome {
        let session = self.accept(user, message);
        self.pump(session).await
    }

    /// Like [`respond`](Self::respond), but drives on a background task. The
    /// message is queued before this returns.
    pub fn spawn_respond(&self, user: UserId, message: Value) -> JoinHandle<Outcome> {
        let session = self.accept(user, message);
        let scheduler = self.clone();
        tokio::spawn(async move { scheduler.pump(session).await })
    }

    /// Re-drive a user's script without a new message. Resumes a suspended
    /// script; does nothing for unknown users.
    pub async fn trigger(&self, user: UserId) -> Outcome {
        match self.registry.get(user) {
            Some(session) => self.pump(session).await,
            None => Outcome::Idle,
        }
    }

    /// Drop the user's script instance and queued messages. Storage is kept.
    /// Returns whether there was a script to drop.
    pub async fn reset(&self, user: UserId) -> bool {
        let Some(session) = self.registry.get(user) else {
            return false;
        };

        let mut script = session.lock().await;
        let instance = script.coroutine.take().map(|coroutine| coroutine.id());
        script.park = Park::Idle;
        let discarded = session.inbox().recycle();
        log_session_recycled(user, instance, discarded, "reset");
        instance.is_some()
    }

    pub fn snapshot(&self, user: UserId) -> Option<SessionSnapshot> {
        self.registry.snapshot(user)
    }

    pub fn stats(&self) -> RegistryStatistics {
        self.registry.statistics()
    }

    fn accept(&self, user: UserId, message: Value) -> Arc<Session> {
        let session = self.registry.get_or_create(user);
        match session.inbox().deliver(message) {
            Delivery::Priming => debug!(user_id = user, "Priming message received"),
            Delivery::Queued { depth } => trace!(user_id = user, depth = depth, "Message queued"),
        }
        session
    }

    fn spawn_coroutine(&self, user: UserId) -> Coroutine {
        let storage = StorageScope::new(user, self.storage.clone());
        Coroutine::spawn(self.conversation.clone(), user, storage, self.transport.clone())
    }

    async fn pump(&self, session: Arc<Session>) -> Outcome {
        let user = session.user();
        let mut guard = session.lock().await;
        let script = &mut *guard;
        session.touch();

        let entry = match session.inbox().take_priming() {
            Some(priming) => {
                let coroutine = self.spawn_coroutine(user);
                info!(user_id = user, instance = %coroutine.id(), "Starting conversation");
                script.coroutine = Some(coroutine);
                Signal::plain(priming)
            }
            None => {
                if script.park == Park::AwaitingInput && session.inbox().is_empty() {
                    return Outcome::Idle;
                }
                script.park.entry()
            }
        };

        let Some(coroutine) = script.coroutine.as_mut() else {
            return Outcome::Idle;
        };
        let instance = coroutine.id();

        session.record_drive();
        let result = drive(coroutine, session.inbox(), entry).await;
        let finished = coroutine.is_finished();
        log_drive_result(user, Some(instance), &result);
        script.park = Park::from_drive(&result);

        match &result {
            DriveResult::Completed => {
                script.coroutine = None;
                let discarded = session.inbox().recycle();
                log_session_recycled(user, Some(instance), discarded, "completed");
            }
            DriveResult::Failed(error) => {
                // A script that returned an error or panicked cannot be
                // re-entered; the next message starts a new instance.
                if finished {
                    script.coroutine = None;
                    session.inbox().rearm();
                    debug!(user_id = user, instance = %instance, "Failed conversation dropped");
                }
                self.error_sink.on_error(user, error);
            }
            DriveResult::Suspended { .. } | DriveResult::AwaitingInput => {}
        }

        session.touch();
        Outcome::Drove(result)
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("storage", &self.storage.name())
            .field("sessions", &self.registry.len())
            .finish_non_exhaustive()
    }
}
