//! Conversation scripts run as coroutines
//!
//! A script is an async function taking a [`Context`]. It runs on its own
//! tokio task and hands control back to the driver at every suspension point:
//! the task sends what it yielded over a single-slot channel and then blocks on
//! a second single-slot channel until the driver resumes it with a value.

use std::future::Future;
use std::sync::Arc;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::storage::StorageScope;
use crate::transport::Transport;
use crate::utils::errors::{ConversationError, Result};
use crate::UserId;
use super::{Context, Signal};

/// An awaitable yielded by a script, resolving to a [`Signal`]
pub type SignalFuture = BoxFuture<'static, Result<Signal>>;

/// What a script handed to the driver at a suspension point
pub enum Yielded {
    Awaitable(SignalFuture),
    /// A bare value. Scripts must only yield awaitables, so the driver
    /// rejects this.
    Plain(Value),
}

impl std::fmt::Debug for Yielded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Yielded::Awaitable(_) => f.write_str("Awaitable(..)"),
            Yielded::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
        }
    }
}

/// Dialogue logic run once per conversation instance
pub trait Conversation: Send + Sync + 'static {
    fn start(&self, ctx: Context) -> BoxFuture<'static, Result<()>>;
}

impl<F, Fut> Conversation for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn start(&self, ctx: Context) -> BoxFuture<'static, Result<()>> {
        Box::pin(self(ctx))
    }
}

enum Step {
    Yielded(Yielded),
    Returned(Result<()>),
}

/// Script side of the channel pair
pub(crate) struct Yielder {
    steps: mpsc::Sender<Step>,
    resumes: Mutex<mpsc::Receiver<Value>>,
}

impl Yielder {
    async fn wait_for_start(&self) -> Option<Value> {
        self.resumes.lock().await.recv().await
    }

    /// Hand `yielded` to the driver and wait to be resumed
    pub(crate) async fn yield_step(&self, yielded: Yielded) -> Result<Value> {
        // Held across the round trip so clones of one context yield one at a time.
        let mut resumes = self.resumes.lock().await;
        self.steps
            .send(Step::Yielded(yielded))
            .await
            .map_err(|_| ConversationError::Detached)?;
        resumes.recv().await.ok_or(ConversationError::Detached)
    }
}

/// Driver side of a running script instance
pub struct Coroutine {
    id: Uuid,
    user: UserId,
    resumes: mpsc::Sender<Value>,
    steps: mpsc::Receiver<Step>,
    task: JoinHandle<()>,
    finished: bool,
}

impl Coroutine {
    /// Spawn a fresh instance of `conversation` for `user`.
    ///
    /// The script does not run until the first [`resume`](Self::resume); the
    /// first resume value only starts it.
    pub fn spawn(
        conversation: Arc<dyn Conversation>,
        user: UserId,
        storage: StorageScope,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (resume_tx, resume_rx) = mpsc::channel(1);
        let (step_tx, step_rx) = mpsc::channel(1);
        let yielder = Arc::new(Yielder {
            steps: step_tx.clone(),
            resumes: Mutex::new(resume_rx),
        });

        let id = Uuid::new_v4();
        let ctx = Context::new(user, storage, transport, yielder.clone());
        let span = tracing::debug_span!("conversation", user_id = user, instance = %id);

        let task = tokio::spawn(
            async move {
                if yielder.wait_for_start().await.is_none() {
                    return;
                }
                drop(yielder);

                debug!("Conversation started");
                let result = conversation.start(ctx).await;
                let _ = step_tx.send(Step::Returned(result)).await;
            }
            .instrument(span),
        );

        Self {
            id,
            user,
            resumes: resume_tx,
            steps: step_rx,
            task,
            finished: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    /// Whether the script has returned
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Resume the script with `value` and wait for its next step.
    ///
    /// `Ok(None)` means the script returned; an error returned by the script
    /// itself (or a panic) comes back as `Err`.
    pub async fn resume(&mut self, value: Value) -> Result<Option<Yielded>> {
        if self.finished {
            return Ok(None);
        }

        if self.resumes.send(value).await.is_err() {
            return self.finish().await;
        }

        match self.steps.recv().await {
            Some(Step::Yielded(yielded)) => Ok(Some(yielded)),
            Some(Step::Returned(result)) => {
                self.finished = true;
                result.map(|()| None)
            }
            None => self.finish().await,
        }
    }

    async fn finish(&mut self) -> Result<Option<Yielded>> {
        self.finished = true;
        match (&mut self.task).await {
            Err(e) if e.is_panic() => Err(ConversationError::script("conversation script panicked")),
            _ => Ok(None),
        }
    }
}

impl Drop for Coroutine {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Coroutine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coroutine")
            .field("id", &self.id)
            .field("user", &self.user)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
