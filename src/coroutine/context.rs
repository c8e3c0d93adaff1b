//! Capability object handed to conversation scripts
//!
//! Every method is a suspension point: it yields an awaitable to the driver
//! and returns the value the driver resumes the script with.

use std::future::Future;
use std::sync::Arc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::storage::StorageScope;
use crate::transport::Transport;
use crate::utils::errors::{ConversationError, Result};
use crate::UserId;
use super::script::{Yielded, Yielder};
use super::Signal;

/// Conversation context of one script instance
#[derive(Clone)]
pub struct Context {
    user: UserId,
    storage: StorageScope,
    transport: Arc<dyn Transport>,
    yielder: Arc<Yielder>,
}

impl Context {
    pub(crate) fn new(
        user: UserId,
        storage: StorageScope,
        transport: Arc<dyn Transport>,
        yielder: Arc<Yielder>,
    ) -> Self {
        Self { user, storage, transport, yielder }
    }

    /// The user this conversation belongs to
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Send a message to the user
    pub async fn send(&self, message: impl Into<Value>) -> Result<Value> {
        let message = message.into();
        self.transmit(message, Signal::plain(Value::Null)).await
    }

    /// Send a message and wait for the user's next message
    pub async fn prompt(&self, message: impl Into<Value>) -> Result<Value> {
        let message = message.into();
        self.transmit(message, Signal::await_input(Value::Null)).await
    }

    /// Send a message and stop until the next trigger, which resumes with the
    /// user's next message
    pub async fn prompt_and_suspend(&self, message: impl Into<Value>) -> Result<Value> {
        let message = message.into();
        self.transmit(message, Signal::await_input_and_suspend(Value::Null)).await
    }

    /// Wait for the user's next message without sending anything
    pub async fn await_message(&self) -> Result<Value> {
        self.step(async { Ok::<_, ConversationError>(Signal::await_input(Value::Null)) }).await
    }

    /// Stop driving until the next trigger, which resumes with `value`
    pub async fn suspend(&self, value: impl Into<Value>) -> Result<Value> {
        let signal = Signal::suspend(value);
        self.step(async move { Ok::<_, ConversationError>(signal) }).await
    }

    /// Read a key of this user, `null` when absent
    pub async fn read(&self, key: &str) -> Result<Value> {
        let storage = self.storage.clone();
        let key = key.to_string();
        self.step(async move {
            let value = storage.read(&key).await?;
            Ok::<_, ConversationError>(Signal::plain(value.unwrap_or(Value::Null)))
        })
        .await
    }

    /// Read and deserialize a key of this user
    pub async fn read_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read(key).await? {
            Value::Null => Ok(None),
            value => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    pub async fn write(&self, key: &str, value: impl Into<Value>) -> Result<Value> {
        let storage = self.storage.clone();
        let key = key.to_string();
        let value = value.into();
        self.step(async move {
            storage.write(&key, value).await?;
            Ok::<_, ConversationError>(Signal::plain(Value::Null))
        })
        .await
    }

    /// Forget everything stored for this user
    pub async fn clear(&self) -> Result<Value> {
        let storage = self.storage.clone();
        self.step(async move {
            storage.clear().await?;
            Ok::<_, ConversationError>(Signal::plain(Value::Null))
        })
        .await
    }

    /// Direct access to this user's storage, bypassing the driver
    pub fn storage(&self) -> &StorageScope {
        &self.storage
    }

    /// Yield an arbitrary awaitable and resume with what the driver makes of
    /// its signal
    pub async fn step<F>(&self, awaitable: F) -> Result<Value>
    where
        F: Future<Output = Result<Signal>> + Send + 'static,
    {
        self.yielder.yield_step(Yielded::Awaitable(Box::pin(awaitable))).await
    }

    /// Yield a bare value. The driver treats this as a protocol violation.
    pub async fn yield_plain(&self, value: impl Into<Value>) -> Result<Value> {
        self.yielder.yield_step(Yielded::Plain(value.into())).await
    }

    async fn transmit(&self, message: Value, then: Signal) -> Result<Value> {
        let transport = self.transport.clone();
        let user = self.user;
        self.step(async move {
            transport.send(user, message).await?;
            Ok::<_, ConversationError>(then)
        })
        .await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("user", &self.user)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
