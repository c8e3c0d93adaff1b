//! Scheduler harness over in-process storage and transport

use std::sync::{Arc, Mutex};
use chatbot_coroutine::{
    ConversationError, Conversation, MemoryStorage, RecordingTransport, Scheduler, StorageBackend,
    UserId,
};

/// Errors handed to the scheduler's error sink
pub type ErrorLog = Arc<Mutex<Vec<(UserId, String)>>>;

pub struct Harness {
    pub scheduler: Scheduler,
    pub storage: Arc<MemoryStorage>,
    pub transport: Arc<RecordingTransport>,
    pub errors: ErrorLog,
}

impl Harness {
    pub fn new(conversation: impl Conversation) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        Self::with_backend(conversation, storage.clone(), storage)
    }

    /// Drive scripts against `backend`; `storage` is what tests inspect
    pub fn with_backend(
        conversation: impl Conversation,
        storage: Arc<MemoryStorage>,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        let transport = Arc::new(RecordingTransport::new());
        let errors: ErrorLog = Arc::new(Mutex::new(Vec::new()));

        let sink_errors = errors.clone();
        let scheduler = Scheduler::new(Arc::new(conversation), backend, transport.clone())
            .with_error_sink(Arc::new(move |user: UserId, error: &ConversationError| {
                sink_errors.lock().unwrap().push((user, error.to_string()));
            }));

        Self { scheduler, storage, transport, errors }
    }

    /// Text sends to `user`
    pub fn sent_to(&self, user: UserId) -> Vec<String> {
        self.transport
            .sent_to(user)
            .into_iter()
            .map(|value| value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string()))
            .collect()
    }

    pub fn errors(&self) -> Vec<(UserId, String)> {
        self.errors.lock().unwrap().clone()
    }
}
