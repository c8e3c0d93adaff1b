//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the conversation runtime.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::coroutine::DriveResult;
use crate::utils::errors::{ConversationError, ErrorSeverity, Result};
use crate::UserId;

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file appender on drop and has to live as
/// long as the process logs to file.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConversationError::Config(format!("Invalid log filter: {}", e)))?;

    let json_layer = config.json.then(|| fmt::layer().json());
    let text_layer = (!config.json).then(fmt::layer);

    let (file_layer, guard) = match &config.file_path {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "chatbot-coroutine.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().with_ansi(false).with_writer(non_blocking)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConversationError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log the result of one drive of a user's script
pub fn log_drive_result(user_id: UserId, instance: Option<Uuid>, result: &DriveResult) {
    match result {
        DriveResult::Suspended { await_input, .. } => debug!(
            user_id = user_id,
            instance = ?instance,
            await_input = await_input,
            "Conversation suspended"
        ),
        DriveResult::AwaitingInput => debug!(
            user_id = user_id,
            instance = ?instance,
            "Conversation waiting for input"
        ),
        DriveResult::Completed => info!(
            user_id = user_id,
            instance = ?instance,
            "Conversation completed"
        ),
        // Reported in full by the scheduler's error sink.
        DriveResult::Failed(err) => debug!(
            user_id = user_id,
            instance = ?instance,
            error = %err,
            "Conversation drive failed"
        ),
    }
}

/// Log a failed drive at a level matching the error severity
pub fn log_conversation_error(user_id: UserId, err: &ConversationError) {
    match err.severity() {
        ErrorSeverity::Info => info!(user_id = user_id, error = %err, "Conversation failed"),
        ErrorSeverity::Warning => warn!(user_id = user_id, error = %err, recoverable = err.is_recoverable(), "Conversation failed"),
        ErrorSeverity::Error | ErrorSeverity::Critical => error!(
            user_id = user_id,
            error = %err,
            recoverable = err.is_recoverable(),
            "Conversation failed"
        ),
    }
}

/// Log a session being recycled after its script finished or was reset
pub fn log_session_recycled(user_id: UserId, instance: Option<Uuid>, discarded: usize, reason: &str) {
    if discarded > 0 {
        warn!(
            user_id = user_id,
            instance = ?instance,
            discarded = discarded,
            reason = reason,
            "Session recycled with undelivered messages"
        );
    } else {
        debug!(user_id = user_id, instance = ?instance, reason = reason, "Session recycled");
    }
}
