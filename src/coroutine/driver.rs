//! Coroutine driver
//!
//! Resumes a script, awaits whatever it yields, interprets the resulting
//! [`Signal`] and keeps going until the script parks, suspends, returns or
//! fails. The driver never runs two steps of one script at once; keeping two
//! drives of the same session apart is the scheduler's job.

use serde_json::Value;
use tracing::trace;

use crate::session::Inbox;
use crate::utils::errors::ConversationError;
use super::{Coroutine, Intent, Signal, Yielded};

/// How a drive ended
#[derive(Debug)]
pub enum DriveResult {
    /// The script asked to stop until the next external trigger
    Suspended { output: Value, await_input: bool },
    /// The script wants input and the queue is empty
    AwaitingInput,
    /// The script returned
    Completed,
    Failed(ConversationError),
}

impl DriveResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, DriveResult::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DriveResult::Failed(_))
    }
}

/// Drive `coroutine` starting from `entry`.
///
/// `entry` is interpreted exactly like a signal the script just produced, so
/// a parked script is re-entered with `Signal::await_input(..)` and a fresh
/// one is started with `Signal::plain(..)`. Suspending intents in `entry`
/// are ignored: the caller is the trigger that lifts a suspension.
pub async fn drive(coroutine: &mut Coroutine, inbox: &Inbox, entry: Signal) -> DriveResult {
    let (mut resume, entry_intent) = entry.into_parts();
    let mut await_input = entry_intent.awaits_input();

    loop {
        if await_input {
            match inbox.pop() {
                Some(message) => resume = message,
                None => return DriveResult::AwaitingInput,
            }
        }

        let yielded = match coroutine.resume(resume).await {
            Ok(Some(yielded)) => yielded,
            Ok(None) => return DriveResult::Completed,
            Err(e) => return DriveResult::Failed(e),
        };

        let signal = match yielded {
            Yielded::Awaitable(awaitable) => match awaitable.await {
                Ok(signal) => signal,
                Err(e) => return DriveResult::Failed(e),
            },
            Yielded::Plain(value) => {
                return DriveResult::Failed(ConversationError::ProtocolViolation(format!(
                    "conversation yielded a plain value instead of an awaitable: {}",
                    value
                )));
            }
        };

        let (value, intent) = signal.into_parts();
        trace!(user_id = coroutine.user(), instance = %coroutine.id(), intent = ?intent, "Script step resolved");

        match intent {
            Intent::Suspend => {
                return DriveResult::Suspended { output: value, await_input: false };
            }
            Intent::AwaitInputAndSuspend => {
                return DriveResult::Suspended { output: value, await_input: true };
            }
            Intent::AwaitInput => {
                resume = value;
                await_input = true;
            }
            Intent::Continue => {
                resume = value;
                await_input = false;
            }
        }
    }
}
