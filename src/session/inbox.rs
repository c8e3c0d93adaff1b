//! Per-user inbound message queue
//!
//! Messages are queued in arrival order and only ever taken from the head.
//! The inbox also tracks whether the next message has to start a fresh
//! script instance: that message primes the instance and is not queued.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use serde_json::Value;

/// What happened to a delivered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The message will start a new script instance
    Priming,
    /// The message was queued at this depth (1 = head)
    Queued { depth: usize },
}

#[derive(Debug)]
enum Restart {
    /// No live instance; the next message primes one
    Pending,
    /// A priming message is waiting for the next drive
    Primed(Value),
    Running,
}

#[derive(Debug)]
struct InboxState {
    queue: VecDeque<Value>,
    restart: Restart,
}

/// FIFO of messages not yet consumed by the script
#[derive(Debug)]
pub struct Inbox {
    state: Mutex<InboxState>,
}

impl Inbox {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InboxState {
                queue: VecDeque::new(),
                restart: Restart::Pending,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept an inbound message
    pub fn deliver(&self, message: Value) -> Delivery {
        let mut state = self.state();
        match state.restart {
            Restart::Pending => {
                state.restart = Restart::Primed(message);
                Delivery::Priming
            }
            // A second message before the instance started belongs to it.
            Restart::Primed(_) | Restart::Running => {
                state.queue.push_back(message);
                Delivery::Queued { depth: state.queue.len() }
            }
        }
    }

    /// Take the message that should start a new instance, if any
    pub fn take_priming(&self) -> Option<Value> {
        let mut state = self.state();
        match std::mem::replace(&mut state.restart, Restart::Running) {
            Restart::Primed(message) => Some(message),
            other => {
                state.restart = other;
                None
            }
        }
    }

    /// Whether a priming message is waiting
    pub fn is_primed(&self) -> bool {
        matches!(self.state().restart, Restart::Primed(_))
    }

    /// Take the oldest queued message
    pub fn pop(&self) -> Option<Value> {
        self.state().queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().queue.is_empty()
    }

    /// Drop all queued messages and make the next delivery prime a new
    /// instance. Returns how many messages were discarded.
    pub fn recycle(&self) -> usize {
        let mut state = self.state();
        let discarded = state.queue.len();
        state.queue.clear();
        state.restart = Restart::Pending;
        discarded
    }

    /// Make the oldest queued message prime a new instance, keeping the rest
    /// queued behind it. With nothing queued the next delivery primes.
    pub fn rearm(&self) {
        let mut state = self.state();
        state.restart = match state.queue.pop_front() {
            Some(message) => Restart::Primed(message),
            None => Restart::Pending,
        };
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_message_primes() {
        let inbox = Inbox::new();
        assert_eq!(inbox.deliver(json!("hey")), Delivery::Priming);
        assert_eq!(inbox.deliver(json!("in1")), Delivery::Queued { depth: 1 });
        assert!(inbox.is_primed());

        assert_eq!(inbox.take_priming(), Some(json!("hey")));
        assert_eq!(inbox.take_priming(), None);
        assert_eq!(inbox.deliver(json!("in2")), Delivery::Queued { depth: 2 });
    }

    #[test]
    fn test_fifo_order() {
        let inbox = Inbox::new();
        inbox.deliver(json!("prime"));
        inbox.take_priming();
        for i in 0..5 {
            inbox.deliver(json!(i));
        }
        let drained: Vec<Value> = std::iter::from_fn(|| inbox.pop()).collect();
        assert_eq!(drained, (0..5).map(|i| json!(i)).collect::<Vec<_>>());
        assert!(inbox.is_empty());
    }

    #[test]
    fn test_recycle_discards_and_rearms() {
        let inbox = Inbox::new();
        inbox.deliver(json!("prime"));
        inbox.take_priming();
        inbox.deliver(json!("late1"));
        inbox.deliver(json!("late2"));

        assert_eq!(inbox.recycle(), 2);
        assert!(inbox.is_empty());
        assert_eq!(inbox.deliver(json!("hey")), Delivery::Priming);
    }

    #[test]
    fn test_rearm_keeps_queued_messages() {
        let inbox = Inbox::new();
        inbox.deliver(json!("prime"));
        inbox.take_priming();
        inbox.rearm();
        assert_eq!(inbox.deliver(json!("again")), Delivery::Priming);

        inbox.take_priming();
        inbox.deliver(json!("in1"));
        inbox.deliver(json!("in2"));
        inbox.rearm();
        assert!(inbox.is_primed());
        assert_eq!(inbox.take_priming(), Some(json!("in1")));
        assert_eq!(inbox.pop(), Some(json!("in2")));
    }
}
