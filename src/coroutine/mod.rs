//! Conversation coroutines
//!
//! This module holds the suspend/resume protocol between a conversation
//! script and the runtime: the signals a script yields, the context it talks
//! through, the task that runs it, and the driver that resumes it.

pub mod context;
pub mod driver;
pub mod script;
pub mod signal;

pub use context::Context;
pub use driver::{drive, DriveResult};
pub use script::{Conversation, Coroutine, SignalFuture, Yielded};
pub use signal::{Intent, Signal};
