//! Per-user sessions and the scheduler that drives them

pub mod error_sink;
pub mod inbox;
pub mod reaper;
pub mod registry;
pub mod scheduler;
pub mod state;

pub use error_sink::{ErrorSink, LogErrorSink};
pub use inbox::{Delivery, Inbox};
pub use reaper::SessionReaper;
pub use registry::{RegistryStatistics, SessionRegistry};
pub use scheduler::{Outcome, Scheduler};
pub use state::{Park, Phase, Script, Session, SessionSnapshot};
