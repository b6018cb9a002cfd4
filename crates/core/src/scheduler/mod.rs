//! Periodic task loops and manual triggering.

mod runner;
mod types;

pub use runner::Scheduler;
pub use types::{TaskKind, TaskStatus};
