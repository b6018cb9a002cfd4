//! The grab decision engine: search, gate, score, delay, grab.

mod engine;
mod types;

pub use engine::GrabDecisionEngine;
pub use types::{AcquisitionError, Decision, PassSummary};
