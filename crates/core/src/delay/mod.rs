mod gate;
mod sqlite;
mod store;
mod types;

pub use gate::evaluate;
pub use sqlite::SqliteDelayStore;
pub use store::{DelayError, DelayStore};
pub use types::{
    BypassConditions, DelayDecision, DelayProfile, DelayProfileSpec, PendingGrab, PendingOutcome,
};
