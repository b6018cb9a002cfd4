use super::types::{DelayProfile, DelayProfileSpec, PendingGrab, PendingOutcome};
use crate::indexer::CandidateRelease;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DelayError {
    #[error("not found: {0}")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for DelayError {
    fn from(e: rusqlite::Error) -> Self {
        DelayError::Database(e.to_string())
    }
}

/// Storage for delay profiles and deferred grabs.
pub trait DelayStore: Send + Sync {
    fn create_profile(&self, spec: &DelayProfileSpec) -> Result<DelayProfile, DelayError>;

    fn update_profile(&self, id: i64, spec: &DelayProfileSpec)
        -> Result<DelayProfile, DelayError>;

    fn delete_profile(&self, id: i64) -> Result<(), DelayError>;

    fn list_profiles(&self) -> Result<Vec<DelayProfile>, DelayError>;

    /// The profile for a library: a library-scoped one wins over a
    /// global one.
    fn profile_for_library(&self, library_id: i64) -> Result<Option<DelayProfile>, DelayError>;

    /// Offers a deferred candidate. At most one pending grab exists per
    /// media item; a new offer only replaces the held one when it
    /// scores strictly higher, and replacement restarts the clock at
    /// the offered `eligible_at`.
    fn offer_pending(
        &self,
        media_id: i64,
        release: &CandidateRelease,
        score: i64,
        eligible_at: DateTime<Utc>,
    ) -> Result<PendingOutcome, DelayError>;

    fn list_pending(&self) -> Result<Vec<PendingGrab>, DelayError>;

    /// Pending grabs whose delay window has elapsed.
    fn ready_for_promotion(&self, now: DateTime<Utc>) -> Result<Vec<PendingGrab>, DelayError>;

    fn remove_pending(&self, id: i64) -> Result<(), DelayError>;

    fn remove_pending_for_media(&self, media_id: i64) -> Result<(), DelayError>;
}
