use super::types::{BlockedGroup, BlocklistEntry, BlocklistSpec, Exclusion, ExclusionScope, TrustedGroup};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("not found: {0}")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for TrustError {
    fn from(e: rusqlite::Error) -> Self {
        TrustError::Database(e.to_string())
    }
}

/// Storage for the blocklist, group trust lists and exclusions.
pub trait TrustStore: Send + Sync {
    fn add_blocklist_entry(&self, spec: &BlocklistSpec) -> Result<BlocklistEntry, TrustError>;

    fn remove_blocklist_entry(&self, id: i64) -> Result<(), TrustError>;

    fn list_blocklist(&self) -> Result<Vec<BlocklistEntry>, TrustError>;

    /// Whether an unexpired entry matches the normalized title, scoped
    /// to the given indexer/media when the entry carries a scope.
    fn is_blocklisted(
        &self,
        normalized_title: &str,
        indexer_id: &str,
        media_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, TrustError>;

    /// Deletes expired entries, returning how many were removed.
    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, TrustError>;

    fn block_group(&self, name: &str, auto: bool) -> Result<BlockedGroup, TrustError>;

    fn unblock_group(&self, name: &str) -> Result<(), TrustError>;

    fn list_blocked_groups(&self) -> Result<Vec<BlockedGroup>, TrustError>;

    fn is_group_blocked(&self, name: &str) -> Result<bool, TrustError>;

    /// Bumps the failure counter for a group, creating the row if
    /// needed, and returns the new count. Counting alone does not
    /// block the group.
    fn record_group_failure(&self, name: &str) -> Result<u32, TrustError>;

    fn trust_group(&self, name: &str) -> Result<TrustedGroup, TrustError>;

    fn untrust_group(&self, name: &str) -> Result<(), TrustError>;

    fn list_trusted_groups(&self) -> Result<Vec<TrustedGroup>, TrustError>;

    fn is_group_trusted(&self, name: &str) -> Result<bool, TrustError>;

    fn add_exclusion(&self, scope: &ExclusionScope) -> Result<Exclusion, TrustError>;

    fn remove_exclusion(&self, id: i64) -> Result<(), TrustError>;

    fn list_exclusions(&self) -> Result<Vec<Exclusion>, TrustError>;

    fn is_excluded(
        &self,
        media_id: i64,
        indexer_id: &str,
        library_id: i64,
    ) -> Result<bool, TrustError>;
}
