use super::types::{MediaItem, MediaQualityOverride, MediaQualityStatus, MediaSpec};
use crate::quality::QualityAttrs;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("media item not found: {0}")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for LibraryError {
    fn from(e: rusqlite::Error) -> Self {
        LibraryError::Database(e.to_string())
    }
}

/// Storage for media items, their quality status and overrides.
pub trait LibraryStore: Send + Sync {
    fn add_media(&self, spec: &MediaSpec) -> Result<MediaItem, LibraryError>;

    fn get_media(&self, id: i64) -> Result<Option<MediaItem>, LibraryError>;

    fn list_media(&self) -> Result<Vec<MediaItem>, LibraryError>;

    fn set_monitored(&self, id: i64, monitored: bool) -> Result<(), LibraryError>;

    /// Monitored items missing their quality target whose last search
    /// is older than the backoff (or that were never searched).
    fn due_for_search(
        &self,
        now: DateTime<Utc>,
        backoff_hours: u32,
    ) -> Result<Vec<MediaItem>, LibraryError>;

    /// Monitored items that met their target but may still upgrade.
    fn due_for_upgrade(
        &self,
        now: DateTime<Utc>,
        backoff_hours: u32,
    ) -> Result<Vec<MediaItem>, LibraryError>;

    fn get_status(&self, media_id: i64) -> Result<Option<MediaQualityStatus>, LibraryError>;

    /// Writes the post-import quality status for an item.
    fn upsert_status(
        &self,
        media_id: i64,
        attrs: Option<&QualityAttrs>,
        target_met: bool,
        upgrade_available: bool,
    ) -> Result<(), LibraryError>;

    fn set_last_searched(&self, media_id: i64, at: DateTime<Utc>) -> Result<(), LibraryError>;

    fn get_override(&self, media_id: i64)
        -> Result<Option<MediaQualityOverride>, LibraryError>;

    fn set_override(&self, ovr: &MediaQualityOverride) -> Result<(), LibraryError>;

    fn remove_override(&self, media_id: i64) -> Result<(), LibraryError>;
}
