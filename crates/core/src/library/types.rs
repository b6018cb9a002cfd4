use crate::quality::{MediaType, QualityAttrs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked media item. Library scanning and metadata live outside
/// the engine; this row is what the acquisition pipeline works from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub media_type: MediaType,
    pub library_id: i64,
    /// Unmonitored items are never searched automatically.
    pub monitored: bool,
    pub added_at: DateTime<Utc>,
}

/// Fields settable when registering a media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSpec {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub media_type: MediaType,
    pub library_id: i64,
    #[serde(default = "default_monitored")]
    pub monitored: bool,
}

fn default_monitored() -> bool {
    true
}

/// Current on-disk quality of a media item, recomputed on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaQualityStatus {
    pub media_id: i64,
    /// `None` until something has been imported.
    pub attrs: Option<QualityAttrs>,
    /// Whether the imported file satisfies the effective preset.
    pub target_met: bool,
    pub upgrade_available: bool,
    pub last_search_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Per-item overrides of the default preset and monitoring flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaQualityOverride {
    pub media_id: i64,
    pub preset_id: Option<i64>,
    pub monitored: Option<bool>,
}
