use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One import attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportHistory {
    pub id: i64,
    pub download_id: i64,
    pub media_id: i64,
    pub source_path: String,
    /// Empty when the import failed before a destination was chosen.
    pub dest_path: String,
    pub success: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("media item not found: {0}")]
    MediaNotFound(i64),

    #[error("download has no payload path")]
    MissingPath,

    #[error("no video file found under {0}")]
    NoVideoFile(String),

    #[error("destination already exists: {0}")]
    DestinationExists(String),

    #[error("naming template error: {0}")]
    Template(String),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Library(#[from] crate::library::LibraryError),

    #[error(transparent)]
    Preset(#[from] crate::quality::PresetError),

    #[error(transparent)]
    Download(#[from] crate::download::DownloadStoreError),

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for ImportError {
    fn from(e: rusqlite::Error) -> Self {
        ImportError::Database(e.to_string())
    }
}
