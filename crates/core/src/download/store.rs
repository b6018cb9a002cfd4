use super::types::{Download, DownloadStatus, GrabHistory, GrabStatus, NewDownload};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadStoreError {
    #[error("download not found: {0}")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for DownloadStoreError {
    fn from(e: rusqlite::Error) -> Self {
        DownloadStoreError::Database(e.to_string())
    }
}

/// Storage for downloads and grab history.
pub trait DownloadStore: Send + Sync {
    fn create_download(&self, new: &NewDownload) -> Result<Download, DownloadStoreError>;

    fn get_download(&self, id: i64) -> Result<Option<Download>, DownloadStoreError>;

    fn list_downloads(
        &self,
        status_type: Option<&str>,
    ) -> Result<Vec<Download>, DownloadStoreError>;

    /// Downloads in a non-terminal state.
    fn active_downloads(&self) -> Result<Vec<Download>, DownloadStoreError>;

    /// Whether a non-terminal download exists for the media item. The
    /// engine uses this to suppress duplicate grabs.
    fn has_active_for_media(&self, media_id: i64) -> Result<bool, DownloadStoreError>;

    /// Non-terminal downloads for the media item. The engine inspects
    /// these when weighing an upgrade against what is in flight.
    fn active_for_media(&self, media_id: i64) -> Result<Vec<Download>, DownloadStoreError>;

    /// Writes progress; bumps `last_progress_at` only when progress
    /// actually moved forward.
    fn update_progress(&self, id: i64, progress: f64) -> Result<(), DownloadStoreError>;

    fn set_download_path(&self, id: i64, path: &str) -> Result<(), DownloadStoreError>;

    fn transition(&self, id: i64, status: &DownloadStatus) -> Result<(), DownloadStoreError>;

    fn mark_stalled_notified(&self, id: i64) -> Result<(), DownloadStoreError>;

    /// Number of failed downloads ever recorded for the media item,
    /// counted across grabs. Drives permanent blocklisting once a
    /// media item keeps failing.
    fn failed_count_for_media(&self, media_id: i64) -> Result<u32, DownloadStoreError>;

    /// Active downloads with no progress for at least `timeout_secs`.
    fn list_stalled(
        &self,
        now: DateTime<Utc>,
        timeout_secs: u64,
    ) -> Result<Vec<Download>, DownloadStoreError>;

    fn add_grab(
        &self,
        media_id: i64,
        download_id: Option<i64>,
        release_title: &str,
        indexer_id: &str,
        score: i64,
        size_bytes: u64,
    ) -> Result<GrabHistory, DownloadStoreError>;

    fn set_grab_status(
        &self,
        download_id: i64,
        status: GrabStatus,
    ) -> Result<(), DownloadStoreError>;

    fn grabs_for_media(&self, media_id: i64) -> Result<Vec<GrabHistory>, DownloadStoreError>;
}
