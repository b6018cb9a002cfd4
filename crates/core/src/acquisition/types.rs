use crate::delay::{DelayError, PendingOutcome};
use crate::download::DownloadStoreError;
use crate::downloader::ClientError;
use crate::library::LibraryError;
use crate::quality::PresetError;
use crate::trust::TrustError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// What the engine decided for one media item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Grabbed {
        download_id: i64,
        release_title: String,
        score: i64,
    },
    /// Held back by a delay profile.
    Deferred {
        release_title: String,
        score: i64,
        eligible_at: DateTime<Utc>,
        outcome: PendingOutcome,
    },
    NoCandidate {
        searched: usize,
        rejected: usize,
    },
    Skipped {
        reason: String,
    },
}

/// Totals from one scheduled pass over due media items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub searched: usize,
    pub grabbed: usize,
    pub deferred: usize,
    pub errors: usize,
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("no healthy {0} client available")]
    NoClient(String),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Preset(#[from] PresetError),

    #[error(transparent)]
    Trust(#[from] TrustError),

    #[error(transparent)]
    Delay(#[from] DelayError),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Download(#[from] DownloadStoreError),
}
