use crate::indexer::ReleaseProtocol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked download.
///
/// ```text
/// Downloading -> Completed -> Importing -> Imported
///      |              |           |
///      v              v           v
///  Failed or      Unmatched    Failed
///  Superseded
/// ```
/// `Imported`, `Failed` and `Superseded` are terminal. `Unmatched`
/// waits for manual resolution and is never retried automatically.
/// `Superseded` marks a download cancelled in favour of a better
/// release; unlike `Failed` it carries no blame and never feeds the
/// blocklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadStatus {
    Downloading,
    Completed,
    Importing,
    Imported { path: String },
    Failed { error: String },
    Superseded,
    Unmatched,
}

impl DownloadStatus {
    pub fn status_type(&self) -> &'static str {
        match self {
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Importing => "importing",
            DownloadStatus::Imported { .. } => "imported",
            DownloadStatus::Failed { .. } => "failed",
            DownloadStatus::Superseded => "superseded",
            DownloadStatus::Unmatched => "unmatched",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadStatus::Imported { .. }
                | DownloadStatus::Failed { .. }
                | DownloadStatus::Superseded
        )
    }
}

/// A download being tracked against a remote client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Download {
    pub id: i64,
    /// `None` for payloads that could not be matched to a media item.
    pub media_id: Option<i64>,
    pub client_id: String,
    pub external_job_id: String,
    pub release_title: String,
    pub indexer_id: String,
    pub protocol: ReleaseProtocol,
    pub status: DownloadStatus,
    /// 0.0 to 100.0.
    pub progress: f64,
    /// Payload path reported by the client on completion.
    pub download_path: Option<String>,
    pub score: i64,
    /// Set once the stall warning has been logged, so it fires once.
    pub stalled_notified: bool,
    pub grabbed_at: DateTime<Utc>,
    /// Last time progress moved forward. Stall detection compares
    /// against this.
    pub last_progress_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Download {
    pub fn is_stalled(&self, now: DateTime<Utc>, timeout_secs: u64) -> bool {
        self.status == DownloadStatus::Downloading
            && (now - self.last_progress_at).num_seconds() >= timeout_secs as i64
    }
}

/// Fields settable when registering a new download.
#[derive(Debug, Clone)]
pub struct NewDownload {
    pub media_id: Option<i64>,
    pub client_id: String,
    pub external_job_id: String,
    pub release_title: String,
    pub indexer_id: String,
    pub protocol: ReleaseProtocol,
    pub score: i64,
}

/// Terminal-ish summary of a grab, kept for history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrabStatus {
    Grabbed,
    Imported,
    Failed,
    Superseded,
}

impl GrabStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrabStatus::Grabbed => "grabbed",
            GrabStatus::Imported => "imported",
            GrabStatus::Failed => "failed",
            GrabStatus::Superseded => "superseded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "grabbed" => Some(GrabStatus::Grabbed),
            "imported" => Some(GrabStatus::Imported),
            "failed" => Some(GrabStatus::Failed),
            "superseded" => Some(GrabStatus::Superseded),
            _ => None,
        }
    }
}

/// One grab decision and its eventual outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrabHistory {
    pub id: i64,
    pub media_id: i64,
    pub download_id: Option<i64>,
    pub release_title: String,
    pub indexer_id: String,
    pub score: i64,
    pub size_bytes: u64,
    pub status: GrabStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
