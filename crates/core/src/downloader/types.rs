use crate::indexer::{CandidateRelease, ReleaseProtocol};
use async_trait::async_trait;
use thiserror::Error;

/// Coarse state of a job inside a download client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Downloading,
    Completed,
    Error,
}

/// A snapshot of one job, as reported by the client.
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub state: JobState,
    /// 0.0 to 100.0.
    pub progress: f64,
    /// Path of the completed payload, once the client knows it.
    pub path: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client request failed: {0}")]
    Request(String),

    #[error("client returned status {0}")]
    Status(u16),

    #[error("client authentication failed")]
    Auth,

    #[error("failed to parse client response: {0}")]
    Parse(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("cannot submit release: {0}")]
    Submit(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Request(e.to_string())
    }
}

/// A remote download client (torrent or usenet).
#[async_trait]
pub trait DownloadClient: Send + Sync {
    fn id(&self) -> &str;

    fn protocol(&self) -> ReleaseProtocol;

    fn priority(&self) -> u8;

    /// Cheap liveness probe used for client selection.
    async fn healthy(&self) -> bool;

    /// Submits a release and returns the client's job id.
    async fn submit(&self, release: &CandidateRelease) -> Result<String, ClientError>;

    async fn poll(&self, job_id: &str) -> Result<JobStatus, ClientError>;

    /// Removes the job and its data from the client.
    async fn cancel(&self, job_id: &str) -> Result<(), ClientError>;
}
