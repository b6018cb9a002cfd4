use crate::quality::QualityAttrs;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery protocol of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseProtocol {
    Torrent,
    Usenet,
}

impl ReleaseProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseProtocol::Torrent => "torrent",
            ReleaseProtocol::Usenet => "usenet",
        }
    }
}

/// Search category forwarded to indexers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchCategory {
    Movies,
    Tv,
    Anime,
}

/// A release found by an indexer, carrying everything the scorer and
/// the grab engine need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRelease {
    pub title: String,
    pub size_bytes: u64,
    /// `None` for usenet releases, where seeders do not apply.
    pub seeders: Option<u32>,
    pub protocol: ReleaseProtocol,
    pub indexer_id: String,
    pub indexer_priority: u8,
    pub download_url: String,
    pub publish_date: Option<DateTime<Utc>>,
    pub attrs: QualityAttrs,
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("indexer request failed: {0}")]
    Request(String),

    #[error("indexer returned status {0}")]
    Status(u16),

    #[error("failed to parse indexer response: {0}")]
    Parse(String),

    #[error("indexer search timed out after {0}s")]
    Timeout(u64),
}

impl From<reqwest::Error> for IndexerError {
    fn from(e: reqwest::Error) -> Self {
        IndexerError::Request(e.to_string())
    }
}

/// A searchable release source.
#[async_trait]
pub trait Indexer: Send + Sync {
    fn id(&self) -> &str;

    fn priority(&self) -> u8;

    fn protocol(&self) -> ReleaseProtocol;

    async fn search(
        &self,
        query: &str,
        categories: &[SearchCategory],
    ) -> Result<Vec<CandidateRelease>, IndexerError>;
}
