use crate::indexer::{
    CandidateRelease, Indexer, IndexerError, ReleaseProtocol, SearchCategory,
};
use crate::quality::parse_release_title;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Scriptable indexer for tests. Setters take `&self` so the mock can
/// be shared through an `Arc` with the code under test.
pub struct MockIndexer {
    id: String,
    priority: u8,
    protocol: ReleaseProtocol,
    results: Mutex<Vec<CandidateRelease>>,
    error: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MockIndexer {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            priority: 25,
            protocol: ReleaseProtocol::Torrent,
            results: Mutex::new(Vec::new()),
            error: Mutex::new(None),
            delay: Mutex::new(None),
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_protocol(mut self, protocol: ReleaseProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn set_results(&self, results: Vec<CandidateRelease>) {
        *self.results.lock().unwrap() = results;
    }

    pub fn set_error(&self, message: &str) {
        *self.error.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// A plausible candidate whose attributes come from parsing `title`.
    pub fn candidate(title: &str, indexer_id: &str) -> CandidateRelease {
        CandidateRelease {
            title: title.to_string(),
            size_bytes: 2 * 1024 * 1024 * 1024,
            seeders: Some(50),
            protocol: ReleaseProtocol::Torrent,
            indexer_id: indexer_id.to_string(),
            indexer_priority: 25,
            download_url: format!("magnet:?xt=urn:btih:{:040x}&dn={title}", 0xfeed_u64),
            publish_date: None,
            attrs: parse_release_title(title),
        }
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn protocol(&self) -> ReleaseProtocol {
        self.protocol
    }

    async fn search(
        &self,
        _query: &str,
        _categories: &[SearchCategory],
    ) -> Result<Vec<CandidateRelease>, IndexerError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(IndexerError::Request(message));
        }
        Ok(self.results.lock().unwrap().clone())
    }
}
