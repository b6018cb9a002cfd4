mod newznab;
mod search;
mod torznab;
mod types;

pub use newznab::NewznabIndexer;
pub use search::{search_all, SearchOutcome};
pub use torznab::TorznabIndexer;
pub use types::{CandidateRelease, Indexer, IndexerError, ReleaseProtocol, SearchCategory};

use crate::config::{IndexerConfig, IndexerKind};
use std::sync::Arc;

/// Builds indexer adapters for every enabled config entry.
pub fn build_indexers(configs: &[IndexerConfig]) -> Result<Vec<Arc<dyn Indexer>>, IndexerError> {
    let mut indexers: Vec<Arc<dyn Indexer>> = Vec::new();
    for config in configs.iter().filter(|c| c.enabled) {
        match config.kind {
            IndexerKind::Torznab => indexers.push(Arc::new(TorznabIndexer::new(config)?)),
            IndexerKind::Newznab => indexers.push(Arc::new(NewznabIndexer::new(config)?)),
        }
    }
    Ok(indexers)
}
