use super::types::{CandidateRelease, Indexer, IndexerError, SearchCategory};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a fan-out search across all configured indexers.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub candidates: Vec<CandidateRelease>,
    /// Per-indexer failure messages. A failing indexer never fails the
    /// whole pass.
    pub errors: HashMap<String, String>,
}

/// Searches every indexer concurrently, bounding each with `timeout`.
pub async fn search_all(
    indexers: &[Arc<dyn Indexer>],
    query: &str,
    categories: &[SearchCategory],
    timeout: Duration,
) -> SearchOutcome {
    let searches = indexers.iter().map(|indexer| {
        let indexer = Arc::clone(indexer);
        let query = query.to_string();
        let categories = categories.to_vec();
        async move {
            let result = tokio::time::timeout(timeout, indexer.search(&query, &categories))
                .await
                .unwrap_or(Err(IndexerError::Timeout(timeout.as_secs())));
            (indexer.id().to_string(), result)
        }
    });

    let mut outcome = SearchOutcome::default();
    for (indexer_id, result) in join_all(searches).await {
        match result {
            Ok(candidates) => {
                debug!(indexer = %indexer_id, count = candidates.len(), "indexer search done");
                outcome.candidates.extend(candidates);
            }
            Err(e) => {
                warn!(indexer = %indexer_id, error = %e, "indexer search failed");
                outcome.errors.insert(indexer_id, e.to_string());
            }
        }
    }
    outcome
}
