use super::types::DownloadClient;
use crate::indexer::ReleaseProtocol;
use std::sync::Arc;
use tracing::debug;

/// Picks the first healthy client matching the protocol, in priority
/// order (lowest number first).
pub async fn select_client(
    clients: &[Arc<dyn DownloadClient>],
    protocol: ReleaseProtocol,
) -> Option<Arc<dyn DownloadClient>> {
    let mut matching: Vec<_> = clients
        .iter()
        .filter(|c| c.protocol() == protocol)
        .collect();
    matching.sort_by_key(|c| c.priority());

    for client in matching {
        if client.healthy().await {
            return Some(Arc::clone(client));
        }
        debug!(client = %client.id(), "client unhealthy, trying next");
    }
    None
}
