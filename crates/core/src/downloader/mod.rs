mod qbittorrent;
mod sabnzbd;
mod select;
mod types;

pub use qbittorrent::QbittorrentClient;
pub use sabnzbd::SabnzbdClient;
pub use select::select_client;
pub use types::{ClientError, DownloadClient, JobState, JobStatus};

use crate::config::{DownloadClientConfig, DownloadClientKind};
use std::sync::Arc;

/// Builds client adapters for every enabled config entry.
pub fn build_clients(
    configs: &[DownloadClientConfig],
) -> Result<Vec<Arc<dyn DownloadClient>>, ClientError> {
    let mut clients: Vec<Arc<dyn DownloadClient>> = Vec::new();
    for config in configs.iter().filter(|c| c.enabled) {
        match config.kind {
            DownloadClientKind::Qbittorrent => {
                clients.push(Arc::new(QbittorrentClient::new(config)?))
            }
            DownloadClientKind::Sabnzbd => clients.push(Arc::new(SabnzbdClient::new(config)?)),
        }
    }
    Ok(clients)
}
