//! Download lifecycle: persisted downloads and grab history, plus the
//! tracker that follows active jobs against their clients.

mod sqlite;
mod store;
mod tracker;
mod types;

pub use sqlite::SqliteDownloadStore;
pub use store::{DownloadStore, DownloadStoreError};
pub use tracker::DownloadTracker;
pub use types::{Download, DownloadStatus, GrabHistory, GrabStatus, NewDownload};
