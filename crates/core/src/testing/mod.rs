//! Scriptable fakes shared by unit and integration tests.

mod mock_download_client;
mod mock_indexer;

pub use mock_download_client::MockDownloadClient;
pub use mock_indexer::MockIndexer;
