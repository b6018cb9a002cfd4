mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteLibraryStore;
pub use store::{LibraryError, LibraryStore};
pub use types::{MediaItem, MediaQualityOverride, MediaQualityStatus, MediaSpec};
