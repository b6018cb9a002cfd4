//! Import pipeline: moving completed payloads into the library with
//! configured naming, and the import history behind it.

mod fs;
mod naming;
mod pipeline;
mod store;
mod types;

pub use fs::{find_video_file, try_atomic_move};
pub use naming::{NamingTemplates, NamingTokens};
pub use pipeline::ImportPipeline;
pub use store::{ImportStore, SqliteImportStore};
pub use types::{ImportError, ImportHistory};
