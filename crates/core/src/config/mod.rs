mod loader;
mod types;
mod validate;

pub use loader::load_config;
pub use types::{
    AcquisitionConfig, Config, DatabaseConfig, DownloadClientConfig, DownloadClientKind,
    ImportConfig, IndexerConfig, IndexerKind, SanitizedConfig, SchedulerConfig, ServerConfig,
};
pub use validate::validate;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse config: {0}")]
    Parse(#[from] figment::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
