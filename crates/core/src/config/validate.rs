use super::types::Config;
use super::ConfigError;
use std::collections::HashSet;

/// Checks cross-field constraints that serde defaults cannot express.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.import.movie_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(
            "import.movie_dir must not be empty".to_string(),
        ));
    }
    if config.import.tv_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(
            "import.tv_dir must not be empty".to_string(),
        ));
    }

    for template in [
        &config.import.movie_template,
        &config.import.tv_template,
        &config.import.daily_template,
    ] {
        if !template.contains("{title}") {
            return Err(ConfigError::Invalid(format!(
                "naming template '{template}' must contain {{title}}"
            )));
        }
    }

    let mut indexer_ids = HashSet::new();
    for indexer in &config.indexers {
        if indexer.id.is_empty() {
            return Err(ConfigError::Invalid(
                "indexer id must not be empty".to_string(),
            ));
        }
        if !indexer_ids.insert(&indexer.id) {
            return Err(ConfigError::Invalid(format!(
                "duplicate indexer id '{}'",
                indexer.id
            )));
        }
        if indexer.url.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "indexer '{}' has an empty url",
                indexer.id
            )));
        }
    }

    let mut client_ids = HashSet::new();
    for client in &config.download_clients {
        if client.id.is_empty() {
            return Err(ConfigError::Invalid(
                "download client id must not be empty".to_string(),
            ));
        }
        if !client_ids.insert(&client.id) {
            return Err(ConfigError::Invalid(format!(
                "duplicate download client id '{}'",
                client.id
            )));
        }
        if client.url.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "download client '{}' has an empty url",
                client.id
            )));
        }
    }

    if config.acquisition.retry_threshold == 0 {
        return Err(ConfigError::Invalid(
            "acquisition.retry_threshold must be at least 1".to_string(),
        ));
    }
    if config.acquisition.stall_timeout_secs < 60 {
        return Err(ConfigError::Invalid(
            "acquisition.stall_timeout_secs must be at least 60".to_string(),
        ));
    }

    Ok(())
}
