use super::types::Config;
use super::validate::validate;
use super::ConfigError;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use std::path::Path;

/// Loads configuration from an optional TOML file, with `FETCHARR_`
/// environment variables layered on top (`FETCHARR_SERVER__PORT=9000`).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: Config = figment
        .merge(Env::prefixed("FETCHARR_").split("__"))
        .extract()?;

    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
[server]
port = 9000

[import]
movie_dir = "/media/movies"
tv_dir = "/media/tv"
"#,
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = load_config(Some(Path::new("/nonexistent/fetcharr.toml")));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_validation_runs_on_load() {
        let file = write_config(
            r#"
[import]
movie_dir = ""
tv_dir = "/media/tv"
"#,
        );
        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
