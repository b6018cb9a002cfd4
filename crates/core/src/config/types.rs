use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub indexers: Vec<IndexerConfig>,
    #[serde(default)]
    pub download_clients: Vec<DownloadClientConfig>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    pub import: ImportConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8686
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("fetcharr.db")
}

/// Indexer protocol variant.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexerKind {
    /// Torrent indexer behind a Jackett-style aggregator.
    Torznab,
    /// Usenet indexer speaking the newznab JSON API.
    Newznab,
}

/// A single configured indexer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerConfig {
    /// Unique indexer id, used for blocklist and exclusion scoping.
    pub id: String,
    pub kind: IndexerKind,
    /// Base URL of the indexer API.
    pub url: String,
    pub api_key: String,
    /// Lower number wins ties between equally scored candidates.
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Download client protocol variant.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DownloadClientKind {
    Qbittorrent,
    Sabnzbd,
}

/// A single configured download client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadClientConfig {
    /// Unique client id, recorded on every download row.
    pub id: String,
    pub kind: DownloadClientKind,
    /// Base URL of the client API.
    pub url: String,
    /// Credentials for clients with session auth (qBittorrent).
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// API key for clients with key auth (SABnzbd).
    #[serde(default)]
    pub api_key: Option<String>,
    /// First healthy enabled client in priority order receives grabs.
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Scheduler task intervals.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_search_interval")]
    pub search_interval_secs: u64,
    #[serde(default = "default_upgrade_interval")]
    pub upgrade_search_interval_secs: u64,
    #[serde(default = "default_promotion_interval")]
    pub pending_promotion_interval_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub download_poll_interval_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub stalled_sweep_interval_secs: u64,
    #[serde(default = "default_expiry_interval")]
    pub blocklist_expiry_interval_secs: u64,
}

fn default_search_interval() -> u64 {
    1800 // 30 minutes
}

fn default_upgrade_interval() -> u64 {
    21600 // 6 hours
}

fn default_promotion_interval() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    120
}

fn default_expiry_interval() -> u64 {
    3600
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            search_interval_secs: default_search_interval(),
            upgrade_search_interval_secs: default_upgrade_interval(),
            pending_promotion_interval_secs: default_promotion_interval(),
            download_poll_interval_secs: default_poll_interval(),
            stalled_sweep_interval_secs: default_sweep_interval(),
            blocklist_expiry_interval_secs: default_expiry_interval(),
        }
    }
}

/// Tunables for the grab decision engine and lifecycle tracker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    /// Downloads failing fewer times than this are retried automatically.
    #[serde(default = "default_retry_threshold")]
    pub retry_threshold: u32,
    /// A download with no progress increase for this long is failed.
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_secs: u64,
    /// A release group with this many recorded failures is auto-blocked.
    #[serde(default = "default_group_failure_threshold")]
    pub group_failure_threshold: u32,
    /// TTL for blocklist entries created on download failure.
    #[serde(default = "default_blocklist_ttl")]
    pub failure_blocklist_ttl_hours: u32,
    /// Minimum hours between automatic searches for the same item.
    #[serde(default = "default_search_backoff")]
    pub search_backoff_hours: u32,
    /// Per-indexer search timeout during a decision pass.
    #[serde(default = "default_indexer_timeout")]
    pub indexer_timeout_secs: u64,
}

fn default_retry_threshold() -> u32 {
    3
}

fn default_stall_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_group_failure_threshold() -> u32 {
    5
}

fn default_blocklist_ttl() -> u32 {
    24
}

fn default_search_backoff() -> u32 {
    12
}

fn default_indexer_timeout() -> u64 {
    60
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            retry_threshold: default_retry_threshold(),
            stall_timeout_secs: default_stall_timeout(),
            group_failure_threshold: default_group_failure_threshold(),
            failure_blocklist_ttl_hours: default_blocklist_ttl(),
            search_backoff_hours: default_search_backoff(),
            indexer_timeout_secs: default_indexer_timeout(),
        }
    }
}

/// Import destinations and naming templates.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Root directory for imported movies.
    pub movie_dir: PathBuf,
    /// Root directory for imported series (TV and anime).
    pub tv_dir: PathBuf,
    #[serde(default = "default_movie_template")]
    pub movie_template: String,
    #[serde(default = "default_tv_template")]
    pub tv_template: String,
    #[serde(default = "default_daily_template")]
    pub daily_template: String,
}

fn default_movie_template() -> String {
    "{title} ({year})/{title} ({year}) {quality}".to_string()
}

fn default_tv_template() -> String {
    "{title}/Season {season:02}/{title} S{season:02}E{episode:02} {quality}".to_string()
}

fn default_daily_template() -> String {
    "{title}/{title} {air_date} {quality}".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub indexers: Vec<SanitizedIndexerConfig>,
    pub download_clients: Vec<SanitizedClientConfig>,
    pub scheduler: SchedulerConfig,
    pub acquisition: AcquisitionConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIndexerConfig {
    pub id: String,
    pub kind: IndexerKind,
    pub url: String,
    pub api_key_configured: bool,
    pub priority: u8,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedClientConfig {
    pub id: String,
    pub kind: DownloadClientKind,
    pub url: String,
    pub credentials_configured: bool,
    pub priority: u8,
    pub enabled: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            indexers: config
                .indexers
                .iter()
                .map(|i| SanitizedIndexerConfig {
                    id: i.id.clone(),
                    kind: i.kind,
                    url: i.url.clone(),
                    api_key_configured: !i.api_key.is_empty(),
                    priority: i.priority,
                    enabled: i.enabled,
                })
                .collect(),
            download_clients: config
                .download_clients
                .iter()
                .map(|c| SanitizedClientConfig {
                    id: c.id.clone(),
                    kind: c.kind,
                    url: c.url.clone(),
                    credentials_configured: c.api_key.is_some() || c.username.is_some(),
                    priority: c.priority,
                    enabled: c.enabled,
                })
                .collect(),
            scheduler: config.scheduler.clone(),
            acquisition: config.acquisition.clone(),
        }
    }
}

fn default_priority() -> u8 {
    25
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[import]
movie_dir = "/media/movies"
tv_dir = "/media/tv"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8686);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "fetcharr.db");
        assert!(config.indexers.is_empty());
        assert_eq!(config.acquisition.retry_threshold, 3);
    }

    #[test]
    fn test_deserialize_missing_import_fails() {
        let toml = r#"
[server]
port = 8686
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_indexers() {
        let toml = r#"
[import]
movie_dir = "/media/movies"
tv_dir = "/media/tv"

[[indexers]]
id = "rarbg"
kind = "torznab"
url = "http://localhost:9117/api/v2.0/indexers/rarbg"
api_key = "secret"
priority = 10

[[indexers]]
id = "nzbgeek"
kind = "newznab"
url = "https://api.nzbgeek.info"
api_key = "secret2"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.indexers.len(), 2);
        assert_eq!(config.indexers[0].kind, IndexerKind::Torznab);
        assert_eq!(config.indexers[0].priority, 10);
        assert_eq!(config.indexers[1].kind, IndexerKind::Newznab);
        assert_eq!(config.indexers[1].priority, 25);
        assert!(config.indexers[1].enabled);
    }

    #[test]
    fn test_deserialize_download_clients() {
        let toml = r#"
[import]
movie_dir = "/media/movies"
tv_dir = "/media/tv"

[[download_clients]]
id = "qbt"
kind = "qbittorrent"
url = "http://localhost:8080"
username = "admin"
password = "adminadmin"
priority = 1

[[download_clients]]
id = "sab"
kind = "sabnzbd"
url = "http://localhost:8085"
api_key = "sabkey"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.download_clients.len(), 2);
        assert_eq!(
            config.download_clients[0].kind,
            DownloadClientKind::Qbittorrent
        );
        assert_eq!(config.download_clients[1].kind, DownloadClientKind::Sabnzbd);
        assert_eq!(
            config.download_clients[1].api_key.as_deref(),
            Some("sabkey")
        );
    }

    #[test]
    fn test_sanitized_config_redacts_secrets() {
        let toml = r#"
[import]
movie_dir = "/media/movies"
tv_dir = "/media/tv"

[[indexers]]
id = "idx"
kind = "torznab"
url = "http://localhost:9117"
api_key = "hunter2"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(sanitized.indexers[0].api_key_configured);
    }

    #[test]
    fn test_default_naming_templates() {
        let toml = r#"
[import]
movie_dir = "/media/movies"
tv_dir = "/media/tv"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.import.movie_template.contains("{title}"));
        assert!(config.import.tv_template.contains("{episode:02}"));
        assert!(config.import.daily_template.contains("{air_date}"));
    }
}
