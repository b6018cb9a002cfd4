use super::types::{ClientError, DownloadClient, JobState, JobStatus};
use crate::config::DownloadClientConfig;
use crate::indexer::{CandidateRelease, ReleaseProtocol};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

static INFOHASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)xt=urn:btih:([0-9a-f]{40}|[a-z2-7]{32})").unwrap());

/// qBittorrent WebUI adapter. Jobs are identified by info hash.
pub struct QbittorrentClient {
    id: String,
    priority: u8,
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
    logged_in: Mutex<bool>,
}

impl QbittorrentClient {
    pub fn new(config: &DownloadClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()?;
        Ok(Self {
            id: config.id.clone(),
            priority: config.priority,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone().unwrap_or_default(),
            password: config.password.clone().unwrap_or_default(),
            client,
            logged_in: Mutex::new(false),
        })
    }

    /// Logs in via the WebUI form endpoint. qBittorrent answers with
    /// body "Ok." on success and "Fails." on bad credentials.
    async fn login(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .post(format!("{}/api/v2/auth/login", self.base_url))
            .form(&[("username", &self.username), ("password", &self.password)])
            .send()
            .await?;
        let body = response.text().await?;
        if body.trim() != "Ok." {
            return Err(ClientError::Auth);
        }
        *self.logged_in.lock().await = true;
        debug!(client = %self.id, "qbittorrent session established");
        Ok(())
    }

    async fn ensure_login(&self) -> Result<(), ClientError> {
        if !*self.logged_in.lock().await {
            self.login().await?;
        }
        Ok(())
    }

    /// Sends a request; retries once after re-login on 403, since
    /// qBittorrent expires sessions silently.
    async fn send_authed(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        self.ensure_login().await?;
        let response = build().send().await?;
        if response.status().as_u16() == 403 {
            *self.logged_in.lock().await = false;
            self.login().await?;
            let retried = build().send().await?;
            return Ok(retried);
        }
        Ok(response)
    }
}

fn extract_info_hash(url: &str) -> Option<String> {
    INFOHASH_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

fn map_state(state: &str) -> JobState {
    match state {
        "uploading" | "stalledUP" | "pausedUP" | "queuedUP" | "forcedUP" | "checkingUP" => {
            JobState::Completed
        }
        "error" | "missingFiles" => JobState::Error,
        "queuedDL" | "allocating" | "metaDL" => JobState::Queued,
        _ => JobState::Downloading,
    }
}

#[async_trait]
impl DownloadClient for QbittorrentClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn protocol(&self) -> ReleaseProtocol {
        ReleaseProtocol::Torrent
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    async fn healthy(&self) -> bool {
        let result = self
            .send_authed(|| {
                self.client
                    .get(format!("{}/api/v2/app/version", self.base_url))
            })
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(client = %self.id, error = %e, "qbittorrent health check failed");
                false
            }
        }
    }

    async fn submit(&self, release: &CandidateRelease) -> Result<String, ClientError> {
        let hash = extract_info_hash(&release.download_url).ok_or_else(|| {
            ClientError::Submit("download url carries no info hash".to_string())
        })?;

        let response = self
            .send_authed(|| {
                self.client
                    .post(format!("{}/api/v2/torrents/add", self.base_url))
                    .form(&[
                        ("urls", release.download_url.as_str()),
                        ("category", "fetcharr"),
                    ])
            })
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        debug!(client = %self.id, %hash, title = %release.title, "torrent submitted");
        Ok(hash)
    }

    async fn poll(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        let response = self
            .send_authed(|| {
                self.client.get(format!(
                    "{}/api/v2/torrents/info?hashes={job_id}",
                    self.base_url
                ))
            })
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        let torrents: Vec<TorrentInfo> = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        let torrent = torrents
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::JobNotFound(job_id.to_string()))?;

        let state = map_state(&torrent.state);
        Ok(JobStatus {
            state,
            progress: torrent.progress * 100.0,
            path: torrent.content_path,
            error: (state == JobState::Error).then(|| format!("state {}", torrent.state)),
        })
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ClientError> {
        let response = self
            .send_authed(|| {
                self.client
                    .post(format!("{}/api/v2/torrents/delete", self.base_url))
                    .form(&[("hashes", job_id), ("deleteFiles", "true")])
            })
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[derive(Debug, serde::Deserialize)]
struct TorrentInfo {
    state: String,
    /// Fraction, 0.0 to 1.0.
    progress: f64,
    content_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_info_hash_from_magnet() {
        let magnet = "magnet:?xt=urn:btih:C12FE1C06BBA254A9DC9F519B335AA7C1367A88A&dn=x";
        assert_eq!(
            extract_info_hash(magnet).as_deref(),
            Some("c12fe1c06bba254a9dc9f519b335aa7c1367a88a")
        );
        assert!(extract_info_hash("http://tracker/dl/123.torrent").is_none());
    }

    #[test]
    fn test_map_state() {
        assert_eq!(map_state("downloading"), JobState::Downloading);
        assert_eq!(map_state("stalledDL"), JobState::Downloading);
        assert_eq!(map_state("uploading"), JobState::Completed);
        assert_eq!(map_state("pausedUP"), JobState::Completed);
        assert_eq!(map_state("error"), JobState::Error);
        assert_eq!(map_state("queuedDL"), JobState::Queued);
    }

    #[test]
    fn test_parse_torrent_info() {
        let json = r#"[{
            "state": "uploading",
            "progress": 1.0,
            "content_path": "/downloads/Some.Show.S01E01"
        }]"#;
        let torrents: Vec<TorrentInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(torrents[0].state, "uploading");
        assert_eq!(torrents[0].progress, 1.0);
    }
}
