use super::types::{ClientError, DownloadClient, JobState, JobStatus};
use crate::config::DownloadClientConfig;
use crate::indexer::{CandidateRelease, ReleaseProtocol};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// SABnzbd API adapter. Jobs are identified by nzo id; completed jobs
/// move from the queue to the history endpoint.
pub struct SabnzbdClient {
    id: String,
    priority: u8,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SabnzbdClient {
    pub fn new(config: &DownloadClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;
        Ok(Self {
            id: config.id.clone(),
            priority: config.priority,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            client,
        })
    }

    fn api_url(&self, mode: &str) -> String {
        format!(
            "{}/api?output=json&apikey={}&mode={mode}",
            self.base_url, self.api_key
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

#[async_trait]
impl DownloadClient for SabnzbdClient {
    fn id(&self) -> &str {
        &self.id
    }

    fn protocol(&self) -> ReleaseProtocol {
        ReleaseProtocol::Usenet
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    async fn healthy(&self) -> bool {
        match self.get_json::<VersionResponse>(&self.api_url("version")).await {
            Ok(_) => true,
            Err(e) => {
                warn!(client = %self.id, error = %e, "sabnzbd health check failed");
                false
            }
        }
    }

    async fn submit(&self, release: &CandidateRelease) -> Result<String, ClientError> {
        let url = format!(
            "{}&name={}&cat=fetcharr",
            self.api_url("addurl"),
            urlencoding::encode(&release.download_url)
        );
        let response: AddUrlResponse = self.get_json(&url).await?;
        if !response.status {
            return Err(ClientError::Submit("sabnzbd rejected the nzb url".to_string()));
        }
        let nzo_id = response
            .nzo_ids
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Submit("no nzo id returned".to_string()))?;
        debug!(client = %self.id, %nzo_id, title = %release.title, "nzb submitted");
        Ok(nzo_id)
    }

    async fn poll(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        // Active jobs sit in the queue.
        let queue: QueueResponse = self
            .get_json(&format!("{}&nzo_ids={job_id}", self.api_url("queue")))
            .await?;
        if let Some(slot) = queue.queue.slots.into_iter().find(|s| s.nzo_id == job_id) {
            let progress: f64 = slot.percentage.parse().unwrap_or(0.0);
            let state = match slot.status.as_str() {
                "Queued" | "Paused" => JobState::Queued,
                _ => JobState::Downloading,
            };
            return Ok(JobStatus {
                state,
                progress,
                path: None,
                error: None,
            });
        }

        // Finished jobs move to history.
        let history: HistoryResponse = self
            .get_json(&format!("{}&nzo_ids={job_id}", self.api_url("history")))
            .await?;
        let slot = history
            .history
            .slots
            .into_iter()
            .find(|s| s.nzo_id == job_id)
            .ok_or_else(|| ClientError::JobNotFound(job_id.to_string()))?;

        if slot.status == "Completed" {
            Ok(JobStatus {
                state: JobState::Completed,
                progress: 100.0,
                path: slot.storage,
                error: None,
            })
        } else {
            Ok(JobStatus {
                state: JobState::Error,
                progress: 0.0,
                path: None,
                error: Some(if slot.fail_message.is_empty() {
                    format!("status {}", slot.status)
                } else {
                    slot.fail_message
                }),
            })
        }
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ClientError> {
        let url = format!(
            "{}&name=delete&value={job_id}&del_files=1",
            self.api_url("queue")
        );
        let _: serde_json::Value = self.get_json(&url).await?;
        Ok(())
    }
}

#[derive(Debug, serde::Deserialize)]
struct VersionResponse {
    #[allow(dead_code)]
    version: String,
}

#[derive(Debug, serde::Deserialize)]
struct AddUrlResponse {
    status: bool,
    #[serde(default)]
    nzo_ids: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct QueueResponse {
    queue: QueueBody,
}

#[derive(Debug, serde::Deserialize)]
struct QueueBody {
    #[serde(default)]
    slots: Vec<QueueSlot>,
}

#[derive(Debug, serde::Deserialize)]
struct QueueSlot {
    nzo_id: String,
    status: String,
    percentage: String,
}

#[derive(Debug, serde::Deserialize)]
struct HistoryResponse {
    history: HistoryBody,
}

#[derive(Debug, serde::Deserialize)]
struct HistoryBody {
    #[serde(default)]
    slots: Vec<HistorySlot>,
}

#[derive(Debug, serde::Deserialize)]
struct HistorySlot {
    nzo_id: String,
    status: String,
    storage: Option<String>,
    #[serde(default)]
    fail_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DownloadClientKind;

    fn config() -> DownloadClientConfig {
        DownloadClientConfig {
            id: "sab".to_string(),
            kind: DownloadClientKind::Sabnzbd,
            url: "http://localhost:8085/".to_string(),
            username: None,
            password: None,
            api_key: Some("sabkey".to_string()),
            priority: 10,
            enabled: true,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_api_url() {
        let client = SabnzbdClient::new(&config()).unwrap();
        assert_eq!(
            client.api_url("queue"),
            "http://localhost:8085/api?output=json&apikey=sabkey&mode=queue"
        );
    }

    #[test]
    fn test_parse_addurl_response() {
        let json = r#"{"status": true, "nzo_ids": ["SABnzbd_nzo_p86tgx"]}"#;
        let parsed: AddUrlResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.status);
        assert_eq!(parsed.nzo_ids[0], "SABnzbd_nzo_p86tgx");
    }

    #[test]
    fn test_parse_queue_response() {
        let json = r#"{
            "queue": {
                "slots": [
                    {"nzo_id": "SABnzbd_nzo_p86tgx", "status": "Downloading", "percentage": "42"}
                ]
            }
        }"#;
        let parsed: QueueResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.queue.slots[0].percentage, "42");
    }

    #[test]
    fn test_parse_history_response() {
        let json = r#"{
            "history": {
                "slots": [
                    {
                        "nzo_id": "SABnzbd_nzo_p86tgx",
                        "status": "Completed",
                        "storage": "/downloads/complete/Some.Show.S01E01",
                        "fail_message": ""
                    }
                ]
            }
        }"#;
        let parsed: HistoryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.history.slots[0].storage.as_deref(),
            Some("/downloads/complete/Some.Show.S01E01")
        );
    }
}
