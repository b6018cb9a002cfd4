use super::types::{CandidateRelease, Indexer, IndexerError, ReleaseProtocol, SearchCategory};
use crate::config::IndexerConfig;
use crate::quality::parse_release_title;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

/// Torrent indexer adapter speaking the Jackett/Prowlarr JSON results
/// API (`{base}/results?apikey=...&Query=...`).
pub struct TorznabIndexer {
    id: String,
    priority: u8,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TorznabIndexer {
    pub fn new(config: &IndexerConfig) -> Result<Self, IndexerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;
        Ok(Self {
            id: config.id.clone(),
            priority: config.priority,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn build_search_url(&self, query: &str, categories: &[SearchCategory]) -> String {
        let mut url = format!(
            "{}/results?apikey={}&Query={}",
            self.base_url,
            self.api_key,
            urlencoding::encode(query)
        );
        for category in categories {
            for id in category_ids(*category) {
                url.push_str(&format!("&Category%5B%5D={id}"));
            }
        }
        url
    }
}

/// Newznab category numbers, shared by torznab trackers.
fn category_ids(category: SearchCategory) -> &'static [u32] {
    match category {
        SearchCategory::Movies => &[2000, 2040, 2045],
        SearchCategory::Tv => &[5000, 5040, 5045],
        SearchCategory::Anime => &[5070],
    }
}

#[async_trait]
impl Indexer for TorznabIndexer {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn protocol(&self) -> ReleaseProtocol {
        ReleaseProtocol::Torrent
    }

    async fn search(
        &self,
        query: &str,
        categories: &[SearchCategory],
    ) -> Result<Vec<CandidateRelease>, IndexerError> {
        let url = self.build_search_url(query, categories);
        debug!(indexer = %self.id, %query, "torznab search");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(IndexerError::Status(response.status().as_u16()));
        }

        let body: TorznabResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::Parse(e.to_string()))?;

        let mut candidates = Vec::with_capacity(body.Results.len());
        for result in body.Results {
            let download_url = match result.MagnetUri.or(result.Link) {
                Some(url) => url,
                None => {
                    warn!(indexer = %self.id, title = %result.Title, "result without link, skipped");
                    continue;
                }
            };
            candidates.push(CandidateRelease {
                attrs: parse_release_title(&result.Title),
                title: result.Title,
                size_bytes: result.Size.unwrap_or(0),
                seeders: result.Seeders,
                protocol: ReleaseProtocol::Torrent,
                indexer_id: self.id.clone(),
                indexer_priority: self.priority,
                download_url,
                publish_date: result.PublishDate.as_deref().and_then(parse_date),
            });
        }
        Ok(candidates)
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[allow(non_snake_case)]
#[derive(Debug, serde::Deserialize)]
struct TorznabResponse {
    #[serde(default)]
    Results: Vec<TorznabResult>,
}

#[allow(non_snake_case)]
#[derive(Debug, serde::Deserialize)]
struct TorznabResult {
    Title: String,
    Size: Option<u64>,
    Seeders: Option<u32>,
    Link: Option<String>,
    MagnetUri: Option<String>,
    PublishDate: Option<String>,
}
