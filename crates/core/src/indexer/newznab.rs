use super::types::{CandidateRelease, Indexer, IndexerError, ReleaseProtocol, SearchCategory};
use crate::config::IndexerConfig;
use crate::quality::parse_release_title;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

/// Usenet indexer adapter speaking the newznab JSON API
/// (`{base}/api?t=search&o=json`).
pub struct NewznabIndexer {
    id: String,
    priority: u8,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl NewznabIndexer {
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
        let cats: Vec<String> = categories
            .iter()
            .map(|c| category_id(*c).to_string())
            .collect();
        format!(
            "{}/api?t=search&o=json&apikey={}&q={}&cat={}",
            self.base_url,
            self.api_key,
            urlencoding::encode(query),
            cats.join(",")
        )
    }
}

fn category_id(category: SearchCategory) -> u32 {
    match category {
        SearchCategory::Movies => 2000,
        SearchCategory::Tv => 5000,
        SearchCategory::Anime => 5070,
    }
}

#[async_trait]
impl Indexer for NewznabIndexer {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn protocol(&self) -> ReleaseProtocol {
        ReleaseProtocol::Usenet
    }

    async fn search(
        &self,
        query: &str,
        categories: &[SearchCategory],
    ) -> Result<Vec<CandidateRelease>, IndexerError> {
        let url = self.build_search_url(query, categories);
        debug!(indexer = %self.id, %query, "newznab search");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(IndexerError::Status(response.status().as_u16()));
        }

        let body: NewznabResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::Parse(e.to_string()))?;

        let items = body.channel.map(|c| c.item).unwrap_or_default();
        let candidates = items
            .into_iter()
            .map(|item| {
                let size = item
                    .enclosure
                    .as_ref()
                    .and_then(|e| e.attributes.length.parse().ok())
                    .unwrap_or(0);
                let download_url = item
                    .enclosure
                    .map(|e| e.attributes.url)
                    .unwrap_or(item.link);
                CandidateRelease {
                    attrs: parse_release_title(&item.title),
                    title: item.title,
                    size_bytes: size,
                    seeders: None,
                    protocol: ReleaseProtocol::Usenet,
                    indexer_id: self.id.clone(),
                    indexer_priority: self.priority,
                    download_url,
                    publish_date: item.pub_date.as_deref().and_then(parse_rfc2822),
                }
            })
            .collect();
        Ok(candidates)
    }
}

fn parse_rfc2822(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, serde::Deserialize)]
struct NewznabResponse {
    channel: Option<NewznabChannel>,
}

#[derive(Debug, serde::Deserialize)]
struct NewznabChannel {
    #[serde(default)]
    item: Vec<NewznabItem>,
}

#[derive(Debug, serde::Deserialize)]
struct NewznabItem {
    title: String,
    link: String,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    enclosure: Option<NewznabEnclosure>,
}

#[derive(Debug, serde::Deserialize)]
struct NewznabEnclosure {
    #[serde(rename = "@attributes")]
    attributes: EnclosureAttributes,
}

#[derive(Debug, serde::Deserialize)]
struct EnclosureAttributes {
    url: String,
    #[serde(default)]
    length: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexerKind;

    fn config() -> IndexerConfig {
        IndexerConfig {
            id: "nzbgeek".to_string(),
            kind: IndexerKind::Newznab,
            url: "https://api.nzbgeek.info".to_string(),
            api_key: "key456".to_string(),
            priority: 20,
            enabled: true,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_search_url() {
        let indexer = NewznabIndexer::new(&config()).unwrap();
        let url = indexer.build_search_url("movie title", &[SearchCategory::Movies]);
        assert_eq!(
            url,
            "https://api.nzbgeek.info/api?t=search&o=json&apikey=key456&q=movie%20title&cat=2000"
        );
    }

    #[test]
    fn test_parse_response_json() {
        let json = r#"{
            "channel": {
                "item": [
                    {
                        "title": "Film.2020.1080p.BluRay.x264-GRP",
                        "link": "https://api.nzbgeek.info/details/abc",
                        "pubDate": "Wed, 01 May 2024 10:00:00 +0000",
                        "enclosure": {
                            "@attributes": {
                                "url": "https://api.nzbgeek.info/dl/abc.nzb",
                                "length": "2000000000"
                            }
                        }
                    }
                ]
            }
        }"#;
        let parsed: NewznabResponse = serde_json::from_str(json).unwrap();
        let items = parsed.channel.unwrap().item;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].enclosure.as_ref().unwrap().attributes.length,
            "2000000000"
        );
    }

    #[test]
    fn test_parse_empty_response() {
        let parsed: NewznabResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.channel.is_none());
    }

    #[test]
    fn test_parse_rfc2822_date() {
        let date = parse_rfc2822("Wed, 01 May 2024 10:00:00 +0000").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }
}
