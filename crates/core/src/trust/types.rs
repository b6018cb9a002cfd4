use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blocklisted release. Matching happens on the normalized title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlocklistEntry {
    pub id: i64,
    pub release_title: String,
    pub normalized_title: String,
    pub release_group: Option<String>,
    /// Restricts the block to one indexer when set.
    pub indexer_id: Option<String>,
    /// Restricts the block to one media item when set.
    pub media_id: Option<i64>,
    pub reason: String,
    pub added_at: DateTime<Utc>,
    /// `None` blocks forever.
    pub expires_at: Option<DateTime<Utc>>,
}

impl BlocklistEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Fields settable when blocklisting a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocklistSpec {
    pub release_title: String,
    pub release_group: Option<String>,
    pub indexer_id: Option<String>,
    pub media_id: Option<i64>,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A release group whose releases are never grabbed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedGroup {
    pub id: i64,
    /// Group name, stored lowercase.
    pub name: String,
    pub failure_count: u32,
    /// Set when the failure threshold blocked the group, not an operator.
    pub auto_blocked: bool,
    pub added_at: DateTime<Utc>,
}

/// A release group whose releases get a scoring bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedGroup {
    pub id: i64,
    /// Group name, stored lowercase.
    pub name: String,
    pub added_at: DateTime<Utc>,
}

/// Scope of a search exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExclusionScope {
    /// Never grab anything for this media item.
    Media { media_id: i64 },
    /// Never use this indexer for items in this library.
    IndexerLibrary { indexer_id: String, library_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub id: i64,
    pub scope: ExclusionScope,
    pub added_at: DateTime<Utc>,
}

/// Normalizes a release title for blocklist matching: lowercase with
/// every run of non-alphanumerics collapsed to a single space.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_space = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}
