use crate::indexer::CandidateRelease;
use crate::quality::{Resolution, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A grab delay applied to newly accepted candidates, giving better
/// releases time to appear before committing to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayProfile {
    pub id: i64,
    pub name: String,
    pub enabled: bool,
    pub delay_minutes: u32,
    /// `None` applies the profile to every library.
    pub library_id: Option<i64>,
    pub bypass: Option<BypassConditions>,
}

/// Conditions under which a candidate skips the delay entirely.
/// Conditions combine with OR: meeting any one of them bypasses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BypassConditions {
    pub resolution_at_least: Option<Resolution>,
    pub source_at_least: Option<Source>,
    pub score_above: Option<i64>,
}

/// Fields settable when creating or updating a delay profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayProfileSpec {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub delay_minutes: u32,
    #[serde(default)]
    pub library_id: Option<i64>,
    #[serde(default)]
    pub bypass: Option<BypassConditions>,
}

fn default_enabled() -> bool {
    true
}

/// Outcome of the delay gate for one accepted candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelayDecision {
    GrabNow,
    Defer { eligible_at: DateTime<Utc> },
}

/// A deferred candidate waiting out its delay window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingGrab {
    pub id: i64,
    pub media_id: i64,
    pub release: CandidateRelease,
    pub score: i64,
    pub eligible_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// What happened when a candidate was offered to the pending store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOutcome {
    /// No pending grab existed for the item.
    Created,
    /// The candidate strictly beat the held one and replaced it.
    Replaced,
    /// The held candidate scored at least as high; offer dropped.
    Kept,
}
