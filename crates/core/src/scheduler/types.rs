use chrono::{DateTime, Utc};
use serde::Serialize;

/// The background tasks the scheduler drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Search for items missing their quality target.
    Search,
    /// Search for upgrades to items that met their target.
    UpgradeSearch,
    /// Poll active downloads against their clients.
    DownloadPoll,
    /// Fail downloads that stopped making progress.
    StalledSweep,
    /// Grab pending candidates whose delay window elapsed.
    PendingPromotion,
    /// Remove expired blocklist entries.
    BlocklistExpiry,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Search => "search",
            TaskKind::UpgradeSearch => "upgrade_search",
            TaskKind::DownloadPoll => "download_poll",
            TaskKind::StalledSweep => "stalled_sweep",
            TaskKind::PendingPromotion => "pending_promotion",
            TaskKind::BlocklistExpiry => "blocklist_expiry",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.name() == name)
    }

    pub fn all() -> [TaskKind; 6] {
        [
            TaskKind::Search,
            TaskKind::UpgradeSearch,
            TaskKind::DownloadPoll,
            TaskKind::StalledSweep,
            TaskKind::PendingPromotion,
            TaskKind::BlocklistExpiry,
        ]
    }
}

/// Snapshot of one task's execution state.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatus {
    pub name: &'static str,
    pub running: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub last_error: Option<String>,
}
