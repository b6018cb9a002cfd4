use super::types::{TaskKind, TaskStatus};
use crate::acquisition::GrabDecisionEngine;
use crate::config::SchedulerConfig;
use crate::download::DownloadTracker;
use crate::trust::TrustManager;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
struct LastRun {
    at: Option<DateTime<Utc>>,
    duration_ms: Option<u64>,
    error: Option<String>,
}

struct TaskEntry {
    // Single flight: a tick is skipped while the previous run of the
    // same task is still going.
    running: AtomicBool,
    last: RwLock<LastRun>,
}

/// Clears the single-flight flag on drop, so the slot is released
/// even when the task body panics or its future is dropped mid-run.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Inner {
    engine: Arc<GrabDecisionEngine>,
    tracker: Arc<DownloadTracker>,
    trust: Arc<TrustManager>,
    tasks: HashMap<TaskKind, TaskEntry>,
}

impl Inner {
    /// Runs one task to completion. Returns a short human-readable
    /// summary, or the task's error message.
    async fn run(&self, kind: TaskKind) -> Result<String, String> {
        let entry = &self.tasks[&kind];
        if entry.running.swap(true, Ordering::SeqCst) {
            return Err(format!("task '{}' is already running", kind.name()));
        }
        let _guard = RunningGuard(&entry.running);

        let started = Instant::now();
        let result = self.execute(kind).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        {
            let mut last = entry.last.write().await;
            last.at = Some(Utc::now());
            last.duration_ms = Some(duration_ms);
            last.error = result.as_ref().err().cloned();
        }

        match &result {
            Ok(summary) => info!(task = kind.name(), duration_ms, %summary, "task finished"),
            Err(e) => warn!(task = kind.name(), duration_ms, error = %e, "task failed"),
        }
        result
    }

    async fn execute(&self, kind: TaskKind) -> Result<String, String> {
        match kind {
            TaskKind::Search => self
                .engine
                .search_pass()
                .await
                .map(|s| {
                    format!(
                        "searched {}, grabbed {}, deferred {}",
                        s.searched, s.grabbed, s.deferred
                    )
                })
                .map_err(|e| e.to_string()),
            TaskKind::UpgradeSearch => self
                .engine
                .upgrade_pass()
                .await
                .map(|s| {
                    format!(
                        "searched {}, grabbed {}, deferred {}",
                        s.searched, s.grabbed, s.deferred
                    )
                })
                .map_err(|e| e.to_string()),
            TaskKind::DownloadPoll => self
                .tracker
                .poll_active()
                .await
                .map(|()| "polled active downloads".to_string())
                .map_err(|e| e.to_string()),
            TaskKind::StalledSweep => self
                .tracker
                .sweep_stalled(Utc::now())
                .await
                .map(|()| "swept stalled downloads".to_string())
                .map_err(|e| e.to_string()),
            TaskKind::PendingPromotion => self
                .engine
                .promote_pending(Utc::now())
                .await
                .map(|promoted| format!("promoted {promoted}"))
                .map_err(|e| e.to_string()),
            TaskKind::BlocklistExpiry => self
                .trust
                .expire_blocklist()
                .map(|removed| format!("removed {removed} expired entries"))
                .map_err(|e| e.to_string()),
        }
    }
}

/// Drives the periodic tasks. Each task runs on its own interval in its
/// own spawned loop; any task can also be triggered manually.
pub struct Scheduler {
    inner: Arc<Inner>,
    config: SchedulerConfig,
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(
        engine: Arc<GrabDecisionEngine>,
        tracker: Arc<DownloadTracker>,
        trust: Arc<TrustManager>,
        config: SchedulerConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let tasks = TaskKind::all()
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    TaskEntry {
                        running: AtomicBool::new(false),
                        last: RwLock::new(LastRun::default()),
                    },
                )
            })
            .collect();

        Self {
            inner: Arc::new(Inner {
                engine,
                tracker,
                trust,
                tasks,
            }),
            config,
            running: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Spawns one loop per task.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("scheduler already running");
            return;
        }
        info!("starting scheduler");
        for kind in TaskKind::all() {
            self.spawn_loop(kind, self.interval_for(kind));
        }
    }

    /// Signals every task loop to stop.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("stopping scheduler");
        let _ = self.shutdown_tx.send(());
    }

    /// Runs a task out of schedule.
    pub async fn trigger(&self, kind: TaskKind) -> Result<String, String> {
        self.inner.run(kind).await
    }

    pub async fn statuses(&self) -> Vec<TaskStatus> {
        let mut statuses = Vec::with_capacity(TaskKind::all().len());
        for kind in TaskKind::all() {
            let entry = &self.inner.tasks[&kind];
            let last = entry.last.read().await.clone();
            statuses.push(TaskStatus {
                name: kind.name(),
                running: entry.running.load(Ordering::SeqCst),
                last_run_at: last.at,
                last_duration_ms: last.duration_ms,
                last_error: last.error,
            });
        }
        statuses
    }

    fn interval_for(&self, kind: TaskKind) -> Duration {
        let secs = match kind {
            TaskKind::Search => self.config.search_interval_secs,
            TaskKind::UpgradeSearch => self.config.upgrade_search_interval_secs,
            TaskKind::DownloadPoll => self.config.download_poll_interval_secs,
            TaskKind::StalledSweep => self.config.stalled_sweep_interval_secs,
            TaskKind::PendingPromotion => self.config.pending_promotion_interval_secs,
            TaskKind::BlocklistExpiry => self.config.blocklist_expiry_interval_secs,
        };
        Duration::from_secs(secs)
    }

    fn spawn_loop(&self, kind: TaskKind, interval: Duration) {
        let inner = Arc::clone(&self.inner);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(task = kind.name(), interval_secs = interval.as_secs(), "task loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!(task = kind.name(), "task loop stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        // Errors are recorded in the task status and
                        // logged by run(); the loop keeps going.
                        let _ = inner.run(kind).await;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::delay::SqliteDelayStore;
    use crate::download::SqliteDownloadStore;
    use crate::import::{ImportPipeline, SqliteImportStore};
    use crate::indexer::{Indexer, ReleaseProtocol};
    use crate::library::SqliteLibraryStore;
    use crate::quality::SqlitePresetStore;
    use crate::testing::{MockDownloadClient, MockIndexer};
    use crate::trust::{SqliteTrustStore, TrustGate};

    fn scheduler() -> (Scheduler, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config: ImportConfig = toml::from_str(&format!(
            r#"
movie_dir = "{}"
tv_dir = "{}"
"#,
            dir.path().join("movies").display(),
            dir.path().join("tv").display()
        ))
        .unwrap();

        let library = Arc::new(SqliteLibraryStore::in_memory().unwrap());
        let presets = Arc::new(SqlitePresetStore::in_memory().unwrap());
        let trust_store = Arc::new(SqliteTrustStore::in_memory().unwrap());
        let delays = Arc::new(SqliteDelayStore::in_memory().unwrap());
        let downloads = Arc::new(SqliteDownloadStore::in_memory().unwrap());
        let imports = Arc::new(SqliteImportStore::in_memory().unwrap());

        let indexer: Arc<dyn Indexer> = Arc::new(MockIndexer::new("idx"));
        let client = Arc::new(MockDownloadClient::new("qbt", ReleaseProtocol::Torrent, 1));

        let engine = Arc::new(GrabDecisionEngine::new(
            vec![indexer],
            vec![client.clone()],
            library.clone(),
            presets.clone(),
            TrustGate::new(trust_store.clone()),
            delays,
            downloads.clone(),
            5,
            12,
        ));
        let importer = Arc::new(ImportPipeline::new(
            &config,
            library,
            presets,
            downloads.clone(),
            imports,
        ));
        let trust = Arc::new(TrustManager::new(trust_store, 5, 24));
        let tracker = Arc::new(DownloadTracker::new(
            downloads,
            vec![client],
            trust.clone(),
            importer,
            1800,
            3,
        ));

        (
            Scheduler::new(engine, tracker, trust, SchedulerConfig::default()),
            dir,
        )
    }

    #[tokio::test]
    async fn test_trigger_records_status() {
        let (scheduler, _dir) = scheduler();

        let before = scheduler.statuses().await;
        assert_eq!(before.len(), TaskKind::all().len());
        assert!(before.iter().all(|s| s.last_run_at.is_none()));

        scheduler.trigger(TaskKind::BlocklistExpiry).await.unwrap();

        let status = scheduler
            .statuses()
            .await
            .into_iter()
            .find(|s| s.name == "blocklist_expiry")
            .unwrap();
        assert!(status.last_run_at.is_some());
        assert!(status.last_error.is_none());
        assert!(!status.running);
    }

    #[tokio::test]
    async fn test_trigger_search_pass() {
        let (scheduler, _dir) = scheduler();
        let summary = scheduler.trigger(TaskKind::Search).await.unwrap();
        assert!(summary.contains("searched 0"));
    }

    #[test]
    fn test_running_flag_clears_on_panic() {
        let flag = AtomicBool::new(false);
        assert!(!flag.swap(true, Ordering::SeqCst));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = RunningGuard(&flag);
            panic!("task blew up");
        }));
        assert!(result.is_err());
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_start_stop() {
        let (scheduler, _dir) = scheduler();
        scheduler.start();
        scheduler.stop();
    }
}
