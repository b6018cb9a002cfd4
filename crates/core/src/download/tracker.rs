use super::store::{DownloadStore, DownloadStoreError};
use super::types::{Download, DownloadStatus, GrabStatus};
use crate::downloader::{ClientError, DownloadClient, JobState};
use crate::import::ImportPipeline;
use crate::metrics;
use crate::quality::parse_release_title;
use crate::trust::TrustManager;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Follows active downloads against their clients: progress updates,
/// completion handoff to the import pipeline, failure and stall
/// handling with blocklist feedback.
pub struct DownloadTracker {
    downloads: Arc<dyn DownloadStore>,
    clients: Vec<Arc<dyn DownloadClient>>,
    trust: Arc<TrustManager>,
    importer: Arc<ImportPipeline>,
    stall_timeout_secs: u64,
    retry_threshold: u32,
}

impl DownloadTracker {
    pub fn new(
        downloads: Arc<dyn DownloadStore>,
        clients: Vec<Arc<dyn DownloadClient>>,
        trust: Arc<TrustManager>,
        importer: Arc<ImportPipeline>,
        stall_timeout_secs: u64,
        retry_threshold: u32,
    ) -> Self {
        Self {
            downloads,
            clients,
            trust,
            importer,
            stall_timeout_secs,
            retry_threshold,
        }
    }

    /// One polling pass over every non-terminal download.
    pub async fn poll_active(&self) -> Result<(), DownloadStoreError> {
        for download in self.downloads.active_downloads()? {
            match download.status {
                DownloadStatus::Downloading => self.poll_one(&download).await?,
                // A crash between completion and import leaves the
                // download here; pick the import back up.
                DownloadStatus::Completed => self.start_import(download.id),
                // Importing is owned by the pipeline, unmatched waits
                // for manual resolution.
                _ => {}
            }
        }
        Ok(())
    }

    /// Fails downloads that have shown no progress for the stall
    /// timeout. The first sweep only warns; the download is failed on
    /// the next one, so a slow client gets one more interval.
    pub async fn sweep_stalled(&self, now: DateTime<Utc>) -> Result<(), DownloadStoreError> {
        for download in self
            .downloads
            .list_stalled(now, self.stall_timeout_secs)?
        {
            if !download.stalled_notified {
                warn!(
                    download_id = download.id,
                    title = %download.release_title,
                    idle_secs = (now - download.last_progress_at).num_seconds(),
                    "download stalled"
                );
                self.downloads.mark_stalled_notified(download.id)?;
                metrics::STALL_DETECTIONS.inc();
                continue;
            }
            self.fail(&download, "stalled: no progress from client")
                .await?;
        }
        Ok(())
    }

    async fn poll_one(&self, download: &Download) -> Result<(), DownloadStoreError> {
        let Some(client) = self.client(&download.client_id) else {
            warn!(
                download_id = download.id,
                client_id = %download.client_id,
                "download references an unconfigured client"
            );
            return Ok(());
        };

        let job = match client.poll(&download.external_job_id).await {
            Ok(job) => job,
            Err(ClientError::JobNotFound(_)) => {
                return self.fail(download, "job disappeared from client").await;
            }
            Err(e) => {
                // Transient client trouble. The stall sweep catches
                // clients that never come back.
                debug!(download_id = download.id, error = %e, "poll failed");
                return Ok(());
            }
        };

        self.downloads.update_progress(download.id, job.progress)?;
        if let Some(path) = &job.path {
            self.downloads.set_download_path(download.id, path)?;
        }

        match job.state {
            JobState::Queued | JobState::Downloading => Ok(()),
            JobState::Completed => {
                info!(download_id = download.id, title = %download.release_title,
                      "download completed");
                metrics::DOWNLOADS_COMPLETED.inc();
                self.downloads
                    .transition(download.id, &DownloadStatus::Completed)?;
                self.start_import(download.id);
                Ok(())
            }
            JobState::Error => {
                let reason = job
                    .error
                    .unwrap_or_else(|| "client reported an error".to_string());
                self.fail(download, &reason).await
            }
        }
    }

    fn start_import(&self, download_id: i64) {
        let download = match self.downloads.get_download(download_id) {
            Ok(Some(d)) => d,
            Ok(None) => return,
            Err(e) => {
                warn!(download_id, error = %e, "cannot reload download for import");
                return;
            }
        };
        // The pipeline records history and transitions the download on
        // both outcomes; a store-level error here leaves the download
        // in Completed for the next polling pass to retry.
        if let Err(e) = self.importer.import(&download) {
            warn!(download_id, error = %e, "import failed");
        }
    }

    /// Terminal failure: marks the download failed and feeds the
    /// blocklist. Failures accumulate per media item across grabs;
    /// entries are permanent once the threshold is reached, with a
    /// TTL before that.
    async fn fail(&self, download: &Download, reason: &str) -> Result<(), DownloadStoreError> {
        if let Some(client) = self.client(&download.client_id) {
            if let Err(e) = client.cancel(&download.external_job_id).await {
                debug!(download_id = download.id, error = %e, "cancel failed");
            }
        }

        self.downloads.transition(
            download.id,
            &DownloadStatus::Failed {
                error: reason.to_string(),
            },
        )?;
        self.downloads
            .set_grab_status(download.id, GrabStatus::Failed)?;
        metrics::DOWNLOADS_FAILED.inc();
        warn!(download_id = download.id, title = %download.release_title, %reason,
              "download failed");

        if let Some(media_id) = download.media_id {
            let attrs = parse_release_title(&download.release_title);
            let group = attrs.release_group.as_deref();
            // Counted after the transition above, so this failure is
            // included.
            let failures = self.downloads.failed_count_for_media(media_id)?;
            let outcome = if failures >= self.retry_threshold {
                info!(media_id, failures, "failure threshold reached, blocklisting permanently");
                self.trust.record_permanent_failure(
                    &download.release_title,
                    group,
                    &download.indexer_id,
                    media_id,
                    reason,
                )
            } else {
                self.trust.record_release_failure(
                    &download.release_title,
                    group,
                    &download.indexer_id,
                    media_id,
                    reason,
                )
            };
            if let Err(e) = outcome {
                warn!(download_id = download.id, error = %e, "blocklist update failed");
            }
        }
        Ok(())
    }

    fn client(&self, id: &str) -> Option<&Arc<dyn DownloadClient>> {
        self.clients.iter().find(|c| c.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use crate::download::{NewDownload, SqliteDownloadStore};
    use crate::downloader::JobStatus;
    use crate::import::SqliteImportStore;
    use crate::indexer::ReleaseProtocol;
    use crate::library::{LibraryStore, MediaSpec, SqliteLibraryStore};
    use crate::quality::{MediaType, SqlitePresetStore};
    use crate::testing::MockDownloadClient;
    use crate::trust::{normalize_title, SqliteTrustStore, TrustStore};
    use std::fs;

    struct Harness {
        tracker: DownloadTracker,
        downloads: Arc<SqliteDownloadStore>,
        trust_store: Arc<SqliteTrustStore>,
        library: Arc<SqliteLibraryStore>,
        client: Arc<MockDownloadClient>,
        _dir: tempfile::TempDir,
        downloads_dir: std::path::PathBuf,
        tv_dir: std::path::PathBuf,
    }

    fn harness(retry_threshold: u32) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let downloads_dir = dir.path().join("downloads");
        let tv_dir = dir.path().join("tv");
        fs::create_dir_all(&downloads_dir).unwrap();

        let config: ImportConfig = toml::from_str(&format!(
            r#"
movie_dir = "{}"
tv_dir = "{}"
"#,
            dir.path().join("movies").display(),
            tv_dir.display()
        ))
        .unwrap();

        let downloads = Arc::new(SqliteDownloadStore::in_memory().unwrap());
        let trust_store = Arc::new(SqliteTrustStore::in_memory().unwrap());
        let library = Arc::new(SqliteLibraryStore::in_memory().unwrap());
        let presets = Arc::new(SqlitePresetStore::in_memory().unwrap());
        let imports = Arc::new(SqliteImportStore::in_memory().unwrap());

        let importer = Arc::new(ImportPipeline::new(
            &config,
            library.clone(),
            presets,
            downloads.clone(),
            imports,
        ));
        let trust = Arc::new(TrustManager::new(trust_store.clone(), 5, 24));
        let client = Arc::new(MockDownloadClient::new("qbt", ReleaseProtocol::Torrent, 1));

        let tracker = DownloadTracker::new(
            downloads.clone(),
            vec![client.clone()],
            trust,
            importer,
            1800,
            retry_threshold,
        );
        Harness {
            tracker,
            downloads,
            trust_store,
            library,
            client,
            _dir: dir,
            downloads_dir,
            tv_dir,
        }
    }

    fn add_media(h: &Harness) -> i64 {
        h.library
            .add_media(&MediaSpec {
                title: "Some Show".to_string(),
                year: Some(2020),
                media_type: MediaType::Tv,
                library_id: 1,
                monitored: true,
            })
            .unwrap()
            .id
    }

    fn tracked(h: &Harness, media_id: Option<i64>, title: &str) -> Download {
        h.downloads
            .create_download(&NewDownload {
                media_id,
                client_id: "qbt".to_string(),
                external_job_id: "job-1".to_string(),
                release_title: title.to_string(),
                indexer_id: "idx".to_string(),
                protocol: ReleaseProtocol::Torrent,
                score: 1500,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_poll_updates_progress() {
        let h = harness(3);
        let download = tracked(&h, None, "Some.Show.S01E02.1080p.WEB-GRP");
        h.client.set_poll(JobStatus {
            state: JobState::Downloading,
            progress: 42.5,
            path: None,
            error: None,
        });

        h.tracker.poll_active().await.unwrap();

        let refreshed = h.downloads.get_download(download.id).unwrap().unwrap();
        assert_eq!(refreshed.progress, 42.5);
        assert_eq!(refreshed.status, DownloadStatus::Downloading);
    }

    #[tokio::test]
    async fn test_completion_runs_import() {
        let h = harness(3);
        let media_id = add_media(&h);
        let title = "Some.Show.S01E02.1080p.WEB-DL.x264-GRP";
        let download = tracked(&h, Some(media_id), title);

        let payload = h.downloads_dir.join(format!("{title}.mkv"));
        fs::write(&payload, vec![0u8; 4096]).unwrap();
        h.client.set_poll(JobStatus {
            state: JobState::Completed,
            progress: 100.0,
            path: Some(payload.display().to_string()),
            error: None,
        });

        h.tracker.poll_active().await.unwrap();

        let refreshed = h.downloads.get_download(download.id).unwrap().unwrap();
        assert_eq!(refreshed.status.status_type(), "imported");
        assert!(h
            .tv_dir
            .join("Some Show/Season 01/Some Show S01E02 1080p WEB-DL.mkv")
            .exists());
    }

    #[tokio::test]
    async fn test_completion_without_media_parks_unmatched() {
        let h = harness(3);
        let download = tracked(&h, None, "Mystery.Release.1080p.WEB-GRP");
        let payload = h.downloads_dir.join("payload.mkv");
        fs::write(&payload, vec![0u8; 64]).unwrap();
        h.client.set_poll(JobStatus {
            state: JobState::Completed,
            progress: 100.0,
            path: Some(payload.display().to_string()),
            error: None,
        });

        h.tracker.poll_active().await.unwrap();

        let refreshed = h.downloads.get_download(download.id).unwrap().unwrap();
        assert_eq!(refreshed.status, DownloadStatus::Unmatched);
        // Unmatched stays out of future polling passes.
        h.tracker.poll_active().await.unwrap();
        let again = h.downloads.get_download(download.id).unwrap().unwrap();
        assert_eq!(again.status, DownloadStatus::Unmatched);
    }

    #[tokio::test]
    async fn test_client_error_fails_and_blocklists() {
        let h = harness(3);
        let media_id = add_media(&h);
        let title = "Some.Show.S01E02.1080p.WEB-GRP";
        let download = tracked(&h, Some(media_id), title);
        h.client.set_poll(JobStatus {
            state: JobState::Error,
            progress: 10.0,
            path: None,
            error: Some("tracker returned garbage".to_string()),
        });

        h.tracker.poll_active().await.unwrap();

        let refreshed = h.downloads.get_download(download.id).unwrap().unwrap();
        assert!(matches!(refreshed.status, DownloadStatus::Failed { .. }));
        assert!(h.client.was_cancelled());
        assert!(h
            .trust_store
            .is_blocklisted(&normalize_title(title), "idx", media_id, Utc::now())
            .unwrap());
        // First failure gets a TTL entry, not a permanent one.
        let entries = h.trust_store.list_blocklist().unwrap();
        assert!(entries[0].expires_at.is_some());
    }

    #[tokio::test]
    async fn test_repeated_failures_escalate_to_permanent_blocklist() {
        // Failures accumulate per media item across grabs, not per
        // download row.
        let h = harness(2);
        let media_id = add_media(&h);
        let first = tracked(&h, Some(media_id), "Some.Show.S01E02.1080p.WEB-GRP");
        h.client.set_poll_missing();

        h.tracker.poll_active().await.unwrap();

        let refreshed = h.downloads.get_download(first.id).unwrap().unwrap();
        assert!(matches!(refreshed.status, DownloadStatus::Failed { .. }));
        let entries = h.trust_store.list_blocklist().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].expires_at.is_some());

        // A second grab for the same item fails too: threshold hit,
        // this entry never expires.
        let second = tracked(&h, Some(media_id), "Some.Show.S01E02.720p.WEB-GRP");
        h.tracker.poll_active().await.unwrap();

        let refreshed = h.downloads.get_download(second.id).unwrap().unwrap();
        assert!(matches!(refreshed.status, DownloadStatus::Failed { .. }));
        let entries = h.trust_store.list_blocklist().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.expires_at.is_none()));
    }

    #[tokio::test]
    async fn test_stall_warns_then_fails() {
        let h = harness(3);
        let media_id = add_media(&h);
        let download = tracked(&h, Some(media_id), "Some.Show.S01E02.1080p.WEB-GRP");

        let later = Utc::now() + chrono::Duration::seconds(3600);
        h.tracker.sweep_stalled(later).await.unwrap();
        let after_first = h.downloads.get_download(download.id).unwrap().unwrap();
        assert_eq!(after_first.status, DownloadStatus::Downloading);
        assert!(after_first.stalled_notified);

        h.tracker.sweep_stalled(later).await.unwrap();
        let after_second = h.downloads.get_download(download.id).unwrap().unwrap();
        assert!(matches!(after_second.status, DownloadStatus::Failed { .. }));
        assert!(h.client.was_cancelled());
    }

    #[tokio::test]
    async fn test_transient_poll_error_keeps_download() {
        let h = harness(3);
        let download = tracked(&h, None, "Some.Show.S01E02.1080p.WEB-GRP");
        h.client.set_poll_error("connection refused");

        h.tracker.poll_active().await.unwrap();

        let refreshed = h.downloads.get_download(download.id).unwrap().unwrap();
        assert_eq!(refreshed.status, DownloadStatus::Downloading);
        assert!(!h.client.was_cancelled());
    }
}
