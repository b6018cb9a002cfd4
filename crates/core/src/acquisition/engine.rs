use super::types::{AcquisitionError, Decision, PassSummary};
use crate::delay::{evaluate, DelayDecision, DelayStore};
use crate::download::{Download, DownloadStatus, DownloadStore, GrabStatus, NewDownload};
use crate::downloader::{select_client, DownloadClient};
use crate::indexer::{search_all, Indexer, SearchCategory};
use crate::library::{LibraryStore, MediaItem};
use crate::metrics;
use crate::quality::{parse_release_title, MediaType, PresetStore, QualityPreset};
use crate::scoring::{
    score_attrs, score_release, select_best, ScoredCandidate, TRUSTED_GROUP_BONUS,
    UPGRADE_SCORE_MARGIN,
};
use crate::trust::{Admittance, TrustGate};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Searches indexers for a media item, filters the candidates through
/// the trust gate and scorer, and either grabs the winner, defers it
/// behind a delay profile, or does nothing.
pub struct GrabDecisionEngine {
    indexers: Vec<Arc<dyn Indexer>>,
    clients: Vec<Arc<dyn DownloadClient>>,
    library: Arc<dyn LibraryStore>,
    presets: Arc<dyn PresetStore>,
    gate: TrustGate,
    delays: Arc<dyn DelayStore>,
    downloads: Arc<dyn DownloadStore>,
    indexer_timeout: Duration,
    search_backoff_hours: u32,
}

impl GrabDecisionEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        indexers: Vec<Arc<dyn Indexer>>,
        clients: Vec<Arc<dyn DownloadClient>>,
        library: Arc<dyn LibraryStore>,
        presets: Arc<dyn PresetStore>,
        gate: TrustGate,
        delays: Arc<dyn DelayStore>,
        downloads: Arc<dyn DownloadStore>,
        indexer_timeout_secs: u64,
        search_backoff_hours: u32,
    ) -> Self {
        Self {
            indexers,
            clients,
            library,
            presets,
            gate,
            delays,
            downloads,
            indexer_timeout: Duration::from_secs(indexer_timeout_secs),
            search_backoff_hours,
        }
    }

    /// Runs the full decision for one media item.
    pub async fn decide(&self, media: &MediaItem) -> Result<Decision, AcquisitionError> {
        let now = Utc::now();
        let preset = self.effective_preset(media.id)?;
        let filters = self.presets.filters_for(preset.id)?;

        // Anything non-terminal suppresses new grabs for the item,
        // with one exception: an auto-upgrade preset may supersede a
        // download still fetching when a clearly better release turns
        // up. Completed or importing payloads and unmatched ones
        // waiting for manual resolution are never superseded.
        let in_flight = self.downloads.active_for_media(media.id)?;
        let supersedable = preset.auto_upgrade
            && in_flight
                .iter()
                .all(|d| d.status == DownloadStatus::Downloading);
        if !in_flight.is_empty() && !supersedable {
            return Ok(Decision::Skipped {
                reason: "download already in flight".to_string(),
            });
        }

        let file_score = self
            .library
            .get_status(media.id)?
            .and_then(|status| status.attrs)
            .map(|attrs| score_attrs(&preset, &attrs));
        // An in-flight grab raises the bar the same way an existing
        // file does.
        let held_score = in_flight
            .iter()
            .map(|d| score_attrs(&preset, &parse_release_title(&d.release_title)))
            .max();
        let baseline = match (file_score, held_score) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        let outcome = search_all(
            &self.indexers,
            &search_query(media),
            &[search_category(media.media_type)],
            self.indexer_timeout,
        )
        .await;
        let searched = outcome.candidates.len();
        metrics::CANDIDATES_FOUND
            .with_label_values(&[])
            .observe(searched as f64);

        let mut scored = Vec::new();
        let mut rejected = 0usize;
        for candidate in outcome.candidates {
            let trusted_group =
                match self
                    .gate
                    .admit(&candidate, media.id, media.library_id, now)?
                {
                    Admittance::Admitted { trusted_group } => trusted_group,
                    Admittance::Refused { reason } => {
                        debug!(title = %candidate.title, %reason, "candidate refused");
                        metrics::CANDIDATES_REJECTED
                            .with_label_values(&["trust"])
                            .inc();
                        rejected += 1;
                        continue;
                    }
                };

            let outcome = score_release(&preset, &filters, &candidate);
            if !outcome.is_accepted() {
                debug!(title = %candidate.title, reasons = ?outcome.reasons, "candidate rejected");
                metrics::CANDIDATES_REJECTED
                    .with_label_values(&["score"])
                    .inc();
                rejected += 1;
                continue;
            }

            let mut score = outcome.score;
            if trusted_group {
                score += TRUSTED_GROUP_BONUS;
            }
            // An existing file only gets replaced by a clear upgrade.
            if let Some(baseline) = baseline {
                if score <= baseline + UPGRADE_SCORE_MARGIN {
                    debug!(title = %candidate.title, score, baseline,
                           "candidate does not clear the upgrade margin");
                    rejected += 1;
                    continue;
                }
            }
            scored.push(ScoredCandidate { candidate, score });
        }

        let Some(best) = select_best(&scored) else {
            return Ok(Decision::NoCandidate { searched, rejected });
        };

        // An upgrade over an in-flight download replaces it right
        // away; the delay window already applied to the original grab.
        if !in_flight.is_empty() {
            for old in &in_flight {
                self.supersede(old).await?;
            }
            return self.grab(media.id, best, "upgrade").await;
        }

        let profile = self.delays.profile_for_library(media.library_id)?;
        match evaluate(&best.candidate.attrs, best.score, profile.as_ref(), now) {
            DelayDecision::GrabNow => self.grab(media.id, best, "immediate").await,
            DelayDecision::Defer { eligible_at } => {
                let outcome = self.delays.offer_pending(
                    media.id,
                    &best.candidate,
                    best.score,
                    eligible_at,
                )?;
                metrics::GRABS_DEFERRED.inc();
                info!(media_id = media.id, title = %best.candidate.title,
                      %eligible_at, ?outcome, "grab deferred");
                Ok(Decision::Deferred {
                    release_title: best.candidate.title.clone(),
                    score: best.score,
                    eligible_at,
                    outcome,
                })
            }
        }
    }

    /// Searches every item whose quality target is not met yet.
    pub async fn search_pass(&self) -> Result<PassSummary, AcquisitionError> {
        metrics::SEARCH_PASSES.with_label_values(&["search"]).inc();
        let now = Utc::now();
        let due = self.library.due_for_search(now, self.search_backoff_hours)?;
        self.run_pass(due, now, false).await
    }

    /// Searches items that met their target but whose preset keeps
    /// looking for better releases.
    pub async fn upgrade_pass(&self) -> Result<PassSummary, AcquisitionError> {
        metrics::SEARCH_PASSES
            .with_label_values(&["upgrade"])
            .inc();
        let now = Utc::now();
        let due = self
            .library
            .due_for_upgrade(now, self.search_backoff_hours)?;
        self.run_pass(due, now, true).await
    }

    async fn run_pass(
        &self,
        due: Vec<MediaItem>,
        now: DateTime<Utc>,
        upgrades_only: bool,
    ) -> Result<PassSummary, AcquisitionError> {
        let mut summary = PassSummary::default();
        for media in due {
            if upgrades_only && !self.effective_preset(media.id)?.auto_upgrade {
                continue;
            }
            summary.searched += 1;
            match self.decide(&media).await {
                Ok(Decision::Grabbed { .. }) => summary.grabbed += 1,
                Ok(Decision::Deferred { .. }) => summary.deferred += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(media_id = media.id, title = %media.title, error = %e,
                          "decision failed");
                    summary.errors += 1;
                }
            }
            self.library.set_last_searched(media.id, now)?;
        }
        Ok(summary)
    }

    /// Grabs pending candidates whose delay window has elapsed. The
    /// trust gate is re-checked: a release blocklisted while waiting is
    /// dropped instead of grabbed.
    pub async fn promote_pending(&self, now: DateTime<Utc>) -> Result<usize, AcquisitionError> {
        let mut promoted = 0;
        for pending in self.delays.ready_for_promotion(now)? {
            let Some(media) = self.library.get_media(pending.media_id)? else {
                self.delays.remove_pending(pending.id)?;
                continue;
            };
            if self.downloads.has_active_for_media(media.id)? {
                self.delays.remove_pending(pending.id)?;
                continue;
            }
            match self
                .gate
                .admit(&pending.release, media.id, media.library_id, now)?
            {
                Admittance::Refused { reason } => {
                    info!(media_id = media.id, title = %pending.release.title, %reason,
                          "pending grab dropped");
                    self.delays.remove_pending(pending.id)?;
                }
                Admittance::Admitted { .. } => {
                    let scored = ScoredCandidate {
                        candidate: pending.release.clone(),
                        score: pending.score,
                    };
                    match self.grab(media.id, &scored, "promoted").await {
                        Ok(_) => promoted += 1,
                        // Kept pending; the next promotion tick retries.
                        Err(e) => warn!(media_id = media.id, error = %e, "promotion failed"),
                    }
                }
            }
        }
        Ok(promoted)
    }

    /// Cancels an in-flight download that lost to a better release.
    /// Superseded downloads are terminal but never feed the blocklist.
    async fn supersede(&self, download: &Download) -> Result<(), AcquisitionError> {
        if let Some(client) = self.clients.iter().find(|c| c.id() == download.client_id) {
            if let Err(e) = client.cancel(&download.external_job_id).await {
                debug!(download_id = download.id, error = %e, "cancel failed");
            }
        }
        self.downloads
            .transition(download.id, &DownloadStatus::Superseded)?;
        self.downloads
            .set_grab_status(download.id, GrabStatus::Superseded)?;
        info!(download_id = download.id, title = %download.release_title,
              "download superseded by upgrade");
        Ok(())
    }

    async fn grab(
        &self,
        media_id: i64,
        scored: &ScoredCandidate,
        path: &str,
    ) -> Result<Decision, AcquisitionError> {
        let candidate = &scored.candidate;
        let client = select_client(&self.clients, candidate.protocol)
            .await
            .ok_or_else(|| AcquisitionError::NoClient(candidate.protocol.as_str().to_string()))?;
        let job_id = client.submit(candidate).await?;

        let download = self.downloads.create_download(&NewDownload {
            media_id: Some(media_id),
            client_id: client.id().to_string(),
            external_job_id: job_id,
            release_title: candidate.title.clone(),
            indexer_id: candidate.indexer_id.clone(),
            protocol: candidate.protocol,
            score: scored.score,
        })?;
        self.downloads.add_grab(
            media_id,
            Some(download.id),
            &candidate.title,
            &candidate.indexer_id,
            scored.score,
            candidate.size_bytes,
        )?;
        // A real grab supersedes whatever was waiting out a delay.
        self.delays.remove_pending_for_media(media_id)?;
        metrics::GRABS_TOTAL.with_label_values(&[path]).inc();
        info!(media_id, download_id = download.id, title = %candidate.title,
              score = scored.score, client = client.id(), "release grabbed");

        Ok(Decision::Grabbed {
            download_id: download.id,
            release_title: candidate.title.clone(),
            score: scored.score,
        })
    }

    fn effective_preset(&self, media_id: i64) -> Result<QualityPreset, AcquisitionError> {
        if let Some(ovr) = self.library.get_override(media_id)? {
            if let Some(preset_id) = ovr.preset_id {
                if let Some(preset) = self.presets.get(preset_id)? {
                    return Ok(preset);
                }
            }
        }
        Ok(self.presets.default_preset()?)
    }
}

fn search_category(media_type: MediaType) -> SearchCategory {
    match media_type {
        MediaType::Movie => SearchCategory::Movies,
        MediaType::Tv => SearchCategory::Tv,
        MediaType::Anime => SearchCategory::Anime,
    }
}

fn search_query(media: &MediaItem) -> String {
    match (media.media_type, media.year) {
        (MediaType::Movie, Some(year)) => format!("{} {year}", media.title),
        _ => media.title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::{BypassConditions, DelayProfileSpec, SqliteDelayStore};
    use crate::download::SqliteDownloadStore;
    use crate::indexer::ReleaseProtocol;
    use crate::library::{MediaQualityOverride, MediaSpec, SqliteLibraryStore};
    use crate::quality::{parse_release_title, SqlitePresetStore};
    use crate::testing::{MockDownloadClient, MockIndexer};
    use crate::trust::{BlocklistSpec, SqliteTrustStore, TrustStore};

    struct Harness {
        engine: GrabDecisionEngine,
        indexer: Arc<MockIndexer>,
        client: Arc<MockDownloadClient>,
        library: Arc<SqliteLibraryStore>,
        presets: Arc<SqlitePresetStore>,
        trust: Arc<SqliteTrustStore>,
        delays: Arc<SqliteDelayStore>,
        downloads: Arc<SqliteDownloadStore>,
    }

    fn harness() -> Harness {
        let indexer = Arc::new(MockIndexer::new("idx"));
        let client = Arc::new(MockDownloadClient::new("qbt", ReleaseProtocol::Torrent, 1));
        let library = Arc::new(SqliteLibraryStore::in_memory().unwrap());
        let presets = Arc::new(SqlitePresetStore::in_memory().unwrap());
        let trust = Arc::new(SqliteTrustStore::in_memory().unwrap());
        let delays = Arc::new(SqliteDelayStore::in_memory().unwrap());
        let downloads = Arc::new(SqliteDownloadStore::in_memory().unwrap());

        let engine = GrabDecisionEngine::new(
            vec![indexer.clone()],
            vec![client.clone()],
            library.clone(),
            presets.clone(),
            TrustGate::new(trust.clone()),
            delays.clone(),
            downloads.clone(),
            5,
            12,
        );
        Harness {
            engine,
            indexer,
            client,
            library,
            presets,
            trust,
            delays,
            downloads,
        }
    }

    /// Pins the media item to a built-in preset that never upgrades.
    fn pin_non_upgrading_preset(h: &Harness, media_id: i64) {
        let preset = h
            .presets
            .list()
            .unwrap()
            .into_iter()
            .find(|p| !p.auto_upgrade)
            .unwrap();
        h.library
            .set_override(&MediaQualityOverride {
                media_id,
                preset_id: Some(preset.id),
                monitored: None,
            })
            .unwrap();
    }

    fn add_media(h: &Harness, title: &str) -> MediaItem {
        h.library
            .add_media(&MediaSpec {
                title: title.to_string(),
                year: Some(2020),
                media_type: MediaType::Tv,
                library_id: 1,
                monitored: true,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_decide_grabs_best_candidate() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        h.indexer.set_results(vec![
            MockIndexer::candidate("Some.Show.S01E02.720p.WEB-GRP", "idx"),
            MockIndexer::candidate("Some.Show.S01E02.1080p.WEB-DL.x264-GRP", "idx"),
        ]);

        let decision = h.engine.decide(&media).await.unwrap();
        let Decision::Grabbed { download_id, .. } = decision else {
            panic!("expected a grab, got {decision:?}");
        };

        assert_eq!(
            h.client.submitted(),
            vec!["Some.Show.S01E02.1080p.WEB-DL.x264-GRP".to_string()]
        );
        let download = h.downloads.get_download(download_id).unwrap().unwrap();
        assert_eq!(download.media_id, Some(media.id));
        assert_eq!(download.client_id, "qbt");
        assert_eq!(h.downloads.grabs_for_media(media.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_acceptable_candidate() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        // Both below the default 1080p floor.
        h.indexer.set_results(vec![
            MockIndexer::candidate("Some.Show.S01E02.720p.WEB-GRP", "idx"),
            MockIndexer::candidate("Some.Show.S01E02.480p.WEB-GRP", "idx"),
        ]);

        let decision = h.engine.decide(&media).await.unwrap();
        assert_eq!(
            decision,
            Decision::NoCandidate {
                searched: 2,
                rejected: 2
            }
        );
        assert!(h.client.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_blocklisted_candidate_refused() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        let title = "Some.Show.S01E02.1080p.WEB-GRP";
        h.trust
            .add_blocklist_entry(&BlocklistSpec {
                release_title: title.to_string(),
                release_group: None,
                indexer_id: None,
                media_id: None,
                reason: "manual".to_string(),
                expires_at: None,
            })
            .unwrap();
        h.indexer
            .set_results(vec![MockIndexer::candidate(title, "idx")]);

        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::NoCandidate { rejected: 1, .. }));
    }

    #[tokio::test]
    async fn test_trusted_group_wins_tie() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        h.trust.trust_group("GOODGRP").unwrap();
        h.indexer.set_results(vec![
            MockIndexer::candidate("Some.Show.S01E02.1080p.WEB-OTHER", "idx"),
            MockIndexer::candidate("Some.Show.S01E02.1080p.WEB-GOODGRP", "idx"),
        ]);

        h.engine.decide(&media).await.unwrap();
        assert_eq!(
            h.client.submitted(),
            vec!["Some.Show.S01E02.1080p.WEB-GOODGRP".to_string()]
        );
    }

    fn in_flight(h: &Harness, media_id: i64, title: &str) -> Download {
        h.downloads
            .create_download(&NewDownload {
                media_id: Some(media_id),
                client_id: "qbt".to_string(),
                external_job_id: "job".to_string(),
                release_title: title.to_string(),
                indexer_id: "idx".to_string(),
                protocol: ReleaseProtocol::Torrent,
                score: 1500,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_active_download_suppresses_grab() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        pin_non_upgrading_preset(&h, media.id);
        in_flight(&h, media.id, "Some.Show.S01E02.1080p.WEB-GRP");
        h.indexer.set_results(vec![MockIndexer::candidate(
            "Some.Show.S01E02.1080p.WEB-GRP",
            "idx",
        )]);

        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::Skipped { .. }));
        assert!(h.client.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_upgrade_supersedes_in_flight_download() {
        // The default preset auto-upgrades: a much better release
        // cancels the download still fetching and takes its place.
        let h = harness();
        let media = add_media(&h, "Some Show");
        let old = in_flight(&h, media.id, "Some.Show.S01E02.720p.WEB-GRP");
        h.indexer.set_results(vec![MockIndexer::candidate(
            "Some.Show.S01E02.1080p.WEB-DL.x264-OTHER",
            "idx",
        )]);

        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::Grabbed { .. }));

        assert!(h.client.was_cancelled());
        assert_eq!(
            h.client.submitted(),
            vec!["Some.Show.S01E02.1080p.WEB-DL.x264-OTHER".to_string()]
        );
        let old = h.downloads.get_download(old.id).unwrap().unwrap();
        assert_eq!(old.status, DownloadStatus::Superseded);
        assert!(h
            .downloads
            .grabs_for_media(media.id)
            .unwrap()
            .iter()
            .any(|g| g.status == GrabStatus::Superseded));
    }

    #[tokio::test]
    async fn test_in_flight_download_raises_upgrade_bar() {
        // Auto-upgrade or not, a candidate no better than what is
        // already downloading never supersedes it.
        let h = harness();
        let media = add_media(&h, "Some Show");
        let old = in_flight(&h, media.id, "Some.Show.S01E02.1080p.WEB-DL.x264-GRP");
        h.indexer.set_results(vec![MockIndexer::candidate(
            "Some.Show.S01E02.1080p.WEB-DL.x265-OTHER",
            "idx",
        )]);

        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::NoCandidate { .. }));
        assert!(h.client.submitted().is_empty());
        let old = h.downloads.get_download(old.id).unwrap().unwrap();
        assert_eq!(old.status, DownloadStatus::Downloading);
    }

    #[tokio::test]
    async fn test_unmatched_download_never_superseded() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        let old = in_flight(&h, media.id, "Some.Show.S01E02.720p.WEB-GRP");
        h.downloads
            .transition(old.id, &DownloadStatus::Unmatched)
            .unwrap();
        h.indexer.set_results(vec![MockIndexer::candidate(
            "Some.Show.S01E02.1080p.WEB-DL.x264-OTHER",
            "idx",
        )]);

        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::Skipped { .. }));
        assert!(h.client.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_upgrade_needs_clear_margin() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        let current = parse_release_title("Some.Show.S01E02.1080p.WEB-DL.x264-GRP");
        h.library
            .upsert_status(media.id, Some(&current), true, false)
            .unwrap();

        // Same resolution and source, not enough of an improvement.
        h.indexer.set_results(vec![MockIndexer::candidate(
            "Some.Show.S01E02.1080p.WEB-DL.x265-OTHER",
            "idx",
        )]);
        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::NoCandidate { .. }));
    }

    #[tokio::test]
    async fn test_below_floor_file_gets_upgraded() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        let current = parse_release_title("Some.Show.S01E02.720p.WEB-GRP");
        h.library
            .upsert_status(media.id, Some(&current), false, true)
            .unwrap();

        h.indexer.set_results(vec![MockIndexer::candidate(
            "Some.Show.S01E02.1080p.WEB-DL.x264-OTHER",
            "idx",
        )]);
        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::Grabbed { .. }));
    }

    #[tokio::test]
    async fn test_delay_profile_defers_then_promotes() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        h.delays
            .create_profile(&DelayProfileSpec {
                name: "default".to_string(),
                enabled: true,
                delay_minutes: 30,
                library_id: None,
                bypass: None,
            })
            .unwrap();
        h.indexer.set_results(vec![MockIndexer::candidate(
            "Some.Show.S01E02.1080p.WEB-GRP",
            "idx",
        )]);

        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::Deferred { .. }));
        assert!(h.client.submitted().is_empty());
        assert_eq!(h.delays.list_pending().unwrap().len(), 1);

        // Not eligible yet.
        assert_eq!(h.engine.promote_pending(Utc::now()).await.unwrap(), 0);

        let later = Utc::now() + chrono::Duration::minutes(31);
        assert_eq!(h.engine.promote_pending(later).await.unwrap(), 1);
        assert_eq!(
            h.client.submitted(),
            vec!["Some.Show.S01E02.1080p.WEB-GRP".to_string()]
        );
        assert!(h.delays.list_pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bypass_condition_skips_delay() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        h.delays
            .create_profile(&DelayProfileSpec {
                name: "default".to_string(),
                enabled: true,
                delay_minutes: 30,
                library_id: None,
                bypass: Some(BypassConditions {
                    resolution_at_least: Some(crate::quality::Resolution::R2160p),
                    source_at_least: None,
                    score_above: None,
                }),
            })
            .unwrap();
        h.indexer.set_results(vec![MockIndexer::candidate(
            "Some.Show.S01E02.2160p.WEB-GRP",
            "idx",
        )]);

        let decision = h.engine.decide(&media).await.unwrap();
        assert!(matches!(decision, Decision::Grabbed { .. }));
    }

    #[tokio::test]
    async fn test_promotion_rechecks_trust_gate() {
        let h = harness();
        let media = add_media(&h, "Some Show");
        let title = "Some.Show.S01E02.1080p.WEB-GRP";
        h.delays
            .create_profile(&DelayProfileSpec {
                name: "default".to_string(),
                enabled: true,
                delay_minutes: 30,
                library_id: None,
                bypass: None,
            })
            .unwrap();
        h.indexer
            .set_results(vec![MockIndexer::candidate(title, "idx")]);
        h.engine.decide(&media).await.unwrap();

        // Blocklisted while waiting out the delay.
        h.trust
            .add_blocklist_entry(&BlocklistSpec {
                release_title: title.to_string(),
                release_group: None,
                indexer_id: None,
                media_id: None,
                reason: "failed elsewhere".to_string(),
                expires_at: None,
            })
            .unwrap();

        let later = Utc::now() + chrono::Duration::minutes(31);
        assert_eq!(h.engine.promote_pending(later).await.unwrap(), 0);
        assert!(h.client.submitted().is_empty());
        assert!(h.delays.list_pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_pass_respects_backoff() {
        let h = harness();
        add_media(&h, "Some Show");
        h.indexer.set_results(vec![]);

        let first = h.engine.search_pass().await.unwrap();
        assert_eq!(first.searched, 1);

        // Searched moments ago, inside the backoff window.
        let second = h.engine.search_pass().await.unwrap();
        assert_eq!(second.searched, 0);
    }
}
