use super::fs::{find_video_file, try_atomic_move};
use super::naming::{NamingTemplates, NamingTokens};
use super::store::ImportStore;
use super::types::{ImportError, ImportHistory};
use crate::config::ImportConfig;
use crate::download::{Download, DownloadStatus, DownloadStore, GrabStatus};
use crate::library::{LibraryStore, MediaItem};
use crate::metrics;
use crate::quality::{
    parse_episode_ids, parse_release_title, MediaType, PresetStore, QualityAttrs, QualityPreset,
    Source,
};
use crate::scoring::score_attrs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Moves completed payloads into the library and keeps quality status
/// and history in step.
pub struct ImportPipeline {
    library: Arc<dyn LibraryStore>,
    presets: Arc<dyn PresetStore>,
    downloads: Arc<dyn DownloadStore>,
    history: Arc<dyn ImportStore>,
    templates: NamingTemplates,
    movie_dir: PathBuf,
    tv_dir: PathBuf,
}

impl ImportPipeline {
    pub fn new(
        config: &ImportConfig,
        library: Arc<dyn LibraryStore>,
        presets: Arc<dyn PresetStore>,
        downloads: Arc<dyn DownloadStore>,
        history: Arc<dyn ImportStore>,
    ) -> Self {
        Self {
            library,
            presets,
            downloads,
            history,
            templates: NamingTemplates::from_config(config),
            movie_dir: config.movie_dir.clone(),
            tv_dir: config.tv_dir.clone(),
        }
    }

    /// The preset governing a media item: its override, or the default.
    pub fn effective_preset(&self, media_id: i64) -> Result<QualityPreset, ImportError> {
        if let Some(ovr) = self.library.get_override(media_id)? {
            if let Some(preset_id) = ovr.preset_id {
                if let Some(preset) = self.presets.get(preset_id)? {
                    return Ok(preset);
                }
                warn!(media_id, preset_id, "override points at missing preset, using default");
            }
        }
        Ok(self.presets.default_preset()?)
    }

    /// Imports a completed download. On failure the download is failed
    /// and the attempt is still recorded in import history.
    pub fn import(&self, download: &Download) -> Result<ImportHistory, ImportError> {
        let media_id = match download.media_id {
            Some(id) => id,
            None => {
                self.downloads
                    .transition(download.id, &DownloadStatus::Unmatched)?;
                warn!(download_id = download.id, title = %download.release_title,
                      "completed download matches no media item");
                return Err(ImportError::MediaNotFound(0));
            }
        };

        self.downloads
            .transition(download.id, &DownloadStatus::Importing)?;

        match self.run(download, media_id) {
            Ok((source, dest)) => {
                let record = self.history.record(
                    download.id,
                    media_id,
                    &source.display().to_string(),
                    &dest.display().to_string(),
                    true,
                    None,
                )?;
                self.downloads.transition(
                    download.id,
                    &DownloadStatus::Imported {
                        path: dest.display().to_string(),
                    },
                )?;
                self.downloads
                    .set_grab_status(download.id, GrabStatus::Imported)?;
                metrics::IMPORTS_TOTAL.with_label_values(&["success"]).inc();
                info!(download_id = download.id, dest = %dest.display(), "import complete");
                Ok(record)
            }
            Err(e) => {
                let source = download.download_path.clone().unwrap_or_default();
                self.history.record(
                    download.id,
                    media_id,
                    &source,
                    "",
                    false,
                    Some(&e.to_string()),
                )?;
                self.downloads.transition(
                    download.id,
                    &DownloadStatus::Failed {
                        error: e.to_string(),
                    },
                )?;
                self.downloads
                    .set_grab_status(download.id, GrabStatus::Failed)?;
                metrics::IMPORTS_TOTAL.with_label_values(&["failed"]).inc();
                warn!(download_id = download.id, error = %e, "import failed");
                Err(e)
            }
        }
    }

    fn run(&self, download: &Download, media_id: i64) -> Result<(PathBuf, PathBuf), ImportError> {
        let media = self
            .library
            .get_media(media_id)?
            .ok_or(ImportError::MediaNotFound(media_id))?;
        let payload = download
            .download_path
            .as_deref()
            .ok_or(ImportError::MissingPath)?;
        let video = find_video_file(std::path::Path::new(payload))?;

        let preset = self.effective_preset(media_id)?;
        let attrs = parse_release_title(&download.release_title);
        let dest = self.destination(&media, &attrs, &download.release_title, &video)?;

        if dest.exists() {
            self.resolve_collision(&media, &preset, &attrs, &dest)?;
        }

        try_atomic_move(&video, &dest)?;

        let target_met = meets_target(&preset, &attrs);
        self.library
            .upsert_status(media_id, Some(&attrs), target_met, !target_met)?;

        Ok((video, dest))
    }

    fn destination(
        &self,
        media: &MediaItem,
        attrs: &QualityAttrs,
        release_title: &str,
        video: &std::path::Path,
    ) -> Result<PathBuf, ImportError> {
        let ids = parse_episode_ids(release_title);
        let relative = self.templates.render(
            media.media_type,
            &NamingTokens {
                title: media.title.clone(),
                year: media.year,
                season: ids.season,
                episode: ids.episode,
                air_date: ids.air_date,
                quality: attrs.quality_label(),
            },
        )?;
        let root = match media.media_type {
            MediaType::Movie => &self.movie_dir,
            MediaType::Tv | MediaType::Anime => &self.tv_dir,
        };
        let extension = video
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mkv");
        Ok(root.join(format!("{relative}.{extension}")))
    }

    /// An existing destination file is only removed for a recognized
    /// upgrade under a preset that allows replacing the old file.
    fn resolve_collision(
        &self,
        media: &MediaItem,
        preset: &QualityPreset,
        new_attrs: &QualityAttrs,
        dest: &std::path::Path,
    ) -> Result<(), ImportError> {
        if !preset.upgrade_delete_old {
            return Err(ImportError::DestinationExists(dest.display().to_string()));
        }
        let old_attrs = self
            .library
            .get_status(media.id)?
            .and_then(|status| status.attrs);
        let new_score = score_attrs(preset, new_attrs);
        let old_score = old_attrs.map(|a| score_attrs(preset, &a)).unwrap_or(-1);
        if new_score > old_score {
            info!(media_id = media.id, dest = %dest.display(), "replacing old file for upgrade");
            std::fs::remove_file(dest)?;
            Ok(())
        } else {
            Err(ImportError::DestinationExists(dest.display().to_string()))
        }
    }
}

fn meets_target(preset: &QualityPreset, attrs: &QualityAttrs) -> bool {
    let resolution_ok = attrs
        .resolution
        .is_some_and(|r| r >= preset.resolution);
    let source_ok = preset.source == Source::Any
        || attrs.source.is_some_and(|s| s >= preset.source);
    resolution_ok && source_ok
}
