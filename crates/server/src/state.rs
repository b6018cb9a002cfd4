use fetcharr_core::acquisition::GrabDecisionEngine;
use fetcharr_core::config::{Config, SanitizedConfig};
use fetcharr_core::delay::DelayStore;
use fetcharr_core::download::DownloadStore;
use fetcharr_core::import::ImportStore;
use fetcharr_core::library::LibraryStore;
use fetcharr_core::quality::PresetStore;
use fetcharr_core::scheduler::Scheduler;
use fetcharr_core::trust::TrustStore;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    library: Arc<dyn LibraryStore>,
    presets: Arc<dyn PresetStore>,
    trust: Arc<dyn TrustStore>,
    delays: Arc<dyn DelayStore>,
    downloads: Arc<dyn DownloadStore>,
    imports: Arc<dyn ImportStore>,
    engine: Arc<GrabDecisionEngine>,
    scheduler: Arc<Scheduler>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        library: Arc<dyn LibraryStore>,
        presets: Arc<dyn PresetStore>,
        trust: Arc<dyn TrustStore>,
        delays: Arc<dyn DelayStore>,
        downloads: Arc<dyn DownloadStore>,
        imports: Arc<dyn ImportStore>,
        engine: Arc<GrabDecisionEngine>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        Self {
            config,
            library,
            presets,
            trust,
            delays,
            downloads,
            imports,
            engine,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn library(&self) -> &dyn LibraryStore {
        self.library.as_ref()
    }

    pub fn presets(&self) -> &dyn PresetStore {
        self.presets.as_ref()
    }

    pub fn trust(&self) -> &dyn TrustStore {
        self.trust.as_ref()
    }

    pub fn delays(&self) -> &dyn DelayStore {
        self.delays.as_ref()
    }

    pub fn downloads(&self) -> &dyn DownloadStore {
        self.downloads.as_ref()
    }

    pub fn imports(&self) -> &dyn ImportStore {
        self.imports.as_ref()
    }

    pub fn engine(&self) -> &GrabDecisionEngine {
        self.engine.as_ref()
    }

    pub fn scheduler(&self) -> &Scheduler {
        self.scheduler.as_ref()
    }
}
