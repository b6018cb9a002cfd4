use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetcharr_core::delay::{DelayStore, SqliteDelayStore};
use fetcharr_core::download::{DownloadStore, DownloadTracker, SqliteDownloadStore};
use fetcharr_core::import::{ImportPipeline, ImportStore, SqliteImportStore};
use fetcharr_core::indexer::build_indexers;
use fetcharr_core::library::{LibraryStore, SqliteLibraryStore};
use fetcharr_core::quality::{PresetStore, SqlitePresetStore};
use fetcharr_core::trust::{SqliteTrustStore, TrustGate, TrustManager, TrustStore};
use fetcharr_core::{downloader::build_clients, load_config, GrabDecisionEngine, Scheduler};

use fetcharr_server::api::create_router;
use fetcharr_server::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Config path from env or the first CLI argument; defaults plus
    // FETCHARR_* env overrides when neither is given.
    let config_path = std::env::var("FETCHARR_CONFIG")
        .map(PathBuf::from)
        .ok()
        .or_else(|| std::env::args().nth(1).map(PathBuf::from));

    let config = load_config(config_path.as_deref())
        .with_context(|| format!("failed to load config from {config_path:?}"))?;

    // Hash for the startup log so deployed configs can be compared
    // without printing secrets.
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        database = %config.database.path.display(),
        "starting fetcharr"
    );

    if let Some(parent) = config.database.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let db_path = &config.database.path;
    let library: Arc<dyn LibraryStore> = Arc::new(
        SqliteLibraryStore::new(db_path).context("failed to open library store")?,
    );
    let presets: Arc<dyn PresetStore> = Arc::new(
        SqlitePresetStore::new(db_path).context("failed to open preset store")?,
    );
    let trust_store: Arc<dyn TrustStore> =
        Arc::new(SqliteTrustStore::new(db_path).context("failed to open trust store")?);
    let delays: Arc<dyn DelayStore> =
        Arc::new(SqliteDelayStore::new(db_path).context("failed to open delay store")?);
    let downloads: Arc<dyn DownloadStore> = Arc::new(
        SqliteDownloadStore::new(db_path).context("failed to open download store")?,
    );
    let imports: Arc<dyn ImportStore> = Arc::new(
        SqliteImportStore::new(db_path).context("failed to open import history store")?,
    );

    let indexers = build_indexers(&config.indexers).context("failed to build indexers")?;
    let clients =
        build_clients(&config.download_clients).context("failed to build download clients")?;
    info!(
        indexers = indexers.len(),
        clients = clients.len(),
        "external services configured"
    );

    let trust_manager = Arc::new(TrustManager::new(
        Arc::clone(&trust_store),
        config.acquisition.group_failure_threshold,
        config.acquisition.failure_blocklist_ttl_hours,
    ));

    let importer = Arc::new(ImportPipeline::new(
        &config.import,
        Arc::clone(&library),
        Arc::clone(&presets),
        Arc::clone(&downloads),
        Arc::clone(&imports),
    ));

    let tracker = Arc::new(DownloadTracker::new(
        Arc::clone(&downloads),
        clients.clone(),
        Arc::clone(&trust_manager),
        importer,
        config.acquisition.stall_timeout_secs,
        config.acquisition.retry_threshold,
    ));

    let engine = Arc::new(GrabDecisionEngine::new(
        indexers,
        clients,
        Arc::clone(&library),
        Arc::clone(&presets),
        TrustGate::new(Arc::clone(&trust_store)),
        Arc::clone(&delays),
        Arc::clone(&downloads),
        config.acquisition.indexer_timeout_secs,
        config.acquisition.search_backoff_hours,
    ));

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&engine),
        tracker,
        trust_manager,
        config.scheduler.clone(),
    ));
    scheduler.start();

    let state = Arc::new(AppState::new(
        config.clone(),
        library,
        presets,
        trust_store,
        delays,
        downloads,
        imports,
        engine,
        Arc::clone(&scheduler),
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down");
    scheduler.stop();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
