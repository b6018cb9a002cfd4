//! In-process test fixture: the full router wired to in-memory stores
//! and scriptable indexer/client mocks.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use fetcharr_core::delay::{DelayStore, SqliteDelayStore};
use fetcharr_core::download::{DownloadStore, DownloadTracker, SqliteDownloadStore};
use fetcharr_core::downloader::DownloadClient;
use fetcharr_core::import::{ImportPipeline, ImportStore, SqliteImportStore};
use fetcharr_core::indexer::{Indexer, ReleaseProtocol};
use fetcharr_core::library::{LibraryStore, SqliteLibraryStore};
use fetcharr_core::quality::{PresetStore, SqlitePresetStore};
use fetcharr_core::testing::{MockDownloadClient, MockIndexer};
use fetcharr_core::trust::{SqliteTrustStore, TrustGate, TrustManager, TrustStore};
use fetcharr_core::{Config, GrabDecisionEngine, Scheduler};

use fetcharr_server::api::create_router;
use fetcharr_server::state::AppState;

pub struct TestFixture {
    pub router: Router,
    pub indexer: Arc<MockIndexer>,
    pub client: Arc<MockDownloadClient>,
    _temp_dir: TempDir,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let movie_dir = temp_dir.path().join("movies");
        let tv_dir = temp_dir.path().join("tv");
        std::fs::create_dir_all(&movie_dir).unwrap();
        std::fs::create_dir_all(&tv_dir).unwrap();

        let config: Config = serde_json::from_value(json!({
            "import": {
                "movie_dir": movie_dir,
                "tv_dir": tv_dir,
            }
        }))
        .unwrap();

        let library: Arc<dyn LibraryStore> = Arc::new(SqliteLibraryStore::in_memory().unwrap());
        let presets: Arc<dyn PresetStore> = Arc::new(SqlitePresetStore::in_memory().unwrap());
        let trust_store: Arc<dyn TrustStore> = Arc::new(SqliteTrustStore::in_memory().unwrap());
        let delays: Arc<dyn DelayStore> = Arc::new(SqliteDelayStore::in_memory().unwrap());
        let downloads: Arc<dyn DownloadStore> =
            Arc::new(SqliteDownloadStore::in_memory().unwrap());
        let imports: Arc<dyn ImportStore> = Arc::new(SqliteImportStore::in_memory().unwrap());

        let indexer = Arc::new(MockIndexer::new("mock-indexer"));
        let client = Arc::new(MockDownloadClient::new(
            "mock-client",
            ReleaseProtocol::Torrent,
            1,
        ));
        let indexers: Vec<Arc<dyn Indexer>> = vec![indexer.clone()];
        let clients: Vec<Arc<dyn DownloadClient>> = vec![client.clone()];

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
        // Not started: tests drive tasks through the trigger endpoint.
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&engine),
            tracker,
            trust_manager,
            config.scheduler.clone(),
        ));

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&library),
            presets,
            trust_store,
            delays,
            Arc::clone(&downloads),
            imports,
            engine,
            scheduler,
        ));

        Self {
            router: create_router(state),
            indexer,
            client,
            _temp_dir: temp_dir,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        let body = if let Some(json_body) = body {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };

        TestResponse { status, body }
    }
}
