use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{delay, downloads, handlers, media, presets, tasks, trust};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and system status
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/status", get(handlers::get_status))
        // Library
        .route("/media", post(media::add_media))
        .route("/media", get(media::list_media))
        .route("/media/{id}", get(media::get_media))
        .route("/media/{id}/monitor", post(media::set_monitored))
        .route("/media/{id}/search", post(media::search_media))
        .route("/media/{id}/status", get(media::get_media_status))
        .route("/media/{id}/override", put(media::set_override))
        .route("/media/{id}/override", delete(media::remove_override))
        .route("/media/{id}/grabs", get(downloads::grabs_for_media))
        .route("/search/due", get(media::list_due_for_search))
        // Quality presets
        .route("/presets", post(presets::create_preset))
        .route("/presets", get(presets::list_presets))
        .route("/presets/{id}", get(presets::get_preset))
        .route("/presets/{id}", put(presets::update_preset))
        .route("/presets/{id}", delete(presets::delete_preset))
        .route("/presets/{id}/default", post(presets::set_default_preset))
        .route("/presets/{id}/filters", get(presets::list_filters))
        .route("/presets/{id}/filters", post(presets::add_filter))
        .route(
            "/presets/{id}/filters/{filter_id}",
            delete(presets::delete_filter),
        )
        // Downloads and history
        .route("/downloads", get(downloads::list_downloads))
        .route("/downloads/{id}", get(downloads::get_download))
        .route("/downloads/pending", get(downloads::list_pending))
        .route("/downloads/stalled", get(downloads::list_stalled))
        .route("/history/imports", get(downloads::import_history))
        // Trust: blocklist, groups, exclusions
        .route("/blocklist", get(trust::list_blocklist))
        .route("/blocklist", post(trust::add_blocklist_entry))
        .route("/blocklist/{id}", delete(trust::remove_blocklist_entry))
        .route("/groups/blocked", get(trust::list_blocked_groups))
        .route("/groups/blocked", post(trust::block_group))
        .route("/groups/blocked/{name}", delete(trust::unblock_group))
        .route("/groups/trusted", get(trust::list_trusted_groups))
        .route("/groups/trusted", post(trust::trust_group))
        .route("/groups/trusted/{name}", delete(trust::untrust_group))
        .route("/exclusions", get(trust::list_exclusions))
        .route("/exclusions", post(trust::add_exclusion))
        .route("/exclusions/{id}", delete(trust::remove_exclusion))
        // Delay profiles
        .route("/delay-profiles", get(delay::list_profiles))
        .route("/delay-profiles", post(delay::create_profile))
        .route("/delay-profiles/{id}", put(delay::update_profile))
        .route("/delay-profiles/{id}", delete(delay::delete_profile))
        // Scheduler
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/{name}/trigger", post(tasks::trigger_task))
        .with_state(state);

    Router::new()
        .route("/metrics", get(handlers::get_metrics))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(super::middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
