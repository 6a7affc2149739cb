pub mod browse;
pub mod media;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::state::{AppState, HealthResponse, IndexStatus, IndexStatusResponse, RunSummaryResponse};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/library/status", get(library_status))
        .route("/stream", get(media::stream))
        .route("/cover", get(media::cover))
        .route("/directories/roots", get(browse::list_roots))
        .route("/directories/content", get(browse::directory_content))
        .route("/songs/search", get(browse::search_songs))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn library_status(State(state): State<AppState>) -> Json<IndexStatusResponse> {
    let status = state.index_status.read().clone();
    let stats = state.catalog.stats().ok();

    let (message, last_run) = match &status {
        IndexStatus::Idle => (None, None),
        IndexStatus::Indexing { started } => {
            let secs = started.elapsed().map(|d| d.as_secs()).unwrap_or(0);
            (Some(format!("library indexing in progress for {}s", secs)), None)
        }
        IndexStatus::Ready {
            summary,
            elapsed_secs,
        } => (
            None,
            Some(RunSummaryResponse {
                directories_indexed: summary.directories_indexed,
                directories_existing: summary.directories_existing,
                songs_indexed: summary.songs_indexed,
                songs_existing: summary.songs_existing,
                cached: summary.cached,
                skipped: summary.skipped,
                blacklisted: summary.blacklisted,
                failed: summary.failed,
                elapsed_secs: *elapsed_secs,
            }),
        ),
        IndexStatus::Error(message) => (Some(format!("library error: {}", message)), None),
    };

    Json(IndexStatusResponse {
        status: status.label(),
        message,
        directories: stats.as_ref().map(|s| s.directories),
        artists: stats.as_ref().map(|s| s.artists),
        albums: stats.as_ref().map(|s| s.albums),
        songs: stats.as_ref().map(|s| s.songs),
        last_run,
        roots: state.config.directories.clone(),
        indexing_enabled: state.config.enable_indexing,
    })
}
