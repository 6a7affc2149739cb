use std::sync::Arc;
use std::time::SystemTime;

use axum::http::StatusCode;
use axum::Json;
use library::{CatalogStore, WalkSummary};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub config: Arc<ServerConfig>,
    pub index_status: Arc<RwLock<IndexStatus>>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: ServerConfig) -> Self {
        Self {
            catalog,
            config: Arc::new(config),
            index_status: Arc::new(RwLock::new(IndexStatus::Idle)),
        }
    }
}

#[derive(Clone, Debug)]
pub enum IndexStatus {
    Idle,
    Indexing { started: SystemTime },
    Ready { summary: WalkSummary, elapsed_secs: u64 },
    Error(String),
}

impl IndexStatus {
    pub fn label(&self) -> &'static str {
        match self {
            IndexStatus::Idle => "idle",
            IndexStatus::Indexing { .. } => "indexing",
            IndexStatus::Ready { .. } => "ready",
            IndexStatus::Error(_) => "error",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct IndexStatusResponse {
    pub status: &'static str,
    pub message: Option<String>,
    pub directories: Option<u64>,
    pub artists: Option<u64>,
    pub albums: Option<u64>,
    pub songs: Option<u64>,
    pub last_run: Option<RunSummaryResponse>,
    pub roots: Vec<String>,
    pub indexing_enabled: bool,
}

#[derive(Serialize)]
pub struct RunSummaryResponse {
    pub directories_indexed: usize,
    pub directories_existing: usize,
    pub songs_indexed: usize,
    pub songs_existing: usize,
    pub cached: usize,
    pub skipped: usize,
    pub blacklisted: usize,
    pub failed: usize,
    pub elapsed_secs: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DirectoryRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SongView {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub duration_secs: f64,
    pub codec: String,
    pub artist_id: String,
    pub artist: Option<String>,
    pub album_id: String,
    pub album: Option<String>,
    pub directory_id: String,
}

#[derive(Debug, Serialize)]
pub struct DirectoryContent {
    pub id: String,
    pub name: String,
    pub root: bool,
    pub parent_id: Option<String>,
    pub children: Vec<DirectoryRef>,
    pub songs: Vec<SongView>,
}

#[derive(Debug, Deserialize)]
pub struct SongQuery {
    pub song_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub directory_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub limit: Option<usize>,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
