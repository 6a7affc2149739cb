use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use library::{
    CatalogStore, IndexOptions, Indexer, LibraryError, PathCache, TracingReporter, WalkSummary,
};
use metadata::LoftyReader;
use tracing::{info, warn};

use crate::state::{AppState, IndexStatus};

#[derive(Clone, Debug)]
pub struct IndexJob {
    pub roots: Vec<PathBuf>,
    pub options: IndexOptions,
    pub cache_path: PathBuf,
}

pub fn start_index(state: AppState, job: IndexJob) -> bool {
    let started = SystemTime::now();
    {
        let mut guard = state.index_status.write();
        if matches!(*guard, IndexStatus::Indexing { .. }) {
            warn!("Indexing already in progress");
            return false;
        }
        *guard = IndexStatus::Indexing { started };
    }
    info!("Indexing started for {} root directories", job.roots.len());

    tokio::spawn(async move {
        let catalog = Arc::clone(&state.catalog);
        let result = tokio::task::spawn_blocking(move || run_index(catalog, job)).await;
        let result = match result {
            Ok(result) => result.map_err(|err| err.to_string()),
            Err(err) => Err(format!("join error: {}", err)),
        };
        finish_index(&state, started, result);
    });
    true
}

pub fn run_index(
    catalog: Arc<dyn CatalogStore>,
    job: IndexJob,
) -> Result<WalkSummary, LibraryError> {
    let cache = PathCache::open(&job.cache_path)?;
    let indexer = Indexer::new(
        catalog,
        Arc::new(LoftyReader),
        cache,
        Arc::new(TracingReporter),
        job.options,
    );
    Ok(indexer.run(&job.roots))
}

fn finish_index(state: &AppState, started: SystemTime, result: Result<WalkSummary, String>) {
    let elapsed_secs = started.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    let status = match result {
        Ok(summary) => {
            info!(
                "Indexing done: {} songs indexed, {} directories indexed, {} cached, {} failed",
                summary.songs_indexed, summary.directories_indexed, summary.cached, summary.failed
            );
            IndexStatus::Ready {
                summary,
                elapsed_secs,
            }
        }
        Err(message) => {
            warn!("Indexing failed: {}", message);
            IndexStatus::Error(message)
        }
    };
    *state.index_status.write() = status;
}
