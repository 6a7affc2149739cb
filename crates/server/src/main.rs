mod api;
mod config;
mod range;
mod scan;
mod state;
mod streaming;
mod utils;

use std::sync::Arc;

use axum::Router;
use api::api_router;
use config::{config_path_from_env, load_or_create_config, resolve_directories, resolve_path, ConfigError};
use library::{IndexOptions, RedbCatalog};
use scan::{start_index, IndexJob};
use state::AppState;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let roots = match resolve_directories(&config_path, &config) {
        Ok(roots) => roots,
        Err(ConfigError::MissingDirectories) => {
            warn!("No directories configured; add some to {:?} to index them.", config_path);
            Vec::new()
        }
        Err(err) => return Err(err.into()),
    };

    let index_path = resolve_path(&config_path, &config.index_path);
    if let Some(parent) = index_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let catalog = RedbCatalog::open(&index_path)?;
    info!("Catalog opened at {:?}", index_path);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let job = IndexJob {
        roots,
        options: IndexOptions::new(&config.file_extensions, &config.blacklist),
        cache_path: resolve_path(&config_path, &config.cache_path),
    };
    let enable_indexing = config.enable_indexing;
    let state = AppState::new(Arc::new(catalog), config);

    if !enable_indexing {
        info!("Indexing disabled in config.");
    } else if !job.roots.is_empty() {
        start_index(state.clone(), job);
    }

    let app = Router::new()
        .nest("/api/v1", api_router(state))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
