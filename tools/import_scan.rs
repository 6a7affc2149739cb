use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use library::{
    prepare_root, CatalogStore, IndexOptions, Indexer, PathCache, RedbCatalog, TracingReporter,
};
use metadata::LoftyReader;
use tracing_subscriber::EnvFilter;

const DEFAULT_EXTENSIONS: &str = "mp3,flac,ogg,m4a,wav";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let music_root = args
        .next()
        .or_else(|| env::var("MUSIC_ROOT").ok())
        .ok_or("MUSIC_ROOT not set and no path argument")?;
    let index_path = args
        .next()
        .or_else(|| env::var("INDEX_PATH").ok())
        .unwrap_or_else(|| "data/catalog.redb".to_string());
    let cache_path = env::var("CACHE_PATH").unwrap_or_else(|_| "data/indexer-cache".to_string());
    let extensions = env::var("EXTENSIONS").unwrap_or_else(|_| DEFAULT_EXTENSIONS.to_string());

    let root = prepare_root(Path::new(&music_root))?;
    let options = IndexOptions::new(extensions.split(','), ["@eaDir"]);
    if options.extensions.is_empty() {
        return Err("EXTENSIONS lists no file extensions".into());
    }

    let index_path = PathBuf::from(index_path);
    if let Some(parent) = index_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let catalog = Arc::new(RedbCatalog::open(&index_path)?);
    let indexer = Indexer::new(
        catalog.clone(),
        Arc::new(LoftyReader),
        PathCache::open(cache_path)?,
        Arc::new(TracingReporter),
        options,
    );

    let summary = indexer.run(&[root]);
    let stats = catalog.stats()?;

    println!(
        "Indexed {} songs ({} cached, {} failed); catalog holds {} directories, {} artists, {} albums, {} songs",
        summary.songs_indexed,
        summary.cached,
        summary.failed,
        stats.directories,
        stats.artists,
        stats.albums,
        stats.songs
    );

    Ok(())
}
