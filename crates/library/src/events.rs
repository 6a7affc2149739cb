use std::fmt;

use parking_lot::Mutex;
use tracing::{error, info, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum IndexEvent {
    RootIndexed { name: String },
    RootAlreadyIndexed { name: String },
    RootFailed { name: String, error: String },
    DirectoryBlacklisted { path: String },
    DirectoryIndexed { path: String },
    DirectoryAlreadyIndexed { path: String },
    DirectoryCached { path: String },
    DirectoryFailed { path: String, error: String },
    SongPoorMetadata { path: String },
    SongIndexed { path: String, song_id: String },
    SongAlreadyIndexed { path: String },
    SongCached { path: String },
    SongFailed { path: String, error: String },
    FileSkipped { path: String },
    SymlinkSkipped { path: String },
    WalkFailed { path: String, error: String },
    RunFinished { roots: usize, elapsed_secs: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl IndexEvent {
    pub fn severity(&self) -> Severity {
        match self {
            IndexEvent::RootFailed { .. }
            | IndexEvent::DirectoryFailed { .. }
            | IndexEvent::SongFailed { .. }
            | IndexEvent::WalkFailed { .. } => Severity::Error,
            IndexEvent::SongPoorMetadata { .. } | IndexEvent::SymlinkSkipped { .. } => {
                Severity::Warn
            }
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for IndexEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexEvent::RootIndexed { name } => write!(f, "Root directory indexed: {}", name),
            IndexEvent::RootAlreadyIndexed { name } => {
                write!(f, "Root directory already indexed: {}", name)
            }
            IndexEvent::RootFailed { name, error } => {
                write!(f, "Root directory not indexed: {}. {}", name, error)
            }
            IndexEvent::DirectoryBlacklisted { path } => {
                write!(f, "Directory blacklisted ignored: {}", path)
            }
            IndexEvent::DirectoryIndexed { path } => write!(f, "Directory created: {}", path),
            IndexEvent::DirectoryAlreadyIndexed { path } => {
                write!(f, "Directory already indexed: {}", path)
            }
            IndexEvent::DirectoryCached { path } => write!(f, "Directory already cached: {}", path),
            IndexEvent::DirectoryFailed { path, error } => {
                write!(f, "Directory not created: {}. {}", path, error)
            }
            IndexEvent::SongPoorMetadata { path } => write!(f, "Song has poor metadata: {}", path),
            IndexEvent::SongIndexed { path, song_id } => {
                write!(f, "Song indexed: {} - {}", song_id, path)
            }
            IndexEvent::SongAlreadyIndexed { path } => write!(f, "Song already indexed: {}", path),
            IndexEvent::SongCached { path } => write!(f, "Song already cached: {}", path),
            IndexEvent::SongFailed { path, error } => {
                write!(f, "Song not indexed: {}. {}", path, error)
            }
            IndexEvent::FileSkipped { path } => write!(f, "File skipped: {}", path),
            IndexEvent::SymlinkSkipped { path } => write!(f, "Symbolic link ignored: {}", path),
            IndexEvent::WalkFailed { path, error } => {
                write!(f, "Cannot read entry: {}. {}", path, error)
            }
            IndexEvent::RunFinished {
                roots,
                elapsed_secs,
            } => write!(
                f,
                "Indexing finished: {} root directories in {} seconds",
                roots, elapsed_secs
            ),
        }
    }
}

pub trait IndexReporter: Send + Sync {
    fn report(&self, event: &IndexEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl IndexReporter for TracingReporter {
    fn report(&self, event: &IndexEvent) {
        match event.severity() {
            Severity::Info => info!(target: "indexer", "{}", event),
            Severity::Warn => warn!(target: "indexer", "{}", event),
            Severity::Error => error!(target: "indexer", "{}", event),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<IndexEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<IndexEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<IndexEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl IndexReporter for MemoryReporter {
    fn report(&self, event: &IndexEvent) {
        self.events.lock().push(event.clone());
    }
}
