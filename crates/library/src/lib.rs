pub mod cache;
pub mod catalog;
pub mod dedup;
pub mod events;
pub mod ingest;
pub mod walker;

pub use cache::PathCache;
pub use catalog::{CatalogStats, CatalogStore, RedbCatalog};
pub use dedup::{find_or_create_album, find_or_create_artist, find_or_create_directory, Upserted};
pub use events::{IndexEvent, IndexReporter, MemoryReporter, TracingReporter};
pub use ingest::{validate_metadata, SongIngestor, Validation};
pub use walker::{normalize_root, prepare_root, IndexOptions, Indexer, WalkSummary};

use metadata::MetadataError;
use redb::{CommitError, DatabaseError, StorageError, TableError, TransactionError};

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Metadata(MetadataError),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
    InvalidMetadata(String),
    InvalidRoot(std::path::PathBuf),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Metadata(err) => write!(f, "metadata error: {}", err),
            LibraryError::Redb(err) => write!(f, "db error: {}", err),
            LibraryError::Bincode(err) => write!(f, "bincode error: {}", err),
            LibraryError::InvalidMetadata(name) => write!(f, "invalid metadata {}", name),
            LibraryError::InvalidRoot(path) => {
                write!(f, "directory is not readable: {}", path.display())
            }
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<MetadataError> for LibraryError {
    fn from(err: MetadataError) -> Self {
        LibraryError::Metadata(err)
    }
}

impl From<redb::Error> for LibraryError {
    fn from(err: redb::Error) -> Self {
        LibraryError::Redb(err)
    }
}

impl From<DatabaseError> for LibraryError {
    fn from(err: DatabaseError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<TableError> for LibraryError {
    fn from(err: TableError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<TransactionError> for LibraryError {
    fn from(err: TransactionError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<StorageError> for LibraryError {
    fn from(err: StorageError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<CommitError> for LibraryError {
    fn from(err: CommitError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for LibraryError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LibraryError::Bincode(err)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use metadata::{AudioMetadata, CommonTags, FormatInfo, MetadataError, MetadataReader};
    use parking_lot::Mutex;

    // unknown paths fail like an unreadable file
    #[derive(Default)]
    pub struct FakeReader {
        entries: Mutex<HashMap<PathBuf, AudioMetadata>>,
    }

    impl FakeReader {
        pub fn insert(&self, path: &Path, metadata: AudioMetadata) {
            self.entries.lock().insert(path.to_path_buf(), metadata);
        }
    }

    impl MetadataReader for FakeReader {
        fn read(&self, path: &Path) -> Result<AudioMetadata, MetadataError> {
            self.entries.lock().get(path).cloned().ok_or_else(|| {
                MetadataError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "no tags",
                ))
            })
        }
    }

    pub fn tagged(artist: &str, title: &str, album: &str, duration: f64) -> AudioMetadata {
        AudioMetadata {
            common: CommonTags {
                artist: Some(artist.to_string()),
                title: Some(title.to_string()),
                album: Some(album.to_string()),
            },
            format: FormatInfo {
                codec: Some("MPEG".to_string()),
                duration_secs: Some(duration),
            },
        }
    }

    pub fn untagged(duration: Option<f64>) -> AudioMetadata {
        AudioMetadata {
            common: CommonTags::default(),
            format: FormatInfo {
                codec: None,
                duration_secs: duration,
            },
        }
    }
}
