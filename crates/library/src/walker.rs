use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use common::{last_segment, path_string};
use metadata::MetadataReader;
use walkdir::WalkDir;

use crate::cache::PathCache;
use crate::catalog::CatalogStore;
use crate::dedup::find_or_create_directory;
use crate::events::{IndexEvent, IndexReporter};
use crate::ingest::SongIngestor;
use crate::LibraryError;

#[derive(Clone, Debug)]
pub struct IndexOptions {
    pub extensions: Vec<String>,
    pub blacklist: Vec<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".to_string(), "flac".to_string()],
            blacklist: vec!["@eaDir".to_string()],
        }
    }
}

impl IndexOptions {
    pub fn new<E, B>(extensions: E, blacklist: B) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .filter(|ext| !ext.is_empty())
                .collect(),
            blacklist: blacklist
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn accepts_file(&self, path: &Path) -> bool {
        let ext = match path.extension() {
            Some(ext) => ext.to_string_lossy().to_ascii_lowercase(),
            None => return false,
        };
        self.extensions.iter().any(|allowed| *allowed == ext)
    }

    pub fn is_blacklisted(&self, path: &Path) -> bool {
        let lowered = path_string(path).to_lowercase();
        self.blacklist
            .iter()
            .any(|name| lowered.contains(&name.to_lowercase()))
    }
}

pub fn normalize_extension(value: &str) -> String {
    value.trim().trim_start_matches('.').to_ascii_lowercase()
}

// Lexical only: drops `.` and trailing separators, folds `..` into its parent.
pub fn normalize_root(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

pub fn prepare_root(path: &Path) -> Result<PathBuf, LibraryError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let root = normalize_root(&absolute);
    if !root.is_dir() || fs::read_dir(&root).is_err() {
        return Err(LibraryError::InvalidRoot(root));
    }
    Ok(root)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub directories_indexed: usize,
    pub directories_existing: usize,
    pub songs_indexed: usize,
    pub songs_existing: usize,
    pub cached: usize,
    pub skipped: usize,
    pub blacklisted: usize,
    pub failed: usize,
}

impl WalkSummary {
    fn merge(&mut self, other: &WalkSummary) {
        self.directories_indexed += other.directories_indexed;
        self.directories_existing += other.directories_existing;
        self.songs_indexed += other.songs_indexed;
        self.songs_existing += other.songs_existing;
        self.cached += other.cached;
        self.skipped += other.skipped;
        self.blacklisted += other.blacklisted;
        self.failed += other.failed;
    }
}

enum DirectoryOutcome {
    Cached,
    Indexed,
    AlreadyIndexed,
}

enum SongOutcome {
    Cached,
    Indexed(String),
    AlreadyIndexed,
}

pub struct Indexer {
    catalog: Arc<dyn CatalogStore>,
    reader: Arc<dyn MetadataReader>,
    cache: PathCache,
    reporter: Arc<dyn IndexReporter>,
    options: IndexOptions,
}

impl Indexer {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        reader: Arc<dyn MetadataReader>,
        cache: PathCache,
        reporter: Arc<dyn IndexReporter>,
        options: IndexOptions,
    ) -> Self {
        Self {
            catalog,
            reader,
            cache,
            reporter,
            options,
        }
    }

    pub fn run(&self, roots: &[PathBuf]) -> WalkSummary {
        let started = Instant::now();
        let mut summary = WalkSummary::default();
        for root in roots {
            let root_summary = self.walk_root(root);
            summary.merge(&root_summary);
        }
        self.reporter.report(&IndexEvent::RunFinished {
            roots: roots.len(),
            elapsed_secs: started.elapsed().as_secs(),
        });
        summary
    }

    pub fn walk_root(&self, root: &Path) -> WalkSummary {
        let root = normalize_root(root);
        let mut summary = WalkSummary::default();
        self.register_root(&root);

        let mut entries = WalkDir::new(&root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(path_string)
                        .unwrap_or_else(|| path_string(&root));
                    self.reporter.report(&IndexEvent::WalkFailed {
                        path,
                        error: err.to_string(),
                    });
                    summary.failed += 1;
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            if file_type.is_symlink() {
                self.reporter.report(&IndexEvent::SymlinkSkipped {
                    path: path_string(path),
                });
                summary.skipped += 1;
            } else if file_type.is_dir() {
                if self.options.is_blacklisted(path) {
                    entries.skip_current_dir();
                    self.reporter.report(&IndexEvent::DirectoryBlacklisted {
                        path: path_string(path),
                    });
                    summary.blacklisted += 1;
                    continue;
                }
                self.visit_directory(path, &mut summary);
            } else if file_type.is_file() {
                self.visit_file(path, &mut summary);
            }
        }

        summary
    }

    fn register_root(&self, root: &Path) {
        let name = last_segment(root);
        let path = path_string(root);
        let event = match find_or_create_directory(self.catalog.as_ref(), &name, &path, true, None)
        {
            Ok(upserted) if upserted.already_existed => IndexEvent::RootAlreadyIndexed { name },
            Ok(_) => IndexEvent::RootIndexed { name },
            Err(err) => IndexEvent::RootFailed {
                name,
                error: err.to_string(),
            },
        };
        self.reporter.report(&event);
    }

    fn visit_directory(&self, path: &Path, summary: &mut WalkSummary) {
        let path_str = path_string(path);
        let event = match self.index_directory(path, &path_str) {
            Ok(DirectoryOutcome::Cached) => {
                summary.cached += 1;
                IndexEvent::DirectoryCached { path: path_str }
            }
            Ok(DirectoryOutcome::Indexed) => {
                summary.directories_indexed += 1;
                IndexEvent::DirectoryIndexed { path: path_str }
            }
            Ok(DirectoryOutcome::AlreadyIndexed) => {
                summary.directories_existing += 1;
                IndexEvent::DirectoryAlreadyIndexed { path: path_str }
            }
            Err(err) => {
                summary.failed += 1;
                IndexEvent::DirectoryFailed {
                    path: path_str,
                    error: err.to_string(),
                }
            }
        };
        self.reporter.report(&event);
    }

    fn index_directory(&self, path: &Path, path_str: &str) -> Result<DirectoryOutcome, LibraryError> {
        if self.cache.contains(path_str)? {
            return Ok(DirectoryOutcome::Cached);
        }
        let name = last_segment(path);
        let parent = path.parent().map(path_string);
        let upserted = find_or_create_directory(
            self.catalog.as_ref(),
            &name,
            path_str,
            false,
            parent.as_deref(),
        )?;
        self.cache.record(path_str)?;
        if upserted.already_existed {
            Ok(DirectoryOutcome::AlreadyIndexed)
        } else {
            Ok(DirectoryOutcome::Indexed)
        }
    }

    fn visit_file(&self, path: &Path, summary: &mut WalkSummary) {
        let path_str = path_string(path);
        if !self.options.accepts_file(path) {
            summary.skipped += 1;
            self.reporter.report(&IndexEvent::FileSkipped { path: path_str });
            return;
        }

        let event = match self.index_song(path, &path_str) {
            Ok(SongOutcome::Cached) => {
                summary.cached += 1;
                IndexEvent::SongCached { path: path_str }
            }
            Ok(SongOutcome::Indexed(song_id)) => {
                summary.songs_indexed += 1;
                IndexEvent::SongIndexed {
                    path: path_str,
                    song_id,
                }
            }
            Ok(SongOutcome::AlreadyIndexed) => {
                summary.songs_existing += 1;
                IndexEvent::SongAlreadyIndexed { path: path_str }
            }
            Err(err) => {
                summary.failed += 1;
                IndexEvent::SongFailed {
                    path: path_str,
                    error: err.to_string(),
                }
            }
        };
        self.reporter.report(&event);
    }

    fn index_song(&self, path: &Path, path_str: &str) -> Result<SongOutcome, LibraryError> {
        if self.cache.contains(path_str)? {
            return Ok(SongOutcome::Cached);
        }
        let folder = path.parent().unwrap_or(path);
        let ingestor = SongIngestor::new(
            self.catalog.as_ref(),
            self.reader.as_ref(),
            self.reporter.as_ref(),
        );
        let song = ingestor.ingest(path, folder)?;
        self.cache.record(path_str)?;
        Ok(match song {
            Some(song) => SongOutcome::Indexed(song.id),
            None => SongOutcome::AlreadyIndexed,
        })
    }
}
