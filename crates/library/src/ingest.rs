use std::path::Path;

use common::{last_segment, path_string, NewSong, Song};
use metadata::{AudioMetadata, MetadataReader};

use crate::catalog::CatalogStore;
use crate::dedup::{find_or_create_album, find_or_create_artist};
use crate::events::{IndexEvent, IndexReporter};
use crate::LibraryError;

const UNKNOWN: &str = "Unknown";
const UNKNOWN_CODEC: &str = "unknown";

#[derive(Clone, Debug, PartialEq)]
pub struct SongTags {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub codec: String,
    pub duration_secs: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Validation {
    Complete(SongTags),
    Poor(SongTags),
    Invalid,
}

pub fn validate_metadata(metadata: &AudioMetadata, filename: &str) -> Validation {
    let duration_secs = match metadata.format.duration_secs {
        Some(duration) if duration > 0.0 && duration.is_finite() => duration,
        _ => return Validation::Invalid,
    };
    let codec = present(&metadata.format.codec);

    match (
        present(&metadata.common.artist),
        present(&metadata.common.title),
        present(&metadata.common.album),
        codec,
    ) {
        (Some(artist), Some(title), Some(album), Some(codec)) => Validation::Complete(SongTags {
            artist: artist.to_string(),
            title: title.to_string(),
            album: album.to_string(),
            codec: codec.to_string(),
            duration_secs,
        }),
        _ => Validation::Poor(SongTags {
            artist: UNKNOWN.to_string(),
            title: filename.to_string(),
            album: UNKNOWN.to_string(),
            codec: codec.unwrap_or(UNKNOWN_CODEC).to_string(),
            duration_secs,
        }),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub struct SongIngestor<'a> {
    catalog: &'a dyn CatalogStore,
    reader: &'a dyn MetadataReader,
    reporter: &'a dyn IndexReporter,
}

impl<'a> SongIngestor<'a> {
    pub fn new(
        catalog: &'a dyn CatalogStore,
        reader: &'a dyn MetadataReader,
        reporter: &'a dyn IndexReporter,
    ) -> Self {
        Self {
            catalog,
            reader,
            reporter,
        }
    }

    pub fn ingest(&self, file_path: &Path, folder_path: &Path) -> Result<Option<Song>, LibraryError> {
        let song_path = path_string(file_path);
        if self.catalog.find_song_by_path(&song_path)?.is_some() {
            return Ok(None);
        }

        let filename = last_segment(file_path);
        let metadata = self.reader.read(file_path)?;
        let tags = match validate_metadata(&metadata, &filename) {
            Validation::Complete(tags) => tags,
            Validation::Poor(tags) => {
                self.reporter.report(&IndexEvent::SongPoorMetadata {
                    path: song_path.clone(),
                });
                tags
            }
            Validation::Invalid => return Err(LibraryError::InvalidMetadata(filename)),
        };

        let artist = find_or_create_artist(self.catalog, &tags.artist)?;
        let album = find_or_create_album(self.catalog, &tags.album)?;
        let directory_id = self.song_directory(folder_path)?;

        let song = self.catalog.create_song(NewSong {
            path: song_path,
            filename,
            title: tags.title,
            duration_secs: tags.duration_secs,
            codec: tags.codec,
            artist_id: artist.id,
            album_id: album.id,
            directory_id,
        })?;
        Ok(Some(song))
    }

    fn song_directory(&self, folder_path: &Path) -> Result<String, LibraryError> {
        let path = path_string(folder_path);
        if let Some(directory) = self.catalog.find_directory_by_path(&path)? {
            return Ok(directory.id);
        }
        let name = last_segment(folder_path);
        let parent = folder_path.parent().map(path_string);
        let directory = self
            .catalog
            .create_directory(&name, &path, false, parent.as_deref())?;
        Ok(directory.id)
    }
}
