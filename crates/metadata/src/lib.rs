use std::path::Path;

use lofty::error::LoftyError;
use lofty::file::FileType;
use lofty::picture::{Picture, PictureType};
use lofty::prelude::{AudioFile, ItemKey, TaggedFileExt};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommonTags {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormatInfo {
    pub codec: Option<String>,
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AudioMetadata {
    pub common: CommonTags,
    pub format: FormatInfo,
}

#[derive(Debug, Clone)]
pub struct CoverArt {
    pub data: Vec<u8>,
    pub mime: Option<String>,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

pub trait MetadataReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<AudioMetadata, MetadataError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyReader;

impl MetadataReader for LoftyReader {
    fn read(&self, path: &Path) -> Result<AudioMetadata, MetadataError> {
        read_metadata(path)
    }
}

pub fn read_metadata(path: &Path) -> Result<AudioMetadata, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;
    let properties = tagged_file.properties();

    let mut metadata = AudioMetadata::default();

    let duration = properties.duration().as_secs_f64();
    if duration > 0.0 {
        metadata.format.duration_secs = Some(duration);
    }
    metadata.format.codec = codec_name(tagged_file.file_type()).map(|s| s.to_string());

    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        metadata.common.title = non_empty(tag.get_string(&ItemKey::TrackTitle));
        metadata.common.album = non_empty(tag.get_string(&ItemKey::AlbumTitle));
        let track_artist = non_empty(tag.get_string(&ItemKey::TrackArtist));
        let album_artist = non_empty(tag.get_string(&ItemKey::AlbumArtist));
        metadata.common.artist = track_artist.or(album_artist);
    }

    Ok(metadata)
}

pub fn read_cover(path: &Path) -> Result<Option<CoverArt>, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;
    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => tag,
        None => return Ok(None),
    };

    let picture = match pick_picture(tag.pictures()) {
        Some(picture) => picture,
        None => return Ok(None),
    };

    let data = picture.data().to_vec();
    let mime = guess_mime(&data);
    Ok(Some(CoverArt { data, mime }))
}

fn codec_name(file_type: FileType) -> Option<&'static str> {
    let name = match file_type {
        FileType::Aac => "AAC",
        FileType::Aiff => "AIFF",
        FileType::Ape => "APE",
        FileType::Flac => "FLAC",
        FileType::Mpeg => "MPEG",
        FileType::Mp4 => "MP4",
        FileType::Mpc => "MPC",
        FileType::Opus => "Opus",
        FileType::Vorbis => "Vorbis",
        FileType::Speex => "Speex",
        FileType::Wav => "PCM",
        FileType::WavPack => "WavPack",
        FileType::Custom(name) => name,
        _ => return None,
    };
    Some(name)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

fn pick_picture(pictures: &[Picture]) -> Option<&Picture> {
    for picture in pictures {
        if picture.pic_type() == PictureType::CoverFront {
            return Some(picture);
        }
    }
    pictures.first()
}

fn guess_mime(bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg".to_string())
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("image/png".to_string())
    } else {
        None
    }
}
