use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub id: String,
    pub name: String,
    pub path: String,
    pub root: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub path: String,
    pub filename: String,
    pub title: String,
    pub duration_secs: f64,
    pub codec: String,
    pub artist_id: String,
    pub album_id: String,
    pub directory_id: String,
}

#[derive(Clone, Debug)]
pub struct NewSong {
    pub path: String,
    pub filename: String,
    pub title: String,
    pub duration_secs: f64,
    pub codec: String,
    pub artist_id: String,
    pub album_id: String,
    pub directory_id: String,
}

pub fn stable_id(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

pub fn song_id(path: &str) -> String {
    stable_id(&format!("song:{}", path))
}

pub fn artist_id(name: &str) -> String {
    stable_id(&format!("artist:{}", name))
}

pub fn album_id(name: &str) -> String {
    stable_id(&format!("album:{}", name))
}

pub fn directory_id(name: &str, path: &str, root: bool) -> String {
    stable_id(&format!("directory:{}:{}:{}", root, name, path))
}

pub fn is_valid_id(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

pub fn last_segment(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        let first = stable_id("Artist/Album/Track.mp3");
        let second = stable_id("Artist/Album/Track.mp3");
        assert_eq!(first, second);
        assert_ne!(first, stable_id("Artist/Album/Track2.mp3"));
    }

    #[test]
    fn entity_ids_are_namespaced() {
        assert_ne!(artist_id("Same"), album_id("Same"));
        assert_ne!(
            directory_id("music", "/music", true),
            directory_id("music", "/music", false)
        );
    }

    #[test]
    fn validates_id_shape() {
        assert!(is_valid_id(&song_id("/a/b.mp3")));
        assert!(!is_valid_id("not-an-id"));
        assert!(!is_valid_id(&song_id("/a/b.mp3").to_uppercase()));
    }

    #[test]
    fn last_segment_of_paths() {
        assert_eq!(last_segment(Path::new("/music/a/song.mp3")), "song.mp3");
        assert_eq!(last_segment(Path::new("/music/a")), "a");
    }
}
