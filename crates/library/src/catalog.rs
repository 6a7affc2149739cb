use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{album_id, artist_id, directory_id, song_id, Album, Artist, Directory, NewSong, Song};
use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::LibraryError;

const KEY_SEP: char = '\x1f';

const DIRECTORIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("directories");
const DIRECTORY_PATHS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("directory_paths");
const DIRECTORY_CHILDREN_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("directory_children");
const ROOT_DIRECTORIES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("root_directories");
const ARTISTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("artists");
const ALBUMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("albums");
const SONGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("songs");
const DIRECTORY_SONGS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("directory_songs");

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub directories: u64,
    pub artists: u64,
    pub albums: u64,
    pub songs: u64,
}

pub trait CatalogStore: Send + Sync {
    fn find_directory(
        &self,
        name: &str,
        path: &str,
        root: bool,
    ) -> Result<Option<Directory>, LibraryError>;

    fn find_directory_by_path(&self, path: &str) -> Result<Option<Directory>, LibraryError>;

    fn create_directory(
        &self,
        name: &str,
        path: &str,
        root: bool,
        parent_path: Option<&str>,
    ) -> Result<Directory, LibraryError>;

    fn find_artist(&self, name: &str) -> Result<Option<Artist>, LibraryError>;
    fn create_artist(&self, name: &str) -> Result<Artist, LibraryError>;

    fn find_album(&self, name: &str) -> Result<Option<Album>, LibraryError>;
    fn create_album(&self, name: &str) -> Result<Album, LibraryError>;

    fn find_song_by_path(&self, path: &str) -> Result<Option<Song>, LibraryError>;
    fn create_song(&self, song: NewSong) -> Result<Song, LibraryError>;

    fn get_song(&self, id: &str) -> Result<Option<Song>, LibraryError>;
    fn get_directory(&self, id: &str) -> Result<Option<Directory>, LibraryError>;
    fn get_artist(&self, id: &str) -> Result<Option<Artist>, LibraryError>;
    fn get_album(&self, id: &str) -> Result<Option<Album>, LibraryError>;

    fn list_root_directories(&self) -> Result<Vec<Directory>, LibraryError>;
    fn list_child_directories(&self, id: &str) -> Result<Vec<Directory>, LibraryError>;
    fn list_directory_songs(&self, id: &str) -> Result<Vec<Song>, LibraryError>;

    fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<Song>, LibraryError>;

    fn stats(&self) -> Result<CatalogStats, LibraryError>;
}

#[derive(Clone)]
pub struct RedbCatalog {
    db: Arc<Database>,
}

impl RedbCatalog {
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        let db = open_or_create_db(path)?;
        Self::with_db(Arc::new(db))
    }

    pub fn with_db(db: Arc<Database>) -> Result<Self, LibraryError> {
        let catalog = Self { db };
        catalog.init_tables()?;
        Ok(catalog)
    }

    fn init_tables(&self) -> Result<(), LibraryError> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(DIRECTORIES_TABLE)?;
            let _ = write_txn.open_table(DIRECTORY_PATHS_TABLE)?;
            let _ = write_txn.open_table(DIRECTORY_CHILDREN_TABLE)?;
            let _ = write_txn.open_table(ROOT_DIRECTORIES_TABLE)?;
            let _ = write_txn.open_table(ARTISTS_TABLE)?;
            let _ = write_txn.open_table(ALBUMS_TABLE)?;
            let _ = write_txn.open_table(SONGS_TABLE)?;
            let _ = write_txn.open_table(DIRECTORY_SONGS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_value<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> Result<Option<T>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let value = match table.get(key)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(value)
    }

    fn put_value<T: Serialize>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        value: &T,
    ) -> Result<(), LibraryError> {
        let bytes = encode_value(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn list_linked<T: DeserializeOwned>(
        &self,
        links: TableDefinition<&str, &str>,
        values: TableDefinition<&str, &[u8]>,
        owner_id: &str,
    ) -> Result<Vec<T>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let link_table = read_txn.open_table(links)?;
        let value_table = read_txn.open_table(values)?;

        let prefix = prefix_key(owner_id);
        let mut end = prefix.clone();
        end.push('\u{10ffff}');

        let mut items = Vec::new();
        for entry in link_table.range(prefix.as_str()..end.as_str())? {
            let entry = entry?;
            let linked_id = entry.1.value();
            if let Some(value) = value_table.get(linked_id)? {
                items.push(decode_value(value.value())?);
            }
        }
        Ok(items)
    }
}

impl CatalogStore for RedbCatalog {
    fn find_directory(
        &self,
        name: &str,
        path: &str,
        root: bool,
    ) -> Result<Option<Directory>, LibraryError> {
        self.get_value(DIRECTORIES_TABLE, &directory_id(name, path, root))
    }

    fn find_directory_by_path(&self, path: &str) -> Result<Option<Directory>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let path_table = read_txn.open_table(DIRECTORY_PATHS_TABLE)?;
        let directory_table = read_txn.open_table(DIRECTORIES_TABLE)?;
        let id = match path_table.get(path)? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };
        let directory = match directory_table.get(id.as_str())? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(directory)
    }

    fn create_directory(
        &self,
        name: &str,
        path: &str,
        root: bool,
        parent_path: Option<&str>,
    ) -> Result<Directory, LibraryError> {
        let id = directory_id(name, path, root);
        let write_txn = self.db.begin_write()?;
        let directory = {
            let mut directory_table = write_txn.open_table(DIRECTORIES_TABLE)?;
            let mut path_table = write_txn.open_table(DIRECTORY_PATHS_TABLE)?;
            let mut children_table = write_txn.open_table(DIRECTORY_CHILDREN_TABLE)?;
            let mut roots_table = write_txn.open_table(ROOT_DIRECTORIES_TABLE)?;

            let parent_id = match parent_path {
                Some(parent_path) => path_table
                    .get(parent_path)?
                    .map(|value| value.value().to_string()),
                None => None,
            };

            let directory = Directory {
                id: id.clone(),
                name: name.to_string(),
                path: path.to_string(),
                root,
                parent_id,
            };
            let bytes = encode_value(&directory)?;
            directory_table.insert(id.as_str(), bytes.as_slice())?;

            let path_registered = path_table.get(path)?.is_some();
            if !path_registered {
                path_table.insert(path, id.as_str())?;
            }
            if let Some(parent_id) = &directory.parent_id {
                let link = link_key(parent_id, &id);
                children_table.insert(link.as_str(), id.as_str())?;
            }
            if root {
                roots_table.insert(id.as_str(), name)?;
            }
            directory
        };
        write_txn.commit()?;
        Ok(directory)
    }

    fn find_artist(&self, name: &str) -> Result<Option<Artist>, LibraryError> {
        self.get_value(ARTISTS_TABLE, &artist_id(name))
    }

    fn create_artist(&self, name: &str) -> Result<Artist, LibraryError> {
        let artist = Artist {
            id: artist_id(name),
            name: name.to_string(),
        };
        self.put_value(ARTISTS_TABLE, &artist.id, &artist)?;
        Ok(artist)
    }

    fn find_album(&self, name: &str) -> Result<Option<Album>, LibraryError> {
        self.get_value(ALBUMS_TABLE, &album_id(name))
    }

    fn create_album(&self, name: &str) -> Result<Album, LibraryError> {
        let album = Album {
            id: album_id(name),
            name: name.to_string(),
        };
        self.put_value(ALBUMS_TABLE, &album.id, &album)?;
        Ok(album)
    }

    fn find_song_by_path(&self, path: &str) -> Result<Option<Song>, LibraryError> {
        self.get_value(SONGS_TABLE, &song_id(path))
    }

    fn create_song(&self, song: NewSong) -> Result<Song, LibraryError> {
        let song = Song {
            id: song_id(&song.path),
            path: song.path,
            filename: song.filename,
            title: song.title,
            duration_secs: song.duration_secs,
            codec: song.codec,
            artist_id: song.artist_id,
            album_id: song.album_id,
            directory_id: song.directory_id,
        };
        let bytes = encode_value(&song)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut song_table = write_txn.open_table(SONGS_TABLE)?;
            let mut directory_songs_table = write_txn.open_table(DIRECTORY_SONGS_TABLE)?;
            song_table.insert(song.id.as_str(), bytes.as_slice())?;
            let link = link_key(&song.directory_id, &song.id);
            directory_songs_table.insert(link.as_str(), song.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(song)
    }

    fn get_song(&self, id: &str) -> Result<Option<Song>, LibraryError> {
        self.get_value(SONGS_TABLE, id)
    }

    fn get_directory(&self, id: &str) -> Result<Option<Directory>, LibraryError> {
        self.get_value(DIRECTORIES_TABLE, id)
    }

    fn get_artist(&self, id: &str) -> Result<Option<Artist>, LibraryError> {
        self.get_value(ARTISTS_TABLE, id)
    }

    fn get_album(&self, id: &str) -> Result<Option<Album>, LibraryError> {
        self.get_value(ALBUMS_TABLE, id)
    }

    fn list_root_directories(&self) -> Result<Vec<Directory>, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let roots_table = read_txn.open_table(ROOT_DIRECTORIES_TABLE)?;
        let directory_table = read_txn.open_table(DIRECTORIES_TABLE)?;

        let mut roots: Vec<Directory> = Vec::new();
        for entry in roots_table.iter()? {
            let entry = entry?;
            if let Some(value) = directory_table.get(entry.0.value())? {
                roots.push(decode_value(value.value())?);
            }
        }
        roots.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(roots)
    }

    fn list_child_directories(&self, id: &str) -> Result<Vec<Directory>, LibraryError> {
        let mut children: Vec<Directory> =
            self.list_linked(DIRECTORY_CHILDREN_TABLE, DIRECTORIES_TABLE, id)?;
        children.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(children)
    }

    fn list_directory_songs(&self, id: &str) -> Result<Vec<Song>, LibraryError> {
        let mut songs: Vec<Song> = self.list_linked(DIRECTORY_SONGS_TABLE, SONGS_TABLE, id)?;
        songs.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(songs)
    }

    fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<Song>, LibraryError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let read_txn = self.db.begin_read()?;
        let song_table = read_txn.open_table(SONGS_TABLE)?;
        let artist_table = read_txn.open_table(ARTISTS_TABLE)?;
        let album_table = read_txn.open_table(ALBUMS_TABLE)?;

        let mut artist_names: HashMap<String, String> = HashMap::new();
        let mut album_names: HashMap<String, String> = HashMap::new();
        let mut items = Vec::new();

        for entry in song_table.iter()? {
            let entry = entry?;
            let song: Song = decode_value(entry.1.value())?;

            let mut matched = song.title.to_lowercase().contains(&needle)
                || song.filename.to_lowercase().contains(&needle);
            if !matched {
                if !artist_names.contains_key(&song.artist_id) {
                    let name = match artist_table.get(song.artist_id.as_str())? {
                        Some(value) => decode_value::<Artist>(value.value())?.name.to_lowercase(),
                        None => String::new(),
                    };
                    artist_names.insert(song.artist_id.clone(), name);
                }
                matched = artist_names
                    .get(&song.artist_id)
                    .map(|name| name.contains(&needle))
                    .unwrap_or(false);
            }
            if !matched {
                if !album_names.contains_key(&song.album_id) {
                    let name = match album_table.get(song.album_id.as_str())? {
                        Some(value) => decode_value::<Album>(value.value())?.name.to_lowercase(),
                        None => String::new(),
                    };
                    album_names.insert(song.album_id.clone(), name);
                }
                matched = album_names
                    .get(&song.album_id)
                    .map(|name| name.contains(&needle))
                    .unwrap_or(false);
            }

            if matched {
                items.push(song);
                if items.len() >= limit {
                    break;
                }
            }
        }

        Ok(items)
    }

    fn stats(&self) -> Result<CatalogStats, LibraryError> {
        let read_txn = self.db.begin_read()?;
        let stats = CatalogStats {
            directories: read_txn.open_table(DIRECTORIES_TABLE)?.len()?,
            artists: read_txn.open_table(ARTISTS_TABLE)?.len()?,
            albums: read_txn.open_table(ALBUMS_TABLE)?.len()?,
            songs: read_txn.open_table(SONGS_TABLE)?.len()?,
        };
        Ok(stats)
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, LibraryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, LibraryError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LibraryError> {
    Ok(bincode::deserialize(bytes)?)
}

fn prefix_key(prefix: &str) -> String {
    let mut out = String::new();
    out.push_str(prefix);
    out.push(KEY_SEP);
    out
}

fn link_key(owner_id: &str, linked_id: &str) -> String {
    let mut out = prefix_key(owner_id);
    out.push_str(linked_id);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_catalog() -> (tempfile::TempDir, RedbCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = RedbCatalog::open(&dir.path().join("catalog.redb")).unwrap();
        (dir, catalog)
    }

    fn new_song(path: &str, title: &str, artist: &Artist, album: &Album, dir: &Directory) -> NewSong {
        NewSong {
            path: path.to_string(),
            filename: path.rsplit('/').next().unwrap().to_string(),
            title: title.to_string(),
            duration_secs: 200.0,
            codec: "MPEG".to_string(),
            artist_id: artist.id.clone(),
            album_id: album.id.clone(),
            directory_id: dir.id.clone(),
        }
    }

    #[test]
    fn directory_identity_is_the_triple() {
        let (_dir, catalog) = open_catalog();
        let root = catalog.create_directory("music", "/music", true, None).unwrap();
        assert!(root.root);
        assert_eq!(root.parent_id, None);

        assert_eq!(catalog.find_directory("music", "/music", true).unwrap(), Some(root.clone()));
        assert_eq!(catalog.find_directory("music", "/music", false).unwrap(), None);
        assert_eq!(catalog.find_directory("other", "/music", true).unwrap(), None);
        assert_eq!(catalog.find_directory_by_path("/music").unwrap(), Some(root));
    }

    #[test]
    fn links_children_to_parent_path() {
        let (_dir, catalog) = open_catalog();
        let root = catalog.create_directory("music", "/music", true, None).unwrap();
        let child = catalog
            .create_directory("rock", "/music/rock", false, Some("/music"))
            .unwrap();
        let orphan = catalog
            .create_directory("jazz", "/elsewhere/jazz", false, Some("/elsewhere"))
            .unwrap();

        assert_eq!(child.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(orphan.parent_id, None);
        let children = catalog.list_child_directories(&root.id).unwrap();
        assert_eq!(children, vec![child]);
        assert_eq!(catalog.list_root_directories().unwrap(), vec![root]);
    }

    #[test]
    fn artists_and_albums_match_exact_names() {
        let (_dir, catalog) = open_catalog();
        let artist = catalog.create_artist("Daft Punk").unwrap();
        assert_eq!(catalog.find_artist("Daft Punk").unwrap(), Some(artist.clone()));
        assert_eq!(catalog.find_artist("daft punk").unwrap(), None);
        assert_eq!(catalog.get_artist(&artist.id).unwrap(), Some(artist));

        let album = catalog.create_album("Discovery").unwrap();
        assert_eq!(catalog.find_album("Discovery").unwrap(), Some(album.clone()));
        assert_eq!(catalog.find_album("discovery").unwrap(), None);
        assert_eq!(catalog.get_album(&album.id).unwrap(), Some(album));
    }

    #[test]
    fn repeated_creates_converge_on_one_row() {
        let (_dir, catalog) = open_catalog();
        let first = catalog.create_artist("Air").unwrap();
        let second = catalog.create_artist("Air").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(catalog.stats().unwrap().artists, 1);
    }

    #[test]
    fn songs_are_found_by_path_and_listed_per_directory() {
        let (_dir, catalog) = open_catalog();
        let root = catalog.create_directory("music", "/music", true, None).unwrap();
        let artist = catalog.create_artist("Air").unwrap();
        let album = catalog.create_album("Moon Safari").unwrap();
        let b = catalog
            .create_song(new_song("/music/b.mp3", "Sexy Boy", &artist, &album, &root))
            .unwrap();
        let a = catalog
            .create_song(new_song("/music/a.mp3", "La Femme d'Argent", &artist, &album, &root))
            .unwrap();

        assert_eq!(catalog.find_song_by_path("/music/a.mp3").unwrap(), Some(a.clone()));
        assert_eq!(catalog.find_song_by_path("/music/c.mp3").unwrap(), None);
        assert_eq!(catalog.get_song(&b.id).unwrap(), Some(b.clone()));
        assert_eq!(catalog.list_directory_songs(&root.id).unwrap(), vec![a, b]);

        let stats = catalog.stats().unwrap();
        assert_eq!(
            stats,
            CatalogStats {
                directories: 1,
                artists: 1,
                albums: 1,
                songs: 2
            }
        );
    }

    #[test]
    fn search_matches_title_artist_and_album() {
        let (_dir, catalog) = open_catalog();
        let root = catalog.create_directory("music", "/music", true, None).unwrap();
        let air = catalog.create_artist("Air").unwrap();
        let moon = catalog.create_album("Moon Safari").unwrap();
        let other = catalog.create_artist("Justice").unwrap();
        let cross = catalog.create_album("Cross").unwrap();
        catalog
            .create_song(new_song("/music/1.mp3", "Sexy Boy", &air, &moon, &root))
            .unwrap();
        catalog
            .create_song(new_song("/music/2.mp3", "Genesis", &other, &cross, &root))
            .unwrap();

        let titles = |query: &str| -> Vec<String> {
            let mut found: Vec<String> = catalog
                .search_songs(query, 10)
                .unwrap()
                .into_iter()
                .map(|song| song.title)
                .collect();
            found.sort();
            found
        };
        assert_eq!(titles("sexy"), vec!["Sexy Boy"]);
        assert_eq!(titles("JUSTICE"), vec!["Genesis"]);
        assert_eq!(titles("safari"), vec!["Sexy Boy"]);
        assert_eq!(titles(".mp3"), vec!["Genesis", "Sexy Boy"]);
        assert!(titles("   ").is_empty());
        assert_eq!(catalog.search_songs(".mp3", 1).unwrap().len(), 1);
    }

    #[test]
    fn reopening_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.redb");
        {
            let catalog = RedbCatalog::open(&path).unwrap();
            catalog.create_artist("Air").unwrap();
        }
        let catalog = RedbCatalog::open(&path).unwrap();
        assert!(catalog.find_artist("Air").unwrap().is_some());
    }
}
