use common::{Album, Artist, Directory};

use crate::catalog::CatalogStore;
use crate::LibraryError;

#[derive(Clone, Debug, PartialEq)]
pub struct Upserted<T> {
    pub entity: T,
    pub already_existed: bool,
}

pub fn find_or_create_directory(
    store: &dyn CatalogStore,
    name: &str,
    path: &str,
    root: bool,
    parent_path: Option<&str>,
) -> Result<Upserted<Directory>, LibraryError> {
    if let Some(entity) = store.find_directory(name, path, root)? {
        return Ok(Upserted {
            entity,
            already_existed: true,
        });
    }
    let entity = store.create_directory(name, path, root, parent_path)?;
    Ok(Upserted {
        entity,
        already_existed: false,
    })
}

pub fn find_or_create_artist(store: &dyn CatalogStore, name: &str) -> Result<Artist, LibraryError> {
    match store.find_artist(name)? {
        Some(artist) => Ok(artist),
        None => store.create_artist(name),
    }
}

pub fn find_or_create_album(store: &dyn CatalogStore, name: &str) -> Result<Album, LibraryError> {
    match store.find_album(name)? {
        Some(album) => Ok(album),
        None => store.create_album(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RedbCatalog;

    #[test]
    fn directory_upsert_reports_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = RedbCatalog::open(&dir.path().join("catalog.redb")).unwrap();

        let first = find_or_create_directory(&catalog, "music", "/music", true, None).unwrap();
        assert!(!first.already_existed);
        let second = find_or_create_directory(&catalog, "music", "/music", true, None).unwrap();
        assert!(second.already_existed);
        assert_eq!(first.entity, second.entity);
        assert_eq!(catalog.stats().unwrap().directories, 1);
    }

    #[test]
    fn artist_and_album_are_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = RedbCatalog::open(&dir.path().join("catalog.redb")).unwrap();

        let a = find_or_create_artist(&catalog, "Boards of Canada").unwrap();
        let b = find_or_create_artist(&catalog, "Boards of Canada").unwrap();
        assert_eq!(a, b);
        let c = find_or_create_album(&catalog, "Geogaddi").unwrap();
        let d = find_or_create_album(&catalog, "Geogaddi").unwrap();
        assert_eq!(c, d);

        let stats = catalog.stats().unwrap();
        assert_eq!(stats.artists, 1);
        assert_eq!(stats.albums, 1);
    }
}
