use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use common::Song;
use library::{CatalogStore, LibraryError};

use crate::state::{
    AppState, DirectoryContent, DirectoryQuery, DirectoryRef, JsonResult, SearchQuery, SongView,
};
use crate::utils::{json_error, library_error, require_id};

const DEFAULT_SEARCH_LIMIT: usize = 40;
const MAX_SEARCH_LIMIT: usize = 100;

pub async fn list_roots(State(state): State<AppState>) -> JsonResult<Vec<DirectoryRef>> {
    let roots = state.catalog.list_root_directories().map_err(library_error)?;
    Ok(Json(
        roots
            .into_iter()
            .map(|dir| DirectoryRef {
                id: dir.id,
                name: dir.name,
            })
            .collect(),
    ))
}

pub async fn directory_content(
    State(state): State<AppState>,
    Query(params): Query<DirectoryQuery>,
) -> JsonResult<DirectoryContent> {
    let directory_id = require_id(params.directory_id.as_deref(), "directory_id")?;
    let catalog = state.catalog.as_ref();
    let directory = catalog
        .get_directory(&directory_id)
        .map_err(library_error)?
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "directory not found"))?;

    let children = catalog
        .list_child_directories(&directory.id)
        .map_err(library_error)?
        .into_iter()
        .map(|child| DirectoryRef {
            id: child.id,
            name: child.name,
        })
        .collect();
    let songs = catalog
        .list_directory_songs(&directory.id)
        .map_err(library_error)?;
    let songs = song_views(catalog, songs).map_err(library_error)?;

    Ok(Json(DirectoryContent {
        id: directory.id,
        name: directory.name,
        root: directory.root,
        parent_id: directory.parent_id,
        children,
        songs,
    }))
}

pub async fn search_songs(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> JsonResult<Vec<SongView>> {
    let query = params.query.as_deref().map(str::trim).unwrap_or("");
    if query.is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "query is required"));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let catalog = state.catalog.as_ref();
    let songs = catalog.search_songs(query, limit).map_err(library_error)?;
    Ok(Json(song_views(catalog, songs).map_err(library_error)?))
}

pub(crate) fn song_views(
    catalog: &dyn CatalogStore,
    songs: Vec<Song>,
) -> Result<Vec<SongView>, LibraryError> {
    let mut artists: HashMap<String, Option<String>> = HashMap::new();
    let mut albums: HashMap<String, Option<String>> = HashMap::new();
    let mut views = Vec::with_capacity(songs.len());
    for song in songs {
        if !artists.contains_key(&song.artist_id) {
            let name = catalog.get_artist(&song.artist_id)?.map(|artist| artist.name);
            artists.insert(song.artist_id.clone(), name);
        }
        if !albums.contains_key(&song.album_id) {
            let name = catalog.get_album(&song.album_id)?.map(|album| album.name);
            albums.insert(song.album_id.clone(), name);
        }
        views.push(SongView {
            artist: artists.get(&song.artist_id).cloned().flatten(),
            album: albums.get(&song.album_id).cloned().flatten(),
            id: song.id,
            title: song.title,
            filename: song.filename,
            duration_secs: song.duration_secs,
            codec: song.codec,
            artist_id: song.artist_id,
            album_id: song.album_id,
            directory_id: song.directory_id,
        });
    }
    Ok(views)
}
