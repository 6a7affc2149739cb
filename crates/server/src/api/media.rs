use std::path::PathBuf;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use metadata::read_cover;
use tracing::warn;

use crate::state::{AppState, SongQuery};
use crate::streaming::stream_song;
use crate::utils::{json_error, json_error_response, require_id};

pub async fn stream(
    State(state): State<AppState>,
    Query(params): Query<SongQuery>,
    headers: HeaderMap,
) -> Response {
    let song_id = match require_id(params.song_id.as_deref(), "song_id") {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());
    stream_song(state.catalog.as_ref(), &song_id, range).await
}

pub async fn cover(State(state): State<AppState>, Query(params): Query<SongQuery>) -> Response {
    let song_id = match require_id(params.song_id.as_deref(), "song_id") {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    let song = match state.catalog.get_song(&song_id) {
        Ok(Some(song)) => song,
        Ok(None) => return json_error_response(StatusCode::NOT_FOUND, "song not found"),
        Err(err) => {
            return json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("library error: {}", err),
            )
        }
    };

    let path = PathBuf::from(&song.path);
    let cover = tokio::task::spawn_blocking(move || read_cover(&path)).await;
    match cover {
        Ok(Ok(Some(cover))) => {
            let mime = cover
                .mime
                .as_deref()
                .and_then(|mime| HeaderValue::from_str(mime).ok())
                .unwrap_or(HeaderValue::from_static("application/octet-stream"));
            let mut response = Response::new(Body::from(cover.data));
            response.headers_mut().insert(header::CONTENT_TYPE, mime);
            response.headers_mut().insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=86400"),
            );
            response
        }
        Ok(Ok(None)) => StatusCode::OK.into_response(),
        Ok(Err(err)) => {
            warn!("Cannot read cover of {}: {}", song.path, err);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("cannot read tags: {}", err),
            )
            .into_response()
        }
        Err(err) => json_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("join error: {}", err),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::seeded_state;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn stream_validates_song_id() {
        let fx = seeded_state();
        let state = fx.state.clone();

        let response = stream(
            State(state.clone()),
            Query(SongQuery { song_id: None }),
            HeaderMap::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = stream(
            State(state),
            Query(SongQuery {
                song_id: Some(common::song_id("/nowhere.mp3")),
            }),
            HeaderMap::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stream_honours_range_header() {
        let fx = seeded_state();
        let state = fx.state.clone();
        let songs = fx.songs.clone();
        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, HeaderValue::from_static("bytes=2-5"));

        let response = stream(
            State(state),
            Query(SongQuery {
                song_id: Some(songs[0].id.clone()),
            }),
            headers,
        )
        .await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"2345");
    }

    #[tokio::test]
    async fn cover_of_unparseable_file_is_an_error() {
        let fx = seeded_state();
        let state = fx.state.clone();
        let songs = fx.songs.clone();

        let response = cover(
            State(state.clone()),
            Query(SongQuery {
                song_id: Some(songs[0].id.clone()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = cover(State(state), Query(SongQuery { song_id: Some("x".into()) })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
