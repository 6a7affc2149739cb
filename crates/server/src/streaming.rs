use std::io;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use library::{CatalogStore, LibraryError};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::range::parse_range_header;
use crate::utils::json_error_response;

const STREAM_CAPACITY: usize = 64 * 1024;

#[derive(Debug)]
pub enum StreamError {
    NotFound,
    Catalog(LibraryError),
    Io(io::Error),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::NotFound => write!(f, "song not found"),
            StreamError::Catalog(err) => write!(f, "library error: {}", err),
            StreamError::Io(err) => write!(f, "cannot read file: {}", err),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<LibraryError> for StreamError {
    fn from(err: LibraryError) -> Self {
        StreamError::Catalog(err)
    }
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        StreamError::Io(err)
    }
}

impl StreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            StreamError::NotFound => StatusCode::NOT_FOUND,
            StreamError::Catalog(_) | StreamError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub async fn stream_song(
    catalog: &dyn CatalogStore,
    song_id: &str,
    range: Option<&str>,
) -> Response {
    match open_song(catalog, song_id, range).await {
        Ok(response) => response,
        Err(err) => {
            if !matches!(err, StreamError::NotFound) {
                warn!("Stream failed for {}: {}", song_id, err);
            }
            json_error_response(err.status(), err.to_string())
        }
    }
}

async fn open_song(
    catalog: &dyn CatalogStore,
    song_id: &str,
    range: Option<&str>,
) -> Result<Response, StreamError> {
    let song = catalog.get_song(song_id)?.ok_or(StreamError::NotFound)?;
    Ok(file_response(Path::new(&song.path), range).await?)
}

pub async fn file_response(path: &Path, range: Option<&str>) -> Result<Response, io::Error> {
    let mut file = File::open(path).await?;
    let size = file.metadata().await?.len();

    let range = range.and_then(|value| match parse_range_header(value, size) {
        Ok(range) => Some(range),
        Err(err) => {
            debug!("Ignoring range {:?} for {}: {:?}", value, path.display(), err);
            None
        }
    });

    let mut response = match range {
        Some(span) => {
            file.seek(SeekFrom::Start(span.start)).await?;
            let body = Body::from_stream(ReaderStream::with_capacity(
                file.take(span.len()),
                STREAM_CAPACITY,
            ));
            let mut response = Response::new(body);
            *response.status_mut() = StatusCode::PARTIAL_CONTENT;
            let headers = response.headers_mut();
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            headers.insert(header::CONTENT_RANGE, header_value(span.content_range(size))?);
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(span.len()));
            response
        }
        None => {
            let body = Body::from_stream(ReaderStream::with_capacity(file, STREAM_CAPACITY));
            let mut response = Response::new(body);
            response
                .headers_mut()
                .insert(header::CONTENT_LENGTH, HeaderValue::from(size));
            response
        }
    };
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    Ok(response)
}

fn header_value(value: String) -> Result<HeaderValue, io::Error> {
    HeaderValue::from_str(&value).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
