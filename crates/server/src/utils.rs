use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use library::LibraryError;

use crate::state::ErrorResponse;

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn json_error_response(status: StatusCode, message: impl Into<String>) -> Response {
    json_error(status, message).into_response()
}

pub fn library_error(err: LibraryError) -> (StatusCode, Json<ErrorResponse>) {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("library error: {}", err),
    )
}

pub fn require_id(
    value: Option<&str>,
    field: &str,
) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    let value = value.map(str::trim).unwrap_or("");
    if value.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            format!("{} is required", field),
        ));
    }
    if !common::is_valid_id(value) {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            format!("invalid {}", field),
        ));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_checked() {
        let id = common::song_id("/m/a.mp3");
        assert_eq!(require_id(Some(&id), "song_id").unwrap(), id);
        assert_eq!(require_id(None, "song_id").unwrap_err().0, StatusCode::BAD_REQUEST);
        assert_eq!(require_id(Some("  "), "song_id").unwrap_err().0, StatusCode::BAD_REQUEST);
        let (status, Json(body)) = require_id(Some("42"), "song_id").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "invalid song_id");
    }
}
