use std::io;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use crate::api::response::ApiError;
use crate::gateway::{FileListing, Message, UploadedFile};
use crate::AppState;

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_bucket(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let message = state.storage.create_bucket(&bucket).await?;
    Ok(Json(message))
}

/// Hands the `file` field to the backend as a reader; other fields are ignored.
/// Bodies of 8 MiB and up are multipart-uploaded by rust-s3, which buffers every
/// part before sending, so the route's body limit also bounds memory per request.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Message>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let body = StreamReader::new(field.map_err(io::Error::other));

        let file = UploadedFile {
            filename,
            content_type,
            body: Box::pin(body),
        };
        let message = state.storage.upload_file(&bucket, file).await?;
        return Ok(Json(message));
    }

    Err(ApiError::bad_request("file field is required"))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
) -> Result<Json<FileListing>, ApiError> {
    let listing = state.storage.list_files(&bucket).await?;
    Ok(Json(listing))
}

/// Returns the object bytes verbatim.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path((bucket, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let data = state.storage.download_file(&bucket, &filename).await?;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    headers.insert(
        header::CONTENT_TYPE,
        mime.as_ref()
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    if let Ok(value) = HeaderValue::from_str(&content_disposition(&filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// `attachment` disposition with `filename` as a quoted-string. Non-ASCII
/// names also get a percent-encoded `filename*` (RFC 6266).
fn content_disposition(filename: &str) -> String {
    let mut quoted = String::with_capacity(filename.len());
    for c in filename.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            c if c.is_control() => {}
            c if !c.is_ascii() => quoted.push('_'),
            c => quoted.push(c),
        }
    }

    if filename.is_ascii() {
        return format!("attachment; filename=\"{quoted}\"");
    }

    let mut encoded = String::new();
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{quoted}\"; filename*=UTF-8''{encoded}")
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((bucket, filename)): Path<(String, String)>,
) -> Result<Json<Message>, ApiError> {
    let message = state.storage.delete_file(&bucket, &filename).await?;
    Ok(Json(message))
}
