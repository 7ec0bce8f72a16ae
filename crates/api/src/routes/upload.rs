//! `POST /upload`: relay multipart files to the document host.

use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::{
        HeaderMap,
        header::{CONTENT_TYPE, HOST},
    },
    routing::post,
};
use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;

use filerelay_core::relay::{IncomingFile, StoredFile};
use filerelay_shared::AppError;

use super::not_found;
use crate::{AppState, error::ApiError};

/// Form field carrying the files.
pub const FILES_FIELD: &str = "files[]";

const INVALID_CONTENT_TYPE: &str = "Invalid Content-Type. Must be multipart/form-data";
const INVALID_FORM: &str = "Invalid form data";
const INVALID_HOST: &str = "Invalid Host header";

/// Creates the upload route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_files).fallback(not_found))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// One stored file.
#[derive(Debug, Serialize)]
pub struct UploadedFile {
    /// Public id without extension.
    pub hash: String,
    /// Original filename.
    pub name: String,
    /// Absolute download link.
    pub url: String,
    /// Size reported by the document host.
    pub size: u64,
}

/// Successful upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Stored files, in request order.
    pub files: Vec<UploadedFile>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// Origin used in download links: the configured public URL, otherwise
/// rebuilt from `X-Forwarded-Proto` and `Host`.
fn request_origin(state: &AppState, headers: &HeaderMap) -> Result<Url, ApiError> {
    if let Some(public_url) = &state.public_url {
        return base_url(public_url).ok_or_else(|| {
            error!(public_url = %public_url, "Configured public URL is not a valid base URL");
            ApiError(AppError::Internal("Invalid public URL configuration".to_string()))
        });
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    base_url(&format!("{scheme}://{host}")).ok_or_else(|| {
        warn!(host, scheme, "Request origin is not a valid URL");
        ApiError::bad_request(INVALID_HOST)
    })
}

fn base_url(origin: &str) -> Option<Url> {
    Url::parse(origin).ok().filter(|url| !url.cannot_be_a_base())
}

/// `{origin}/f/{publicId}`, with the id percent-encoded as one path segment.
fn download_url(origin: &Url, public_id: &str) -> String {
    let mut url = origin.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("f").push(public_id);
    }
    url.to_string()
}

fn invalid_form(err: &MultipartError) -> ApiError {
    warn!(error = %err, "Malformed multipart body");
    ApiError::bad_request(INVALID_FORM)
}

/// Read every `files[]` part carrying a filename. Other parts are skipped.
async fn read_files(mut multipart: Multipart) -> Result<Vec<IncomingFile>, ApiError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| invalid_form(&e))? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let Some(name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| invalid_form(&e))?;

        files.push(IncomingFile {
            name,
            content_type,
            bytes,
        });
    }

    Ok(files)
}

fn to_response_file(origin: &Url, file: StoredFile) -> UploadedFile {
    UploadedFile {
        url: download_url(origin, &file.public_id),
        hash: file.hash,
        name: file.name,
        size: file.size,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/upload`
/// Store every `files[]` part and return their public links.
async fn upload_files(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<UploadResponse>, ApiError> {
    if !is_multipart(request.headers()) {
        return Err(ApiError::bad_request(INVALID_CONTENT_TYPE));
    }

    let origin = request_origin(&state, request.headers())?;
    let multipart = Multipart::from_request(request, &state).await.map_err(|e| {
        warn!(error = %e, "Multipart extraction rejected");
        ApiError::bad_request(INVALID_FORM)
    })?;

    let files = read_files(multipart).await?;
    let count = files.len();

    let stored = state
        .relay
        .upload_all(files)
        .await
        .map_err(|e| ApiError::from_relay(e, "upload"))?;

    info!(count, "Upload completed");

    Ok(Json(UploadResponse {
        success: true,
        files: stored
            .into_iter()
            .map(|file| to_response_file(&origin, file))
            .collect(),
    }))
}
