//! `GET /f/{publicId}`: stream a stored file back to the client.

use axum::{
    Router,
    body::Body,
    extract::{Path, State, rejection::PathRejection},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{debug, warn};

use super::not_found;
use crate::{AppState, error::ApiError};

/// Downloads are immutable, so clients may cache them for a year.
pub const CACHE_FOREVER: &str = "public, max-age=31536000";

/// Headers that describe the upstream connection rather than the content.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Creates the download route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/f/{*public_id}", get(download_file).fallback(not_found))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_forwardable(name: &HeaderName) -> bool {
    *name != CONTENT_DISPOSITION
        && *name != CACHE_CONTROL
        && !HOP_BY_HOP.contains(&name.as_str())
}

/// Filename safe to place inside a quoted `Content-Disposition` value.
fn disposition_filename(public_id: &str) -> String {
    let cleaned: String = public_id
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn response_headers(public_id: &str, upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len() + 2);
    for (name, value) in upstream {
        if is_forwardable(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let disposition = format!(
        "attachment; filename=\"{}\"",
        disposition_filename(public_id)
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_FOREVER));
    headers
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/f/{publicId}`
/// Stream the file behind a public id, mirroring the host's status.
async fn download_file(
    State(state): State<AppState>,
    public_id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    // Ids that do not decode to UTF-8 can never have been issued.
    let Path(public_id) = public_id.map_err(|e| {
        warn!(error = %e, "Undecodable public id");
        ApiError::not_found("File not found")
    })?;
    if public_id.is_empty() {
        return Err(ApiError::not_found("Not found"));
    }

    let stream = state
        .relay
        .download(&public_id)
        .await
        .map_err(|e| ApiError::from_relay(e, "download"))?;

    let status = StatusCode::from_u16(stream.status).unwrap_or(StatusCode::OK);
    let headers = response_headers(&public_id, &stream.headers);
    debug!(public_id = %public_id, status = status.as_u16(), "Streaming file");

    Ok((status, headers, Body::from_stream(stream.body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{
        Request,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    };
    use rstest::rstest;
    use tower::ServiceExt;

    use bytes::Bytes;
    use filerelay_core::host::{DocumentUpload, FileHost};
    use filerelay_core::store::MappingStore;

    use crate::test_support::{
        Part, TestApp, body_bytes, body_json, multipart_body, multipart_content_type,
    };

    async fn upload_one(app: &TestApp, name: &str, content_type: &str, content: &[u8]) -> String {
        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header(CONTENT_TYPE, multipart_content_type())
                    .body(Body::from(multipart_body(&[Part::file(
                        name,
                        content_type,
                        content,
                    )])))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let url = json["files"][0]["url"].as_str().unwrap().to_string();
        url.trim_start_matches("https://files.example.com").to_string()
    }

    async fn get(app: &TestApp, uri: &str) -> Response {
        app.router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[rstest]
    #[case("aB3dE9fZ.png", "aB3dE9fZ.png")]
    #[case("we\"ird\\id", "we_ird_id")]
    #[case("dir/file.txt", "dir_file.txt")]
    #[case("caf\u{e9}.txt", "caf_.txt")]
    #[case("", "file")]
    fn test_disposition_filename(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(disposition_filename(input), expected);
    }

    #[test]
    fn test_response_headers_filter_upstream() {
        let mut upstream = HeaderMap::new();
        upstream.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        upstream.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        upstream.insert("connection", HeaderValue::from_static("keep-alive"));
        upstream.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        upstream.insert(
            CONTENT_DISPOSITION,
            HeaderValue::from_static("inline; filename=\"file_7.png\""),
        );

        let headers = response_headers("aB3dE9fZ.png", &upstream);

        assert_eq!(headers[CONTENT_TYPE], "image/png");
        assert_eq!(headers[CACHE_CONTROL], CACHE_FOREVER);
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            "attachment; filename=\"aB3dE9fZ.png\""
        );
        assert!(headers.get("transfer-encoding").is_none());
        assert!(headers.get("connection").is_none());
    }

    #[tokio::test]
    async fn test_download_round_trip() {
        let app = TestApp::new();
        let path = upload_one(&app, "cat.png", "image/png", b"\x89PNG-bytes").await;

        let response = get(&app, &path).await;

        assert_eq!(response.status(), StatusCode::OK);
        let public_id = path.trim_start_matches("/f/");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            format!("attachment; filename=\"{public_id}\"").as_str()
        );
        assert_eq!(response.headers()[CACHE_CONTROL], CACHE_FOREVER);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[CONTENT_LENGTH], "10");
        assert_eq!(body_bytes(response).await, b"\x89PNG-bytes");
    }

    #[tokio::test]
    async fn test_repeated_downloads_are_identical() {
        let app = TestApp::new();
        let path = upload_one(&app, "notes.txt", "text/plain", b"same every time").await;

        let first = body_bytes(get(&app, &path).await).await;
        let second = body_bytes(get(&app, &path).await).await;

        assert_eq!(first, b"same every time");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_id_is_file_not_found() {
        let app = TestApp::new();

        let response = get(&app, "/f/missing1.png").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"success": false, "error": "File not found"})
        );
    }

    #[tokio::test]
    async fn test_dangling_handle_is_download_failed() {
        let app = TestApp::new();
        app.store.put("orphan01.bin", "mem-99999999").await.unwrap();

        let response = get(&app, "/f/orphan01.bin").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"success": false, "error": "Download failed"})
        );
    }

    #[tokio::test]
    async fn test_public_id_is_percent_decoded() {
        let app = TestApp::new();
        app.store.put("a b.txt", "mem-00000000").await.unwrap();
        app.host
            .send_document(DocumentUpload {
                filename: "a b.txt".to_string(),
                content_type: None,
                bytes: Bytes::from_static(b"spaced"),
            })
            .await
            .unwrap();

        let response = get(&app, "/f/a%20b.txt").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(body_bytes(response).await, b"spaced");
    }

    #[rstest]
    #[case("/f/%FF.png")]
    #[case("/f/abc%C3.txt")]
    #[tokio::test]
    async fn test_undecodable_id_is_json_not_found(#[case] uri: &str) {
        let app = TestApp::new();

        let response = get(&app, uri).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"success": false, "error": "File not found"})
        );
    }
}
