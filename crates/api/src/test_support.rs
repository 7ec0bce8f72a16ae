//! Router test fixtures: in-memory host and store behind a real router.

use std::sync::Arc;

use axum::{Router, response::Response};
use http_body_util::BodyExt;

use filerelay_core::host::MemoryHost;
use filerelay_core::relay::{RelayService, RelaySettings};
use filerelay_core::store::MemoryStore;

use crate::{AppState, create_router};

pub const BOUNDARY: &str = "----filerelay-test-boundary";

pub struct TestApp {
    pub state: AppState,
    pub host: Arc<MemoryHost>,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(RelaySettings::new())
    }

    pub fn with_settings(settings: RelaySettings) -> Self {
        let host = Arc::new(MemoryHost::new());
        let store = Arc::new(MemoryStore::default());
        let relay = RelayService::new(host.clone(), store.clone(), settings);
        let state = AppState {
            relay: Arc::new(relay),
            public_url: Some("https://files.example.com".to_string()),
            max_request_bytes: 1024 * 1024,
        };
        Self { state, host, store }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }
}

/// One multipart part: field name, optional filename + content type, content.
pub struct Part<'a> {
    pub field: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: &'a str,
    pub content: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(filename: &'a str, content_type: &'a str, content: &'a [u8]) -> Self {
        Self {
            field: "files[]",
            filename: Some(filename),
            content_type,
            content,
        }
    }

    pub fn text(field: &'a str, content: &'a str) -> Self {
        Self {
            field,
            filename: None,
            content_type: "text/plain",
            content: content.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\nContent-Type: {}\r\n\r\n",
                    part.field, part.content_type
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.field)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be JSON")
}
