//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - `POST /upload` and `GET /f/{publicId}`
//! - A JSON 404 for everything else
//! - Error rendering and request tracing

pub mod error;
pub mod routes;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::{Router, body::Body, extract::DefaultBodyLimit, http::Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use filerelay_core::relay::RelayService;
use filerelay_shared::config::ServerConfig;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Relay service doing the actual work.
    pub relay: Arc<RelayService>,
    /// Fixed public origin for download links, without trailing slash.
    pub public_url: Option<String>,
    /// Upper bound on an upload request body.
    pub max_request_bytes: usize,
}

impl AppState {
    /// Create state from a relay service and the server configuration.
    #[must_use]
    pub fn new(relay: Arc<RelayService>, server: &ServerConfig) -> Self {
        Self {
            relay,
            public_url: server
                .public_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            max_request_bytes: server.max_request_bytes,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_request_bytes;

    Router::new()
        .merge(routes::routes())
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::test_support::{TestApp, body_json};

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let app = TestApp::new();

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"success": false, "error": "Not found"})
        );
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_404() {
        let app = TestApp::new();

        for (method, uri) in [("GET", "/upload"), ("POST", "/f/abc.png"), ("DELETE", "/f/abc")] {
            let response = app
                .router()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(
                body_json(response).await["error"],
                "Not found",
                "{method} {uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_bare_prefix_is_not_found() {
        let app = TestApp::new();

        let response = app
            .router()
            .oneshot(Request::builder().uri("/f/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let app = TestApp::new();

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .uri("/nope")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }
}
