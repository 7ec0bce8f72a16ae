//! API route definitions.

use axum::Router;

use crate::{AppState, error::ApiError};

pub mod download;
pub mod upload;

/// Creates the API router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(upload::routes())
        .merge(download::routes())
}

/// Fallback for every unmatched method/path combination.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
