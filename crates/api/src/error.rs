//! HTTP rendering of application errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use filerelay_core::relay::RelayError;
use filerelay_shared::AppError;

/// Error body: `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human readable message.
    pub error: String,
}

/// An [`AppError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 400 with the given message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 404 with the given message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }

    /// Map a relay error, logging its full detail first.
    ///
    /// Provider descriptions only ever reach the log, never the client.
    #[must_use]
    pub fn from_relay(err: RelayError, action: &'static str) -> Self {
        let detail = err.to_string();
        let api = Self::from(err);
        if api.0.status_code() >= 500 {
            error!(error = %detail, action, code = api.0.error_code(), "Request failed");
        } else {
            warn!(error = %detail, action, code = api.0.error_code(), "Request rejected");
        }
        api
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self(AppError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            success: false,
            error: self.0.message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
