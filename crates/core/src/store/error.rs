//! Mapping store error types.

use thiserror::Error;

/// Mapping store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with an error.
    #[error("store API error ({status}): {message}")]
    Api {
        /// HTTP status of the store response.
        status: u16,
        /// Error detail reported by the store.
        message: String,
    },

    /// Transport failure.
    #[error("store request failed: {0}")]
    Http(String),

    /// The key cannot be used with this store.
    #[error("invalid store key: {0}")]
    InvalidKey(String),

    /// Store client could not be configured.
    #[error("store configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Create an API error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url().to_string())
    }
}
