//! Relay error types.

use std::fmt;

use filerelay_shared::AppError;
use thiserror::Error;

use crate::host::HostError;
use crate::store::StoreError;

/// Which half of the relay failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Storing a file.
    Upload,
    /// Serving a file.
    Download,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Download => f.write_str("download"),
        }
    }
}

/// Relay operation errors.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request carried no files.
    #[error("no files provided")]
    NoFiles,

    /// A file is over the size ceiling.
    #[error("file '{name}' is {size} bytes, maximum is {max} bytes")]
    FileTooLarge {
        /// Declared filename.
        name: String,
        /// Actual size.
        size: u64,
        /// Ceiling.
        max: u64,
    },

    /// No mapping exists for the public id.
    #[error("no mapping for public id {0}")]
    NotFound(String),

    /// Every generated identifier was already taken.
    #[error("no free public id after {attempts} attempts")]
    IdCollision {
        /// Attempts made.
        attempts: u32,
    },

    /// The document host failed.
    #[error("{stage} failed at document host: {source}")]
    Host {
        /// Operation in progress.
        stage: Stage,
        /// Host error.
        #[source]
        source: HostError,
    },

    /// The mapping store failed.
    #[error("{stage} failed at mapping store: {source}")]
    Store {
        /// Operation in progress.
        stage: Stage,
        /// Store error.
        #[source]
        source: StoreError,
    },
}

impl RelayError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(name: impl Into<String>, size: u64, max: u64) -> Self {
        Self::FileTooLarge {
            name: name.into(),
            size,
            max,
        }
    }

    /// Wrap a host error.
    #[must_use]
    pub fn host(stage: Stage, source: HostError) -> Self {
        Self::Host { stage, source }
    }

    /// Wrap a store error.
    #[must_use]
    pub fn store(stage: Stage, source: StoreError) -> Self {
        Self::Store { stage, source }
    }
}

fn failed(stage: Stage) -> String {
    match stage {
        Stage::Upload => "Upload failed".to_string(),
        Stage::Download => "Download failed".to_string(),
    }
}

/// Client-facing mapping. Upstream details stay in the logs.
impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::NoFiles => Self::Validation("No files provided".to_string()),
            RelayError::FileTooLarge { name, max, .. } => Self::Validation(format!(
                "File \"{name}\" exceeds the {}MB limit",
                max / (1024 * 1024)
            )),
            RelayError::NotFound(_) => Self::NotFound("File not found".to_string()),
            RelayError::IdCollision { .. } => {
                Self::Internal("Could not allocate a file identifier".to_string())
            }
            RelayError::Host {
                stage: Stage::Upload,
                source,
            } if source.is_rejection() => {
                Self::Validation("File rejected by storage provider".to_string())
            }
            RelayError::Host { stage, .. } | RelayError::Store { stage, .. } => {
                Self::ExternalService(failed(stage))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_mapping() {
        let err = AppError::from(RelayError::NoFiles);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "No files provided");

        let err = AppError::from(RelayError::file_too_large(
            "big.iso",
            60 * 1024 * 1024,
            50 * 1024 * 1024,
        ));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "File \"big.iso\" exceeds the 50MB limit");
    }

    #[test]
    fn test_not_found_mapping() {
        let err = AppError::from(RelayError::NotFound("x.png".to_string()));
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "File not found");
    }

    #[test]
    fn test_host_rejection_is_client_error() {
        let err = AppError::from(RelayError::host(
            Stage::Upload,
            HostError::from_api(400, "Bad Request: file is too big"),
        ));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "File rejected by storage provider");
    }

    #[test]
    fn test_host_failure_hides_detail() {
        let err = AppError::from(RelayError::host(
            Stage::Upload,
            HostError::from_api(400, "Bad Request: chat not found"),
        ));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Upload failed");

        let err = AppError::from(RelayError::host(Stage::Download, HostError::Status(502)));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Download failed");
    }

    #[test]
    fn test_store_failure_mapping() {
        let err = AppError::from(RelayError::store(
            Stage::Upload,
            StoreError::Http("connection reset".to_string()),
        ));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Upload failed");
    }

    #[test]
    fn test_display_keeps_context() {
        let err = RelayError::host(Stage::Download, HostError::Status(404));
        assert_eq!(
            err.to_string(),
            "download failed at document host: file fetch returned status 404"
        );
    }
}
