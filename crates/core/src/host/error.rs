//! Document host error types.

use thiserror::Error;

/// Document host operation errors.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host refused the document itself (size, emptiness).
    #[error("document rejected by host ({code}): {description}")]
    Rejected {
        /// Provider error code.
        code: u16,
        /// Provider description.
        description: String,
    },

    /// The host reported any other failure.
    #[error("host API error ({code}): {description}")]
    Api {
        /// Provider error code.
        code: u16,
        /// Provider description.
        description: String,
    },

    /// File content could not be fetched.
    #[error("file fetch returned status {0}")]
    Status(u16),

    /// The host answered with something we could not interpret.
    #[error("unexpected host response: {0}")]
    UnexpectedResponse(String),

    /// Transport failure. Never carries the request URL (it embeds the credential).
    #[error("host request failed: {0}")]
    Http(String),

    /// Host client could not be configured.
    #[error("host configuration error: {0}")]
    Configuration(String),
}

impl HostError {
    /// Build an error from a provider failure, classifying document rejections.
    #[must_use]
    pub fn from_api(code: u16, description: impl Into<String>) -> Self {
        let description = description.into();
        let lower = description.to_ascii_lowercase();
        if code == 413
            || lower.contains("too big")
            || lower.contains("too large")
            || lower.contains("must be non-empty")
        {
            Self::Rejected { code, description }
        } else {
            Self::Api { code, description }
        }
    }

    /// Whether the failure is about the document rather than the host.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(400, "Bad Request: file is too big", true)]
    #[case(413, "Request Entity Too Large", true)]
    #[case(400, "Bad Request: file must be non-empty", true)]
    #[case(400, "Bad Request: chat not found", false)]
    #[case(401, "Unauthorized", false)]
    #[case(429, "Too Many Requests: retry after 5", false)]
    fn test_from_api_classification(
        #[case] code: u16,
        #[case] description: &str,
        #[case] rejected: bool,
    ) {
        assert_eq!(HostError::from_api(code, description).is_rejection(), rejected);
    }

    #[test]
    fn test_display_keeps_description() {
        let err = HostError::from_api(400, "Bad Request: chat not found");
        assert_eq!(
            err.to_string(),
            "host API error (400): Bad Request: chat not found"
        );
    }
}
