//! Relay settings.

use filerelay_shared::config::UploadConfig;

use crate::identifier;

/// Produces a public id for a filename.
pub type IdGenerator = fn(&str) -> String;

/// Relay service settings.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Maximum size of a single file in bytes.
    pub max_file_size: u64,
    /// Identifiers tried per file before giving up on collisions.
    pub id_attempts: u32,
    /// Identifier source.
    pub id_generator: IdGenerator,
}

impl RelaySettings {
    /// Default max file size: 50 MiB, the Bot API upload ceiling.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
    /// Default identifier attempts.
    pub const DEFAULT_ID_ATTEMPTS: u32 = 5;

    /// Create settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            id_attempts: Self::DEFAULT_ID_ATTEMPTS,
            id_generator: identifier::generate_public_id,
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set identifier attempts. Zero is treated as one.
    #[must_use]
    pub fn with_id_attempts(mut self, attempts: u32) -> Self {
        self.id_attempts = attempts.max(1);
        self
    }

    /// Replace the identifier source.
    #[must_use]
    pub fn with_id_generator(mut self, generator: IdGenerator) -> Self {
        self.id_generator = generator;
        self
    }

    /// Ceiling expressed in whole mebibytes, for messages.
    #[must_use]
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size / (1024 * 1024)
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&UploadConfig> for RelaySettings {
    fn from(config: &UploadConfig) -> Self {
        Self::new()
            .with_max_file_size(config.max_file_size)
            .with_id_attempts(config.id_attempts)
    }
}
