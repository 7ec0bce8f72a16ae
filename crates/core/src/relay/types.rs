//! Relay domain types.

use bytes::Bytes;

/// A file received from a client, held for the duration of one request.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Declared filename.
    pub name: String,
    /// Declared content type.
    pub content_type: Option<String>,
    /// File content.
    pub bytes: Bytes,
}

impl IncomingFile {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of relaying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Public id, the mapping key (`aB3dE9fZ.png`).
    pub public_id: String,
    /// Public id without extension (`aB3dE9fZ`).
    pub hash: String,
    /// Original filename.
    pub name: String,
    /// Size reported by the document host.
    pub size: u64,
}
