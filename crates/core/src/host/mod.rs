//! Document hosts: where uploaded bytes actually live.
//!
//! The relay never stores file content itself. A [`FileHost`] takes a
//! document, hands back an opaque file handle, and later turns that handle
//! into a byte stream.
//!
//! ```text
//! send_document(bytes, name) ──► file_id
//! resolve(file_id)           ──► file_path
//! fetch(file_path)           ──► status + headers + byte stream
//! ```

mod error;
mod memory;
mod telegram;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::header::HeaderMap;

pub use error::HostError;
pub use memory::MemoryHost;
pub use telegram::TelegramHost;

/// A document to hand to the host.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Original filename as declared by the client.
    pub filename: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// File content.
    pub bytes: Bytes,
}

/// What the host returns for a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Opaque file handle.
    pub file_id: String,
    /// Byte count as reported by the host.
    pub file_size: u64,
}

/// File content as served by the host.
pub struct FileStream {
    /// Status of the host's response.
    pub status: u16,
    /// Headers of the host's response.
    pub headers: HeaderMap,
    /// Response body.
    pub body: BoxStream<'static, Result<Bytes, HostError>>,
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// External document storage.
#[async_trait]
pub trait FileHost: Send + Sync {
    /// Store a document and return its handle.
    async fn send_document(&self, document: DocumentUpload) -> Result<StoredDocument, HostError>;

    /// Turn a file handle into a host-relative retrieval path.
    async fn resolve(&self, file_id: &str) -> Result<String, HostError>;

    /// Open the content at a retrieval path.
    async fn fetch(&self, file_path: &str) -> Result<FileStream, HostError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
