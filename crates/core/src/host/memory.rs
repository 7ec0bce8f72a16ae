//! In-process document host (development only).
//!
//! Mirrors the Telegram contract: opaque handles, a separate retrieval path,
//! and content served with `content-type`/`content-length` headers. Content
//! is lost on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio::sync::RwLock;

use super::{DocumentUpload, FileHost, FileStream, HostError, StoredDocument};

#[derive(Debug, Clone)]
struct Blob {
    file_path: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Document host keeping everything in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    next_id: AtomicU64,
    blobs: RwLock<HashMap<String, Blob>>,
}

impl MemoryHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Whether nothing has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl FileHost for MemoryHost {
    async fn send_document(&self, document: DocumentUpload) -> Result<StoredDocument, HostError> {
        if document.bytes.is_empty() {
            return Err(HostError::from_api(
                400,
                "Bad Request: file must be non-empty",
            ));
        }

        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let file_id = format!("mem-{n:08}");
        let file_size = document.bytes.len() as u64;
        let blob = Blob {
            file_path: format!("documents/file_{n}"),
            content_type: document.content_type,
            bytes: document.bytes,
        };
        self.blobs.write().await.insert(file_id.clone(), blob);

        Ok(StoredDocument { file_id, file_size })
    }

    async fn resolve(&self, file_id: &str) -> Result<String, HostError> {
        self.blobs
            .read()
            .await
            .get(file_id)
            .map(|blob| blob.file_path.clone())
            .ok_or_else(|| HostError::from_api(400, "Bad Request: invalid file_id"))
    }

    async fn fetch(&self, file_path: &str) -> Result<FileStream, HostError> {
        let blobs = self.blobs.read().await;
        let blob = blobs
            .values()
            .find(|blob| blob.file_path == file_path)
            .ok_or(HostError::Status(404))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(blob.bytes.len()));
        let content_type = blob
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
            .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
        headers.insert(CONTENT_TYPE, content_type);

        let bytes = blob.bytes.clone();
        Ok(FileStream {
            status: 200,
            headers,
            body: futures::stream::once(async move { Ok(bytes) }).boxed(),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn upload(name: &str, content: &'static [u8]) -> DocumentUpload {
        DocumentUpload {
            filename: name.to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: Bytes::from_static(content),
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let host = MemoryHost::new();
        let stored = host
            .send_document(upload("notes.txt", b"hello"))
            .await
            .expect("store");
        assert_eq!(stored.file_size, 5);

        let path = host.resolve(&stored.file_id).await.expect("resolve");
        let stream = host.fetch(&path).await.expect("fetch");
        assert_eq!(stream.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(stream.headers.get(CONTENT_LENGTH).unwrap(), "5");

        let chunks: Vec<Bytes> = stream.body.try_collect().await.expect("body");
        assert_eq!(chunks.concat(), b"hello");
    }

    #[tokio::test]
    async fn test_handles_are_distinct() {
        let host = MemoryHost::new();
        let a = host.send_document(upload("a.txt", b"a")).await.unwrap();
        let b = host.send_document(upload("a.txt", b"a")).await.unwrap();
        assert_ne!(a.file_id, b.file_id);
        assert_eq!(host.len().await, 2);
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let host = MemoryHost::new();
        let err = host
            .send_document(upload("empty.txt", b""))
            .await
            .unwrap_err();
        assert!(err.is_rejection());
        assert!(host.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_handle_and_path() {
        let host = MemoryHost::new();
        assert!(matches!(
            host.resolve("mem-404").await,
            Err(HostError::Api { .. })
        ));
        assert!(matches!(
            host.fetch("documents/none").await,
            Err(HostError::Status(404))
        ));
    }
}
