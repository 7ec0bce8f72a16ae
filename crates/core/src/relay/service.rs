//! Relay service implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::RelaySettings;
use super::error::{RelayError, Stage};
use super::types::{IncomingFile, StoredFile};
use crate::host::{DocumentUpload, FileHost, FileStream};
use crate::identifier;
use crate::store::MappingStore;

/// Relays files between clients, a document host and a mapping store.
pub struct RelayService {
    host: Arc<dyn FileHost>,
    store: Arc<dyn MappingStore>,
    settings: RelaySettings,
}

impl RelayService {
    /// Create a new relay service.
    #[must_use]
    pub fn new(
        host: Arc<dyn FileHost>,
        store: Arc<dyn MappingStore>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            host,
            store,
            settings,
        }
    }

    /// Check a batch against the limits before anything leaves the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is empty or any file is too large.
    pub fn validate(&self, files: &[IncomingFile]) -> Result<(), RelayError> {
        if files.is_empty() {
            return Err(RelayError::NoFiles);
        }

        if let Some(file) = files
            .iter()
            .find(|file| file.size() > self.settings.max_file_size)
        {
            return Err(RelayError::file_too_large(
                &file.name,
                file.size(),
                self.settings.max_file_size,
            ));
        }

        Ok(())
    }

    /// Validate and store a batch, one file after another.
    ///
    /// Stops at the first failure. Files stored before the failure keep
    /// their mappings; nothing is rolled back.
    ///
    /// # Errors
    ///
    /// Returns the validation error, or the first upload failure.
    pub async fn upload_all(&self, files: Vec<IncomingFile>) -> Result<Vec<StoredFile>, RelayError> {
        self.validate(&files)?;

        let total = files.len();
        let mut stored = Vec::with_capacity(total);
        for file in files {
            match self.upload(file).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    if !stored.is_empty() {
                        warn!(
                            stored = stored.len(),
                            total,
                            "Batch aborted after partial upload"
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(stored)
    }

    /// Store one file and record its public mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if no identifier can be allocated, or the host or
    /// the store fails.
    pub async fn upload(&self, file: IncomingFile) -> Result<StoredFile, RelayError> {
        let public_id = self.allocate_public_id(&file.name).await?;

        let document = self
            .host
            .send_document(DocumentUpload {
                filename: file.name.clone(),
                content_type: file.content_type,
                bytes: file.bytes,
            })
            .await
            .map_err(|e| RelayError::host(Stage::Upload, e))?;

        self.store
            .put(&public_id, &document.file_id)
            .await
            .map_err(|e| RelayError::store(Stage::Upload, e))?;

        info!(
            public_id = %public_id,
            file_name = %file.name,
            size = document.file_size,
            "File stored"
        );

        Ok(StoredFile {
            hash: identifier::hash_of(&public_id).to_string(),
            public_id,
            name: file.name,
            size: document.file_size,
        })
    }

    /// Generate a public id not yet present in the store.
    async fn allocate_public_id(&self, filename: &str) -> Result<String, RelayError> {
        for attempt in 1..=self.settings.id_attempts {
            let candidate = (self.settings.id_generator)(filename);
            let taken = self
                .store
                .get(&candidate)
                .await
                .map_err(|e| RelayError::store(Stage::Upload, e))?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
            debug!(attempt, candidate = %candidate, "Public id already taken");
        }

        Err(RelayError::IdCollision {
            attempts: self.settings.id_attempts,
        })
    }

    /// Look up the file handle behind a public id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or a store error.
    pub async fn lookup(&self, public_id: &str) -> Result<String, RelayError> {
        self.store
            .get(public_id)
            .await
            .map_err(|e| RelayError::store(Stage::Download, e))?
            .ok_or_else(|| RelayError::NotFound(public_id.to_string()))
    }

    /// Open the content behind a public id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown ids, or the failing host/store step.
    pub async fn download(&self, public_id: &str) -> Result<FileStream, RelayError> {
        let file_id = self.lookup(public_id).await?;

        let file_path = self
            .host
            .resolve(&file_id)
            .await
            .map_err(|e| RelayError::host(Stage::Download, e))?;

        let stream = self
            .host
            .fetch(&file_path)
            .await
            .map_err(|e| RelayError::host(Stage::Download, e))?;

        debug!(public_id, status = stream.status, "Serving file");
        Ok(stream)
    }

    /// Get the settings.
    #[must_use]
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Name of the document host backend.
    #[must_use]
    pub fn host_name(&self) -> &'static str {
        self.host.name()
    }

    /// Name of the mapping store backend.
    #[must_use]
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}
