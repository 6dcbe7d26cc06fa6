//! Storage service implementation using Apache OpenDAL.

use std::io;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use opendal::{Operator, services};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Metadata about a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Object size in bytes.
    pub size: u64,
}

/// An opened object: its size and a stream over its bytes.
pub struct BlobStream {
    /// Object size in bytes.
    pub size: u64,
    /// Object content.
    pub stream: BoxStream<'static, io::Result<Bytes>>,
}

impl std::fmt::Debug for BlobStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStream")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Storage service over a flat namespace of immutable objects.
///
/// Shared across all requests. Distinct keys never interact; reads and
/// deletes of the same key may run concurrently.
#[derive(Clone)]
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// For the local filesystem the root and staging directories are created
    /// if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(mut config: StorageConfig) -> Result<Self, StorageError> {
        if let Some(staging) = config.staging_dir() {
            std::fs::create_dir_all(&staging).map_err(|e| {
                StorageError::configuration(format!("cannot create {}: {e}", staging.display()))
            })?;
        }
        if let StorageProvider::LocalFs { root } = &mut config.provider {
            *root = std::fs::canonicalize(&*root).map_err(|e| {
                StorageError::configuration(format!("cannot resolve {}: {e}", root.display()))
            })?;
        }

        let operator = Self::create_operator(&config)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(config: &StorageConfig) -> Result<Operator, StorageError> {
        match &config.provider {
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                let mut builder = services::Fs::default().root(root);
                if let Some(staging) = config.staging_dir() {
                    let staging = staging
                        .to_str()
                        .ok_or_else(|| StorageError::configuration("invalid staging path"))?
                        .to_string();
                    builder = builder.atomic_write_dir(&staging);
                }

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::Memory => Ok(Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()),
        }
    }

    /// Write a complete object under `key`.
    ///
    /// The object only becomes visible once fully written.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.operator
            .write(key, data)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        Ok(())
    }

    /// Look up an object's metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if there is no such object.
    pub async fn stat(&self, key: &str) -> Result<BlobMetadata, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;

        Ok(BlobMetadata {
            size: meta.content_length(),
        })
    }

    /// Open an object for streaming.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if there is no such object, or an
    /// operation error if it cannot be read.
    pub async fn open(&self, key: &str) -> Result<BlobStream, StorageError> {
        let BlobMetadata { size } = self.stat(key).await?;

        let reader = self
            .operator
            .reader(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        let stream = reader
            .into_bytes_stream(..)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?
            .map(|chunk| chunk.map_err(|e| io::Error::other(e.to_string())))
            .boxed();

        Ok(BlobStream { size, stream })
    }

    /// Delete an object. Deleting an absent object succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))
    }

    /// Check if an object exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        self.stat(key).await.is_ok()
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }
}
