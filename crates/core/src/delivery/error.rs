//! Delivery error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur when opening a download.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No deliverable object: never existed, already consumed, claimed by
    /// another download, or not a valid identifier.
    #[error("no deliverable object for {0}")]
    NotFound(String),

    /// The object exists but could not be read.
    #[error("failed to read stored object: {0}")]
    StorageReadFailed(#[source] StorageError),
}

impl DeliveryError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::StorageReadFailed(_) => 500,
        }
    }

    /// Message shown to the downloader.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "File not found",
            Self::StorageReadFailed(_) => "Error reading file",
        }
    }
}

impl From<StorageError> for DeliveryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound(key),
            other => Self::StorageReadFailed(other),
        }
    }
}
