//! Upload admission error types.

use std::fmt;

use thiserror::Error;

use crate::identifier::IdentifierError;
use crate::storage::StorageError;

/// Ways an upload payload can be unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedInput {
    /// Multipart body had no `file` part.
    MissingFile,
    /// The `file` part could not be read.
    UnreadableFile,
    /// The body could not be parsed as a form.
    UnparseableForm,
    /// URL-encoded body had no `data` field, or it was empty.
    MissingData,
    /// The `data` field was not valid base64.
    InvalidBase64,
}

impl MalformedInput {
    /// Message reported to the uploader.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingFile => "Error retrieving file",
            Self::UnreadableFile => "Error reading file",
            Self::UnparseableForm => "Error parsing form",
            Self::MissingData => "No file data provided",
            Self::InvalidBase64 => "Error decoding base64 data",
        }
    }
}

impl fmt::Display for MalformedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Upload admission errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Missing or wrong API key.
    #[error("missing or invalid API key")]
    Unauthorized,

    /// Body is neither multipart nor URL-encoded.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// File exceeds the configured maximum.
    #[error("payload exceeds maximum of {max} bytes")]
    PayloadTooLarge {
        /// Maximum allowed size.
        max: u64,
    },

    /// Resolved media type is not on the allow-list.
    #[error("file type not allowed: {0}")]
    FileTypeNotAllowed(String),

    /// Payload could not be extracted or decoded.
    #[error("malformed input: {0}")]
    MalformedInput(MalformedInput),

    /// No identifier could be minted.
    #[error("identifier generation failed: {0}")]
    EntropyUnavailable(#[from] IdentifierError),

    /// Object could not be persisted.
    #[error("storage write failed: {0}")]
    StorageWriteFailed(#[source] StorageError),
}

impl From<MalformedInput> for UploadError {
    fn from(kind: MalformedInput) -> Self {
        Self::MalformedInput(kind)
    }
}

impl UploadError {
    /// Create a payload too large error.
    #[must_use]
    pub fn too_large(max: u64) -> Self {
        Self::PayloadTooLarge { max }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Only authentication failures change the status; every other rejection
    /// is reported in a `success: false` body.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            _ => 200,
        }
    }

    /// Returns the error code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UnsupportedContentType(_) => "UNSUPPORTED_CONTENT_TYPE",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::FileTypeNotAllowed(_) => "FILE_TYPE_NOT_ALLOWED",
            Self::MalformedInput(_) => "MALFORMED_INPUT",
            Self::EntropyUnavailable(_) => "ENTROPY_UNAVAILABLE",
            Self::StorageWriteFailed(_) => "STORAGE_WRITE_FAILED",
        }
    }

    /// Message reported to the uploader.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::UnsupportedContentType(_) => "Unsupported content type",
            Self::PayloadTooLarge { .. } => "File too large",
            Self::FileTypeNotAllowed(_) => "File type not allowed",
            Self::MalformedInput(kind) => kind.message(),
            Self::EntropyUnavailable(_) => "Error generating filename",
            Self::StorageWriteFailed(_) => "Error saving file",
        }
    }
}
