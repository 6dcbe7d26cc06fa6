//! Upload transport shapes and results.

use bytes::Bytes;

use super::error::UploadError;

/// The two body encodings accepted on the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// `multipart/form-data` with a `file` part.
    Multipart,
    /// `application/x-www-form-urlencoded` with a base64 `data` field.
    FormEncoded,
}

impl TransportKind {
    /// Pick the transport from the request's `Content-Type`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::UnsupportedContentType`] for anything else.
    pub fn detect(content_type: Option<&str>) -> Result<Self, UploadError> {
        let raw = content_type.unwrap_or_default();
        let essence = raw.split(';').next().unwrap_or_default().trim();

        if essence.eq_ignore_ascii_case("multipart/form-data") {
            Ok(Self::Multipart)
        } else if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Ok(Self::FormEncoded)
        } else {
            Err(UploadError::UnsupportedContentType(raw.to_string()))
        }
    }
}

/// Fields extracted from a multipart body.
#[derive(Debug, Clone, Default)]
pub struct MultipartUpload {
    /// Filename declared on the `file` part.
    pub filename: Option<String>,
    /// `Content-Type` declared on the `file` part.
    pub part_content_type: Option<String>,
    /// Value of the `filetype` form field.
    pub filetype_field: Option<String>,
    /// Content of the `file` part.
    pub data: Bytes,
}

/// Fields extracted from a URL-encoded body.
#[derive(Debug, Clone, Default)]
pub struct FormUpload {
    /// The `filename` field.
    pub filename: Option<String>,
    /// The `type` field.
    pub declared_type: Option<String>,
    /// The base64 `data` field.
    pub data: Option<String>,
}

/// An upload as it arrived, before normalization.
#[derive(Debug, Clone)]
pub enum UploadTransport {
    /// Binary multipart upload.
    Multipart(MultipartUpload),
    /// Base64 payload in a URL-encoded form.
    FormEncoded(FormUpload),
}

/// An upload reduced to what admission needs, independent of transport.
#[derive(Debug, Clone)]
pub struct InboundFile {
    /// Original filename, or the placeholder when none was given.
    pub filename: String,
    /// Resolved media type.
    pub content_type: String,
    /// Decoded content.
    pub data: Bytes,
}

/// Result of a successful admission.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Identifier the object is stored under.
    pub identifier: String,
    /// Absolute download URL.
    pub url: String,
    /// Stored size in bytes.
    pub size: u64,
    /// Media type the upload was admitted as.
    pub content_type: String,
}
