//! Upload admission pipeline.
//!
//! Every upload goes through the same steps regardless of how it was encoded:
//! - Authentication against the shared API key
//! - Transport dispatch (multipart or URL-encoded base64)
//! - Size enforcement
//! - Media type resolution and allow-list check
//! - Identifier minting and persistence

mod error;
mod service;
mod types;

pub use error::{MalformedInput, UploadError};
pub use service::{DOWNLOAD_PATH, UploadService};
pub use types::{
    FormUpload, InboundFile, MultipartUpload, StoredUpload, TransportKind, UploadTransport,
};
