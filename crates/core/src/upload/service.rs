//! Upload admission service.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use constant_time_eq::constant_time_eq;
use tracing::{debug, error, info};

use oneshot_shared::AppConfig;

use super::error::{MalformedInput, UploadError};
use super::types::{FormUpload, InboundFile, MultipartUpload, StoredUpload, UploadTransport};
use crate::identifier::{self, DEFAULT_FILENAME};
use crate::media::{self, AllowList};
use crate::storage::StorageService;

/// Path prefix of download URLs.
pub const DOWNLOAD_PATH: &str = "/download/";

/// Room for form fields other than `data`, and for multipart framing.
const FRAMING_ALLOWANCE: u64 = 64 * 1024;

/// Admits uploads: authenticates, normalizes, validates and persists them.
pub struct UploadService {
    storage: Arc<StorageService>,
    allow_list: AllowList,
    api_key: String,
    max_file_size: u64,
    domain: String,
}

impl UploadService {
    /// Create a new upload service.
    #[must_use]
    pub fn new(config: &AppConfig, storage: Arc<StorageService>) -> Self {
        Self {
            storage,
            allow_list: AllowList::new(&config.allowed_types),
            api_key: config.api_key.clone(),
            max_file_size: config.max_file_size,
            domain: config.domain.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Check the presented API key.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Unauthorized`] if the key is missing or wrong.
    pub fn authenticate(&self, presented: Option<&str>) -> Result<(), UploadError> {
        match presented {
            Some(key) if constant_time_eq(key.as_bytes(), self.api_key.as_bytes()) => Ok(()),
            _ => Err(UploadError::Unauthorized),
        }
    }

    /// Maximum accepted file size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Upper bound on a raw request body.
    ///
    /// A file at the size limit still fits once base64-encoded, percent-encoded
    /// and wrapped in form framing. The exact limit is applied to the decoded
    /// file bytes.
    #[must_use]
    pub fn transport_ceiling(&self) -> usize {
        let encoded = self.max_file_size.div_ceil(3).saturating_mul(4);
        let ceiling = encoded.saturating_mul(3).saturating_add(FRAMING_ALLOWANCE);
        usize::try_from(ceiling).unwrap_or(usize::MAX)
    }

    /// Reject sizes above the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::PayloadTooLarge`] if `size` exceeds the limit.
    pub fn ensure_within_limit(&self, size: u64) -> Result<(), UploadError> {
        if size > self.max_file_size {
            return Err(UploadError::too_large(self.max_file_size));
        }
        Ok(())
    }

    /// Download URL for `identifier`.
    #[must_use]
    pub fn download_url(&self, identifier: &str) -> String {
        if self.domain.starts_with("https://") || self.domain.starts_with("http://") {
            format!("{}{DOWNLOAD_PATH}{identifier}", self.domain)
        } else {
            format!("https://{}{DOWNLOAD_PATH}{identifier}", self.domain)
        }
    }

    /// Reduce either transport to an [`InboundFile`].
    ///
    /// Media type candidates, first non-empty wins:
    /// - multipart: part `Content-Type`, `type_override`, `filetype` field
    /// - URL-encoded: `type` field, `type_override`
    ///
    /// and content sniffing when none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is missing, undecodable or too large.
    pub fn normalize(
        &self,
        transport: UploadTransport,
        type_override: Option<&str>,
    ) -> Result<InboundFile, UploadError> {
        match transport {
            UploadTransport::Multipart(upload) => self.normalize_multipart(upload, type_override),
            UploadTransport::FormEncoded(upload) => self.normalize_form(upload, type_override),
        }
    }

    fn normalize_multipart(
        &self,
        upload: MultipartUpload,
        type_override: Option<&str>,
    ) -> Result<InboundFile, UploadError> {
        self.ensure_within_limit(byte_len(&upload.data))?;

        let content_type = media::resolve(
            [
                upload.part_content_type.as_deref(),
                type_override,
                upload.filetype_field.as_deref(),
            ],
            &upload.data,
        );

        Ok(InboundFile {
            filename: filename_or_default(upload.filename),
            content_type,
            data: upload.data,
        })
    }

    fn normalize_form(
        &self,
        upload: FormUpload,
        type_override: Option<&str>,
    ) -> Result<InboundFile, UploadError> {
        let encoded = upload
            .data
            .filter(|data| !data.is_empty())
            .ok_or(MalformedInput::MissingData)?;
        let data = Bytes::from(decode_base64(&encoded)?);
        self.ensure_within_limit(byte_len(&data))?;

        let content_type =
            media::resolve([upload.declared_type.as_deref(), type_override], &data);

        Ok(InboundFile {
            filename: filename_or_default(upload.filename),
            content_type,
            data,
        })
    }

    /// Run the full admission pipeline and persist the upload.
    ///
    /// Exactly one object is created on success and none on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The payload is malformed or too large
    /// - The resolved media type is not allowed
    /// - No identifier can be minted
    /// - Storage rejects the write
    pub async fn admit(
        &self,
        transport: UploadTransport,
        type_override: Option<&str>,
    ) -> Result<StoredUpload, UploadError> {
        let file = self.normalize(transport, type_override)?;

        if !self.allow_list.permits(&file.content_type) {
            return Err(UploadError::FileTypeNotAllowed(file.content_type));
        }

        let identifier = identifier::generate(&file.filename)?;
        let size = byte_len(&file.data);

        if let Err(e) = self.storage.put(&identifier, file.data).await {
            error!(identifier = %identifier, error = %e, "Failed to store upload");
            // Whatever landed under this identifier is not a valid object.
            if let Err(cleanup) = self.storage.delete(&identifier).await {
                debug!(
                    identifier = %identifier,
                    error = %cleanup,
                    "Ignoring cleanup failure after write error"
                );
            }
            return Err(UploadError::StorageWriteFailed(e));
        }

        info!(
            identifier = %identifier,
            size,
            content_type = %file.content_type,
            "Upload admitted"
        );

        Ok(StoredUpload {
            url: self.download_url(&identifier),
            identifier,
            size,
            content_type: file.content_type,
        })
    }
}

fn filename_or_default(filename: Option<String>) -> String {
    filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Decode the standard base64 alphabet, tolerating line breaks and spaces
/// left where form decoding turned `+` into a space.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, MalformedInput> {
    let cleaned: String = encoded
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .map(|c| if c == ' ' { '+' } else { c })
        .collect();

    STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|_| MalformedInput::InvalidBase64)
}

fn byte_len(data: &[u8]) -> u64 {
    u64::try_from(data.len()).unwrap_or(u64::MAX)
}
