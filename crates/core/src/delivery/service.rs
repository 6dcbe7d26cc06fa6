//! Download delivery service.

use std::sync::Arc;

use tracing::{debug, info, warn};

use oneshot_shared::AppConfig;

use super::claims::ClaimRegistry;
use super::cleanup::CleanupScheduler;
use super::error::DeliveryError;
use super::stream::DeliveryStream;
use crate::identifier;
use crate::storage::StorageService;

/// An opened download.
#[derive(Debug)]
pub struct Delivery {
    /// Identifier being delivered, also the suggested filename.
    pub identifier: String,
    /// Exact content length in bytes.
    pub size: u64,
    /// Content. Deletion is scheduled once it ends or is dropped.
    pub stream: DeliveryStream,
}

/// Opens stored objects for one-time delivery.
pub struct DeliveryService {
    storage: Arc<StorageService>,
    claims: Arc<ClaimRegistry>,
    scheduler: CleanupScheduler,
    exclusive: bool,
}

impl DeliveryService {
    /// Create a new delivery service.
    ///
    /// `claims` must be the registry the cleanup worker behind `scheduler`
    /// releases into.
    #[must_use]
    pub fn new(
        config: &AppConfig,
        storage: Arc<StorageService>,
        claims: Arc<ClaimRegistry>,
        scheduler: CleanupScheduler,
    ) -> Self {
        Self {
            storage,
            claims,
            scheduler,
            exclusive: config.exclusive_downloads,
        }
    }

    /// Open `identifier` for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::NotFound`] if the identifier is malformed,
    /// absent, or already claimed by another download, and
    /// [`DeliveryError::StorageReadFailed`] if it cannot be read.
    pub async fn open(&self, identifier: &str) -> Result<Delivery, DeliveryError> {
        if !identifier::is_well_formed(identifier) {
            debug!(identifier = %identifier, "Rejected malformed identifier");
            return Err(DeliveryError::NotFound(identifier.to_string()));
        }

        if self.exclusive && !self.claims.try_claim(identifier) {
            debug!(identifier = %identifier, "Identifier already claimed");
            return Err(DeliveryError::NotFound(identifier.to_string()));
        }

        let blob = match self.storage.open(identifier).await {
            Ok(blob) => blob,
            Err(e) => {
                if self.exclusive {
                    self.claims.release(identifier);
                }
                let err = DeliveryError::from(e);
                if let DeliveryError::StorageReadFailed(source) = &err {
                    warn!(identifier = %identifier, error = %source, "Failed to open stored object");
                }
                return Err(err);
            }
        };

        info!(identifier = %identifier, size = blob.size, "Delivery started");

        let stream =
            DeliveryStream::new(blob.stream, self.scheduler.clone(), identifier.to_string());
        Ok(Delivery {
            identifier: identifier.to_string(),
            size: blob.size,
            stream,
        })
    }
}
