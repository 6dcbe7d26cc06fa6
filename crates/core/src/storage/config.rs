//! Storage configuration types.

use std::path::PathBuf;

/// Storage provider configuration.
#[derive(Debug, Clone)]
pub enum StorageProvider {
    /// Flat directory on the local filesystem.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process store. Contents are lost when the service is dropped.
    Memory,
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Create in-memory provider.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory
    }

    /// Get the provider name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
}

impl StorageConfig {
    /// Name of the staging directory used for atomic writes on the local
    /// filesystem. Lives inside the root; identifiers can never name it.
    pub const STAGING_DIR: &'static str = ".partial";

    /// Create a new storage config.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self { provider }
    }

    /// Staging directory for the configured provider, if it uses one.
    #[must_use]
    pub fn staging_dir(&self) -> Option<PathBuf> {
        match &self.provider {
            StorageProvider::LocalFs { root } => Some(root.join(Self::STAGING_DIR)),
            StorageProvider::Memory => None,
        }
    }
}
