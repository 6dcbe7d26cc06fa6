//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Application configuration.
///
/// Loaded once at startup and passed by value (or behind an `Arc`) into every
/// component that needs it. Field names are fixed; they match the keys of the
/// configuration file and the `ONESHOT__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Maximum accepted file size in bytes.
    pub max_file_size: u64,
    /// Shared secret expected in the `X-API-Key` header.
    pub api_key: String,
    /// Directory holding stored objects.
    pub upload_dir: PathBuf,
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on. A leading `:` is accepted.
    #[serde(default)]
    pub port: String,
    /// Public domain used to build download URLs.
    pub domain: String,
    /// Allowed media types, exact or `category/*`.
    #[serde(default)]
    pub allowed_types: Vec<String>,
    /// Grace delay between the end of a delivery and deletion, in milliseconds.
    #[serde(default = "default_cleanup_delay_ms")]
    pub cleanup_delay_ms: u64,
    /// Whether a download claims its identifier so concurrent downloads get 404.
    #[serde(default = "default_exclusive_downloads")]
    pub exclusive_downloads: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_cleanup_delay_ms() -> u64 {
    1000
}

fn default_exclusive_downloads() -> bool {
    true
}

impl AppConfig {
    /// Port used when none is configured.
    pub const DEFAULT_PORT: &'static str = "8080";

    /// Environment variable prefix.
    pub const ENV_PREFIX: &'static str = "ONESHOT";

    /// Loads configuration from config files and the environment.
    ///
    /// Sources, lowest precedence first: `config/default.*`,
    /// `config/{RUN_MODE}.*`, `config.*` in the working directory, then
    /// `ONESHOT__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let raw = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::File::with_name("config").required(false))
            .add_source(Self::environment())
            .build()?;

        Self::from_config(raw)
    }

    /// Deserializes and validates an already-built configuration.
    pub fn from_config(raw: config::Config) -> Result<Self, ConfigError> {
        raw.try_deserialize::<Self>()?.validate()
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(Self::ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("allowed_types")
            .try_parsing(true)
    }

    /// Checks required values and fills in defaults.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.max_file_size == 0 {
            return Err(ConfigError::invalid("max_file_size must be greater than 0"));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::invalid("api_key cannot be empty"));
        }
        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("upload_dir cannot be empty"));
        }
        if self.domain.trim().is_empty() {
            return Err(ConfigError::invalid("domain cannot be empty"));
        }

        let port = self.port.trim().trim_start_matches(':');
        self.port = if port.is_empty() {
            Self::DEFAULT_PORT.to_string()
        } else {
            port.to_string()
        };

        self.allowed_types.retain(|t| !t.trim().is_empty());
        if self.allowed_types.is_empty() {
            self.allowed_types = Self::default_allowed_types();
        }

        Ok(self)
    }

    /// Default allow-list: common image and audio types plus `image/*`.
    #[must_use]
    pub fn default_allowed_types() -> Vec<String> {
        [
            // Images
            "image/jpeg",
            "image/jpg",
            "image/pjpeg",
            "image/png",
            "image/gif",
            "image/webp",
            "image/svg+xml",
            "image/*",
            // Audio
            "audio/mpeg",
            "audio/ogg",
            "audio/wav",
            "audio/webm",
            "audio/aac",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    /// Address the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
