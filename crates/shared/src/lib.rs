//! Shared configuration and errors for the oneshot relay.
//!
//! This crate provides:
//! - `AppConfig`, the immutable process configuration
//! - `ConfigError`, raised while loading or validating it

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::ConfigError;
