//! Storage backend for relayed objects using Apache OpenDAL.
//!
//! The namespace is flat: one object per identifier, no index or metadata
//! files. Existence checks are lookups by name.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write("key", data)      │ op.reader("key") -> byte stream    │
//! │ op.stat("key")             │ op.delete("key")                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{BlobMetadata, BlobStream, StorageService};
