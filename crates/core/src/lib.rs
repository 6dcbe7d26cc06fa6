//! Core relay protocol for oneshot.
//!
//! This crate contains the upload admission and one-time delivery protocol
//! with ZERO web dependencies. The HTTP surface lives in `oneshot-api`.
//!
//! # Modules
//!
//! - `identifier` - Unguessable retrieval identifiers
//! - `media` - Media type resolution, sniffing and the allow-list
//! - `storage` - Object storage over OpenDAL
//! - `upload` - Upload admission pipeline
//! - `delivery` - One-time delivery and deferred cleanup

pub mod delivery;
pub mod identifier;
pub mod media;
pub mod storage;
pub mod upload;
