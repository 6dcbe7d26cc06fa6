//! One-time delivery of stored objects.
//!
//! A download opens the object, streams it, and hands the identifier to the
//! cleanup worker once the stream is finished or abandoned. The worker deletes
//! it after a short grace delay. With exclusive downloads enabled, an
//! identifier is claimed for the whole of that sequence so nobody else can
//! fetch it in the meantime.

mod claims;
mod cleanup;
mod error;
mod service;
mod stream;

pub use claims::ClaimRegistry;
pub use cleanup::{CleanupQueue, CleanupScheduler};
pub use error::DeliveryError;
pub use service::{Delivery, DeliveryService};
pub use stream::DeliveryStream;
