//! Single-claimant bookkeeping for downloads.

use dashmap::DashSet;

/// Identifiers currently being delivered or awaiting deletion.
///
/// The first download of an identifier claims it; later claimants are turned
/// away until the claim is released.
#[derive(Debug, Default)]
pub struct ClaimRegistry {
    claimed: DashSet<String>,
}

impl ClaimRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `identifier`. Returns `false` if it is already claimed.
    pub fn try_claim(&self, identifier: &str) -> bool {
        self.claimed.insert(identifier.to_string())
    }

    /// Release a claim. Releasing an unclaimed identifier is a no-op.
    pub fn release(&self, identifier: &str) {
        self.claimed.remove(identifier);
    }

    /// Whether `identifier` is currently claimed.
    #[must_use]
    pub fn is_claimed(&self, identifier: &str) -> bool {
        self.claimed.contains(identifier)
    }

    /// Number of outstanding claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// Whether no identifier is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
