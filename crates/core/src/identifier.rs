//! Retrieval identifier generation.
//!
//! An identifier is 16 bytes drawn from the OS CSPRNG, hex-encoded, followed
//! by the extension of the original filename. It names the stored object and
//! forms the last segment of its download URL.

use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

/// Number of random bytes per identifier.
pub const ENTROPY_BYTES: usize = 16;

/// Length of the random part once encoded.
pub const RANDOM_PART_LEN: usize = ENTROPY_BYTES * 2;

/// Filename assumed when the uploader supplies none.
pub const DEFAULT_FILENAME: &str = "file.dat";

/// Identifier generation errors.
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// The random source could not supply entropy.
    #[error("entropy unavailable: {0}")]
    EntropyUnavailable(String),
}

/// Mint a fresh identifier for `original_filename` using the OS random source.
///
/// # Errors
///
/// Returns [`IdentifierError::EntropyUnavailable`] if the OS cannot supply
/// random bytes.
pub fn generate(original_filename: &str) -> Result<String, IdentifierError> {
    generate_with(&mut OsRng, original_filename)
}

/// Mint an identifier drawing entropy from `rng`.
pub fn generate_with<R: RngCore + ?Sized>(
    rng: &mut R,
    original_filename: &str,
) -> Result<String, IdentifierError> {
    let mut bytes = [0u8; ENTROPY_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| IdentifierError::EntropyUnavailable(e.to_string()))?;

    Ok(format!(
        "{}{}",
        hex::encode(bytes),
        extension(original_filename)
    ))
}

/// Extension of the final path component, including the leading dot.
///
/// Returns an empty string when there is no dot. Characters that are not
/// URL-safe are replaced with `_`.
#[must_use]
pub fn extension(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    base.rfind('.')
        .map(|idx| {
            base[idx..]
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Whether `identifier` can name an object in the flat storage namespace.
///
/// Rejects anything that could escape the directory or address the staging
/// area.
#[must_use]
pub fn is_well_formed(identifier: &str) -> bool {
    !identifier.is_empty()
        && !identifier.starts_with('.')
        && !identifier.contains(['/', '\\'])
        && !identifier.contains("..")
}
