//! Subvault error types.

use thiserror::Error;

/// Errors raised by the membership ledger and its encrypted store.
#[derive(Debug, Error)]
pub enum SubvaultError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A client field failed validation. Recoverable by asking again.
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// RSA key generation failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// A key file is missing, unreadable, or undecodable.
    #[error("Key load error: {0}")]
    KeyLoad(String),

    /// Writing a key file failed.
    #[error("Key store error: {0}")]
    KeyStore(String),

    /// Encryption failed while sealing a payload.
    #[error("Encryption failed: {0}")]
    Encrypt(String),

    /// PKCS#7 padding was structurally invalid after decryption.
    #[error("Invalid padding in decrypted payload")]
    Padding,

    /// Symmetric decryption failed for a reason other than padding.
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    /// The wrapped symmetric key could not be recovered (wrong key or corrupt blob).
    #[error("Could not unwrap symmetric key: {0}")]
    Unwrap(String),

    /// The ledger file exists but is malformed.
    #[error("Ledger load error: {0}")]
    LedgerLoad(String),

    /// Ledger file I/O error.
    #[error("Ledger I/O error: {0}")]
    LedgerIO(String),

    /// No client at the given position.
    #[error("No {collection} client at position {index}")]
    ClientNotFound {
        /// Which collection was searched ("active" or "inactive").
        collection: &'static str,
        /// The zero-based index requested.
        index: usize,
    },

    /// Tier identifier outside 1..=4.
    #[error("Unknown membership tier id {0}")]
    InvalidTier(u8),

    /// The membership tier does not offer the requested capability.
    #[error("{tier} membership has no {capability}")]
    Capability {
        /// Tier of the membership.
        tier: crate::membership::Tier,
        /// Capability that was requested.
        capability: &'static str,
    },
}
