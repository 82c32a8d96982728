//! Sealed ledger record format.
//!
//! The record stores everything needed to reopen a saved ledger:
//! - The RSA-OAEP wrapped symmetric key
//! - The AES-256-CBC payload (`iv || ciphertext`)
//! - When it was saved and which public key sealed it
//!
//! On open, we:
//! 1. Check the format version
//! 2. Decode both binary fields
//! 3. Unwrap the key and decrypt the payload
//! 4. Parse and check the ledger
//!
//! The fingerprint is informational. A mismatch is logged, but the unwrap
//! step is what rejects a wrong key.

use crate::clock::Clock;
use crate::crypto::hybrid::{open_hybrid, seal_hybrid};
use crate::crypto::keystore::{fingerprint, KeyPair};
use crate::ledger::book::Ledger;
use crate::SubvaultError;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Current record layout version.
pub const FORMAT_VERSION: u32 = 1;

/// Encrypted ledger as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Layout version of this record.
    pub format_version: u32,

    /// When the ledger was sealed.
    pub saved_at: DateTime<Utc>,

    /// Hex SHA-256 fingerprint of the sealing public key.
    pub key_fingerprint: String,

    /// Base64 RSA-OAEP ciphertext of the symmetric key.
    pub wrapped_key: String,

    /// Base64 `iv || ciphertext` of the serialized ledger.
    pub payload: String,
}

impl LedgerRecord {
    /// Serialize and seal a ledger for `public_key`.
    pub fn seal(
        ledger: &Ledger,
        public_key: &RsaPublicKey,
        clock: &dyn Clock,
    ) -> Result<Self, SubvaultError> {
        let plaintext = serde_json::to_vec(ledger)
            .map_err(|e| SubvaultError::LedgerIO(format!("Failed to serialize ledger: {}", e)))?;
        let sealed = seal_hybrid(&plaintext, public_key)?;

        Ok(Self {
            format_version: FORMAT_VERSION,
            saved_at: clock.now_utc(),
            key_fingerprint: fingerprint(public_key)?,
            wrapped_key: STANDARD.encode(&sealed.wrapped_key),
            payload: STANDARD.encode(&sealed.payload),
        })
    }

    /// Decrypt and parse the ledger with the private half of `keys`.
    pub fn open(&self, keys: &KeyPair) -> Result<Ledger, SubvaultError> {
        if self.format_version != FORMAT_VERSION {
            return Err(SubvaultError::LedgerLoad(format!(
                "unsupported format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }

        let wrapped_key = STANDARD
            .decode(&self.wrapped_key)
            .map_err(|e| SubvaultError::LedgerLoad(format!("Invalid wrapped key base64: {}", e)))?;
        let payload = STANDARD
            .decode(&self.payload)
            .map_err(|e| SubvaultError::LedgerLoad(format!("Invalid payload base64: {}", e)))?;

        if keys.fingerprint()? != self.key_fingerprint {
            warn!(
                recorded = %self.key_fingerprint,
                "ledger was sealed for a different public key"
            );
        }

        let plaintext = open_hybrid(&payload, &wrapped_key, &keys.private)?;
        let ledger: Ledger = serde_json::from_slice(&plaintext)
            .map_err(|e| SubvaultError::LedgerLoad(format!("Failed to parse ledger: {}", e)))?;
        ledger
            .check_invariants()
            .map_err(|e| SubvaultError::LedgerLoad(format!("Stored client is invalid: {}", e)))?;
        Ok(ledger)
    }

    /// Serialize the record to JSON.
    pub fn to_json(&self) -> Result<String, SubvaultError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SubvaultError::LedgerIO(format!("Failed to serialize record: {}", e)))
    }

    /// Deserialize a record from JSON.
    pub fn from_json(json: &str) -> Result<Self, SubvaultError> {
        serde_json::from_str(json)
            .map_err(|e| SubvaultError::LedgerLoad(format!("Failed to parse record: {}", e)))
    }
}
