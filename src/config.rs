//! Subvault configuration.

use crate::crypto::keystore::{MIN_KEY_BITS, RSA_KEY_BITS};
use crate::SubvaultError;
use std::path::{Path, PathBuf};

/// Directory name used under the platform data directory.
pub const DEFAULT_NAMESPACE: &str = "subvault";

/// Configuration for where the ledger and key pair live on disk.
#[derive(Debug, Clone)]
pub struct SubvaultConfig {
    /// Directory holding the ledger and both key files.
    pub data_dir: PathBuf,

    /// File name of the encrypted ledger.
    pub ledger_file: &'static str,

    /// File name of the PKCS#8 private key.
    /// SECURITY: stored unencrypted; protect the directory with filesystem permissions.
    pub private_key_file: &'static str,

    /// File name of the SPKI public key.
    pub public_key_file: &'static str,

    /// RSA modulus size used when a new key pair has to be generated.
    pub key_bits: usize,
}

impl SubvaultConfig {
    /// Configuration rooted at `dirs::data_dir()/subvault`.
    pub fn default_location() -> Result<Self, SubvaultError> {
        let base_dir = dirs::data_dir().ok_or_else(|| {
            SubvaultError::ConfigError("Could not find data directory".to_string())
        })?;
        Ok(Self::in_dir(base_dir.join(DEFAULT_NAMESPACE)))
    }

    /// Configuration rooted at an explicit directory.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ledger_file: "clients.ledger",
            private_key_file: "private_key.pem",
            public_key_file: "public_key.pem",
            key_bits: RSA_KEY_BITS,
        }
    }

    /// Override the RSA key size.
    pub fn with_key_bits(mut self, key_bits: usize) -> Self {
        self.key_bits = key_bits;
        self
    }

    /// Full path of the ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(self.ledger_file)
    }

    /// Full path of the private key file.
    pub fn private_key_path(&self) -> PathBuf {
        self.data_dir.join(self.private_key_file)
    }

    /// Full path of the public key file.
    pub fn public_key_path(&self) -> PathBuf {
        self.data_dir.join(self.public_key_file)
    }

    /// Directory holding all persisted state.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), SubvaultError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(SubvaultError::ConfigError(
                "data_dir cannot be empty".to_string(),
            ));
        }
        for (label, name) in [
            ("ledger_file", self.ledger_file),
            ("private_key_file", self.private_key_file),
            ("public_key_file", self.public_key_file),
        ] {
            if name.is_empty() {
                return Err(SubvaultError::ConfigError(format!(
                    "{} cannot be empty",
                    label
                )));
            }
        }
        if self.private_key_file == self.public_key_file
            || self.ledger_file == self.private_key_file
            || self.ledger_file == self.public_key_file
        {
            return Err(SubvaultError::ConfigError(
                "ledger and key files must have distinct names".to_string(),
            ));
        }
        if self.key_bits < MIN_KEY_BITS {
            return Err(SubvaultError::ConfigError(format!(
                "key_bits must be at least {}, got {}",
                MIN_KEY_BITS, self.key_bits
            )));
        }
        Ok(())
    }
}
