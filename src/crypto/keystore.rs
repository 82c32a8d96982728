//! RSA key pair generation and PEM persistence.
//!
//! Private keys are written as unencrypted PKCS#8 PEM and public keys as
//! SubjectPublicKeyInfo PEM. Anyone who can read the private key file can
//! open every saved ledger, so the file is created owner-only on Unix.

use crate::SubvaultError;
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Modulus size for newly generated key pairs.
pub const RSA_KEY_BITS: usize = 2048;

/// Smallest modulus accepted by [`KeyPair::generate_with_bits`].
pub const MIN_KEY_BITS: usize = 1024;

/// Long-lived RSA key pair protecting each save's symmetric key.
#[derive(Clone)]
pub struct KeyPair {
    /// Key used to wrap symmetric keys on save.
    pub public: RsaPublicKey,
    /// Key used to unwrap symmetric keys on load.
    pub private: RsaPrivateKey,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &fingerprint(&self.public).unwrap_or_default())
            .field("private", &"<redacted>")
            .finish()
    }
}

impl KeyPair {
    /// Generate a fresh 2048-bit key pair from the OS RNG.
    pub fn generate() -> Result<Self, SubvaultError> {
        Self::generate_with_bits(RSA_KEY_BITS)
    }

    /// Generate a key pair with an explicit modulus size.
    pub fn generate_with_bits(bits: usize) -> Result<Self, SubvaultError> {
        if bits < MIN_KEY_BITS {
            return Err(SubvaultError::ConfigError(format!(
                "RSA key size must be at least {} bits, got {}",
                MIN_KEY_BITS, bits
            )));
        }
        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| SubvaultError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    /// Derive the pair from a private key.
    pub fn from_private(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self { public, private }
    }

    /// Hex SHA-256 fingerprint of the public half.
    pub fn fingerprint(&self) -> Result<String, SubvaultError> {
        fingerprint(&self.public)
    }
}

/// Generate a 2048-bit key pair.
pub fn generate_key_pair() -> Result<KeyPair, SubvaultError> {
    KeyPair::generate()
}

/// Write the private key as unencrypted PKCS#8 PEM, replacing any existing file.
pub fn save_private_key(key: &RsaPrivateKey, path: &Path) -> Result<(), SubvaultError> {
    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| SubvaultError::KeyStore(format!("Failed to encode private key: {}", e)))?;

    let write_err = |e: std::io::Error| {
        SubvaultError::KeyStore(format!(
            "Failed to write private key {}: {}",
            path.display(),
            e
        ))
    };

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(write_err)?;
        // `mode` only applies on creation; tighten a pre-existing file too.
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| {
                SubvaultError::KeyStore(format!("Failed to restrict private key: {}", e))
            })?;
        file.write_all(pem.as_bytes()).map_err(write_err)?;
    }

    #[cfg(not(unix))]
    fs::write(path, pem.as_bytes()).map_err(write_err)?;

    Ok(())
}

/// Write the public key as SPKI PEM, replacing any existing file.
pub fn save_public_key(key: &RsaPublicKey, path: &Path) -> Result<(), SubvaultError> {
    let pem = key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| SubvaultError::KeyStore(format!("Failed to encode public key: {}", e)))?;

    fs::write(path, pem).map_err(|e| {
        SubvaultError::KeyStore(format!(
            "Failed to write public key {}: {}",
            path.display(),
            e
        ))
    })
}

/// Load a PKCS#8 PEM private key.
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey, SubvaultError> {
    let pem = fs::read_to_string(path).map_err(|e| {
        SubvaultError::KeyLoad(format!(
            "Failed to read private key {}: {}",
            path.display(),
            e
        ))
    })?;

    RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|e| {
        SubvaultError::KeyLoad(format!(
            "Failed to decode private key {}: {}",
            path.display(),
            e
        ))
    })
}

/// Load an SPKI PEM public key.
pub fn load_public_key(path: &Path) -> Result<RsaPublicKey, SubvaultError> {
    let pem = fs::read_to_string(path).map_err(|e| {
        SubvaultError::KeyLoad(format!(
            "Failed to read public key {}: {}",
            path.display(),
            e
        ))
    })?;

    RsaPublicKey::from_public_key_pem(&pem).map_err(|e| {
        SubvaultError::KeyLoad(format!(
            "Failed to decode public key {}: {}",
            path.display(),
            e
        ))
    })
}

/// Load the key pair from disk, or generate and persist one on first run.
///
/// A pair where only one file exists is rejected rather than regenerated,
/// since overwriting the survivor would orphan any ledger sealed with it.
pub fn load_or_generate(
    private_path: &Path,
    public_path: &Path,
    bits: usize,
) -> Result<KeyPair, SubvaultError> {
    match (private_path.exists(), public_path.exists()) {
        (true, true) => {
            let private = load_private_key(private_path)?;
            let public = load_public_key(public_path)?;
            if RsaPublicKey::from(&private) != public {
                return Err(SubvaultError::KeyLoad(format!(
                    "{} does not match {}",
                    public_path.display(),
                    private_path.display()
                )));
            }
            let keys = KeyPair { public, private };
            info!(fingerprint = %keys.fingerprint()?, "loaded key pair");
            Ok(keys)
        }
        (false, false) => {
            warn!(
                path = %private_path.display(),
                "no key pair found, generating one (private key is stored unencrypted)"
            );
            let keys = KeyPair::generate_with_bits(bits)?;
            save_private_key(&keys.private, private_path)?;
            save_public_key(&keys.public, public_path)?;
            info!(fingerprint = %keys.fingerprint()?, bits, "generated key pair");
            Ok(keys)
        }
        (true, false) => Err(SubvaultError::KeyLoad(format!(
            "public key {} is missing",
            public_path.display()
        ))),
        (false, true) => Err(SubvaultError::KeyLoad(format!(
            "private key {} is missing",
            private_path.display()
        ))),
    }
}

/// Hex SHA-256 of the public key's DER encoding.
pub fn fingerprint(key: &RsaPublicKey) -> Result<String, SubvaultError> {
    let der = key
        .to_public_key_der()
        .map_err(|e| SubvaultError::KeyStore(format!("Failed to encode public key: {}", e)))?;
    Ok(hex::encode(Sha256::digest(der.as_bytes())))
}
