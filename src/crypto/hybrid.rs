//! Hybrid envelope: AES-256-CBC for the payload, RSA-OAEP for the key.
//!
//! Sealing:
//! 1. Draw a fresh 256-bit symmetric key
//! 2. Encrypt the payload with it (`iv || ciphertext`)
//! 3. Wrap the key with RSA-OAEP (SHA-256, MGF1-SHA-256)
//! 4. Zeroize the key
//!
//! The key is wrapped in chunks of `modulus_bytes - 66` plaintext bytes, each
//! producing one `modulus_bytes` ciphertext chunk. A 32-byte key always fits
//! one chunk for any accepted key size.

use crate::crypto::symmetric::{self, KEY_SIZE};
use crate::SubvaultError;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::digest::typenum::Unsigned;
use sha2::digest::OutputSizeUser;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Bytes of OAEP overhead subtracted from the modulus size per chunk:
/// two SHA-256 digests plus two framing bytes.
pub const OAEP_OVERHEAD: usize = 2 * <Sha256 as OutputSizeUser>::OutputSize::USIZE + 2;

/// Output of [`seal_hybrid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    /// `iv || ciphertext` of the plaintext.
    pub payload: Vec<u8>,
    /// RSA-OAEP ciphertext of the symmetric key.
    pub wrapped_key: Vec<u8>,
}

/// Encrypt `plaintext` so only the holder of the matching private key can read it.
pub fn seal_hybrid(
    plaintext: &[u8],
    public_key: &RsaPublicKey,
) -> Result<SealedPayload, SubvaultError> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(&mut key[..]);

    let payload = symmetric::encrypt(plaintext, &key)?;
    let wrapped_key = wrap_chunks(&key[..], public_key)?;

    Ok(SealedPayload {
        payload,
        wrapped_key,
    })
}

/// Recover the plaintext sealed by [`seal_hybrid`].
pub fn open_hybrid(
    payload: &[u8],
    wrapped_key: &[u8],
    private_key: &RsaPrivateKey,
) -> Result<Vec<u8>, SubvaultError> {
    let unwrapped = unwrap_chunks(wrapped_key, private_key)?;
    if unwrapped.len() != KEY_SIZE {
        return Err(SubvaultError::Unwrap(format!(
            "unwrapped key is {} bytes, expected {}",
            unwrapped.len(),
            KEY_SIZE
        )));
    }

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    key.copy_from_slice(&unwrapped);
    symmetric::decrypt(payload, &key)
}

/// RSA-OAEP encrypt `data` in modulus-sized chunks.
fn wrap_chunks(data: &[u8], public_key: &RsaPublicKey) -> Result<Vec<u8>, SubvaultError> {
    let modulus_bytes = public_key.size();
    let chunk_size = modulus_bytes
        .checked_sub(OAEP_OVERHEAD)
        .filter(|size| *size > 0)
        .ok_or_else(|| {
            SubvaultError::Encrypt(format!("RSA modulus of {} bytes is too small", modulus_bytes))
        })?;

    let mut wrapped = Vec::with_capacity(data.len().div_ceil(chunk_size) * modulus_bytes);
    for chunk in data.chunks(chunk_size) {
        let encrypted = public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), chunk)
            .map_err(|e| SubvaultError::Encrypt(format!("RSA-OAEP wrap failed: {}", e)))?;
        wrapped.extend_from_slice(&encrypted);
    }
    Ok(wrapped)
}

/// RSA-OAEP decrypt modulus-sized chunks.
fn unwrap_chunks(
    wrapped: &[u8],
    private_key: &RsaPrivateKey,
) -> Result<Zeroizing<Vec<u8>>, SubvaultError> {
    let modulus_bytes = private_key.size();
    if wrapped.is_empty() || wrapped.len() % modulus_bytes != 0 {
        return Err(SubvaultError::Unwrap(format!(
            "wrapped key length {} is not a multiple of {}",
            wrapped.len(),
            modulus_bytes
        )));
    }

    let mut data = Zeroizing::new(Vec::new());
    for chunk in wrapped.chunks(modulus_bytes) {
        let decrypted = Zeroizing::new(
            private_key
                .decrypt(Oaep::new::<Sha256>(), chunk)
                .map_err(|e| SubvaultError::Unwrap(e.to_string()))?,
        );
        data.extend_from_slice(&decrypted);
    }
    Ok(data)
}
