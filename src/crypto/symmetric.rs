//! AES-256-CBC with PKCS#7 padding.
//!
//! Output layout is `iv (16 bytes) || ciphertext`. A fresh IV is drawn from
//! the OS RNG on every call.

use crate::SubvaultError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Symmetric key size in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// IV size in bytes; also the AES block size.
pub const IV_SIZE: usize = 16;

const BLOCK_SIZE: usize = 16;

/// Encrypt `plaintext` under `key`, returning `iv || ciphertext`.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>, SubvaultError> {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|e| SubvaultError::Encrypt(format!("Invalid key or IV length: {}", e)))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut blob = Vec::with_capacity(IV_SIZE + ciphertext.len());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt an `iv || ciphertext` blob produced by [`encrypt`].
pub fn decrypt(blob: &[u8], key: &[u8; KEY_SIZE]) -> Result<Vec<u8>, SubvaultError> {
    if blob.len() < IV_SIZE + BLOCK_SIZE {
        return Err(SubvaultError::Decrypt(format!(
            "blob too short ({} bytes)",
            blob.len()
        )));
    }

    let (iv, ciphertext) = blob.split_at(IV_SIZE);
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(SubvaultError::Decrypt(format!(
            "ciphertext length {} is not a multiple of the block size",
            ciphertext.len()
        )));
    }

    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| SubvaultError::Decrypt(format!("Invalid key or IV length: {}", e)))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| SubvaultError::Padding)
}
