//! Sealed-bundle codec.
//!
//! Wire format (byte-compatible with NaCl `secretbox`):
//!
//! ```text
//! offset 0..24  : nonce, 24 random bytes
//! offset 24..   : Poly1305 tag (16 bytes) ‖ XSalsa20 ciphertext
//! ```
//!
//! [`open`] either returns the exact plaintext or fails; there is no
//! partial decrypt.

use crypto_secretbox::aead::{rand_core::RngCore, Aead, KeyInit, OsRng};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};

use crate::error::SealError;
use crate::key::Key;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt and authenticate `plaintext`, returning `nonce ‖ ciphertext`.
///
/// A fresh nonce is drawn from the OS random source for every call; this is
/// the only way sealing can fail.
pub fn seal(key: &Key, plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| SealError::Randomness(e.to_string()))?;
    seal_with_nonce(key, &nonce, plaintext)
}

fn seal_with_nonce(
    key: &Key,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, SealError> {
    let cipher = XSalsa20Poly1305::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| SealError::Encryption)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Authenticate and decrypt a sealed bundle.
pub fn open(key: &Key, sealed: &[u8]) -> Result<Vec<u8>, SealError> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(SealError::Truncated { len: sealed.len() });
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = XSalsa20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| SealError::Authentication)
}
