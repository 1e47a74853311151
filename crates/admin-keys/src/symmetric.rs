//! # Symmetric Sealing
//!
//! XChaCha20-Poly1305 sealing of key material at rest.
//!
//! ## Security Properties
//!
//! - 192-bit random nonce per seal
//! - Authenticated: a wrong password or a flipped bit fails to open

use crate::KeyError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroize;

/// Sealing key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Nonce for sealing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce([u8; 24]);

impl Nonce {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 24]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, failing unless it is exactly 24 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; 24] = bytes.try_into().map_err(|_| {
            KeyError::MalformedKeyFile(format!("nonce must be 24 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(array))
    }

    /// Generate random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 24];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 24] {
        &self.0
    }
}

/// Seal plaintext. Returns (ciphertext, nonce).
pub fn seal(key: &SecretKey, plaintext: &[u8]) -> Result<(Vec<u8>, Nonce), KeyError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::generate();

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| KeyError::SealFailed(e.to_string()))?;

    Ok((ciphertext, nonce))
}

/// Open sealed ciphertext.
pub fn open(key: &SecretKey, ciphertext: &[u8], nonce: &Nonce) -> Result<Vec<u8>, KeyError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(XNonce::from_slice(nonce.as_bytes()), ciphertext)
        .map_err(|_| KeyError::UnsealFailed)
}
