//! # Administrator Signature Keys (secp256k1)
//!
//! ECDSA keys used to authorize administrative commands.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Signing operates on a caller-computed digest (prehash), so the same key
//!   can serve whatever digest the HSM expects
//! - Secret scalar is zeroized on drop

use crate::KeyError;
use k256::ecdsa::{
    signature::hazmat::{PrehashSigner, PrehashVerifier},
    Signature, SigningKey, VerifyingKey,
};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Length of a Subject Key Identifier in bytes.
pub const SKI_LENGTH: usize = 32;

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminPublicKey([u8; 33]);

impl AdminPublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, KeyError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Subject Key Identifier: SHA-256 of the compressed point.
    pub fn ski(&self) -> [u8; SKI_LENGTH] {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.finalize().into()
    }

    /// Verify a signature over a digest.
    pub fn verify_digest(&self, digest: &[u8], signature: &AdminSignature) -> Result<(), KeyError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| KeyError::InvalidPublicKey)?;
        let sig = Signature::from_slice(&signature.0)
            .map_err(|_| KeyError::SignatureVerificationFailed)?;

        verifying_key
            .verify_prehash(digest, &sig)
            .map_err(|_| KeyError::SignatureVerificationFailed)
    }
}

/// ECDSA signature (64 bytes, r||s format).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminSignature([u8; 64]);

impl AdminSignature {
    /// Create from bytes (64 bytes).
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// An administrator's secp256k1 signing key.
pub struct AdminSigningKey {
    signing_key: SigningKey,
}

impl AdminSigningKey {
    /// Generate a random key.
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self { signing_key }
    }

    /// Create from secret scalar bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> AdminPublicKey {
        let sec1_bytes = self.signing_key.verifying_key().to_sec1_bytes();
        // SEC1 compressed points are always 33 bytes for secp256k1
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(&sec1_bytes[..33]);
        AdminPublicKey(bytes)
    }

    /// Subject Key Identifier of this key.
    pub fn ski(&self) -> [u8; SKI_LENGTH] {
        self.public_key().ski()
    }

    /// Sign a precomputed digest (deterministic RFC 6979).
    ///
    /// Digests longer than the curve order are truncated to their leftmost
    /// 256 bits; digests shorter than 128 bits are rejected.
    pub fn sign_digest(&self, digest: &[u8]) -> Result<AdminSignature, KeyError> {
        let sig: Signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| KeyError::SigningFailed(e.to_string()))?;
        let bytes: [u8; 64] = sig.to_bytes().into();
        Ok(AdminSignature(bytes))
    }

    /// Get secret scalar bytes (for sealing into a key file).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for AdminSigningKey {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

impl std::fmt::Debug for AdminSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSigningKey")
            .field("ski", &hex::encode(self.ski()))
            .finish_non_exhaustive()
    }
}
