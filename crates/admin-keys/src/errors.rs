//! Key material error types.

use thiserror::Error;

/// Errors raised while handling administrator key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The private scalar is not a valid secp256k1 secret key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// The public key bytes are not a valid SEC1 point
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Digest could not be signed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature did not verify
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Wrong password or tampered key file
    #[error("Key file could not be unsealed (wrong password or corrupted file)")]
    UnsealFailed,

    /// Sealing the key file failed
    #[error("Key file could not be sealed: {0}")]
    SealFailed(String),

    /// Key file content is malformed
    #[error("Malformed key file: {0}")]
    MalformedKeyFile(String),

    /// Administrator certificate is malformed or its self-signature is bad
    #[error("Malformed administrator certificate: {0}")]
    MalformedCertificate(String),

    /// Key file version is not supported
    #[error("Unsupported key file version {0}")]
    UnsupportedVersion(u32),

    /// Key file I/O error
    #[error("Failed to access key file {path}: {reason}")]
    Io {
        /// Path of the key file
        path: String,
        /// Underlying I/O error
        reason: String,
    },
}
