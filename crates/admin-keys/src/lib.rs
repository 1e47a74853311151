//! # Admin Keys - Administrator Signature Key Material
//!
//! Keys held by HSM domain administrators and the files they live in.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ecdsa` | secp256k1 | Signing administrative command digests |
//! | `kdf` | PBKDF2-HMAC-SHA512 | Password to key-file sealing key |
//! | `symmetric` | XChaCha20-Poly1305 | Sealing the private scalar at rest |
//! | `key_file` | JSON | Password-protected administrator key files |
//! | `certificate` | secp256k1 self-signed | Binding an administrator name to its key |
//!
//! ## Identity
//!
//! An administrator is identified on the HSM by its Subject Key Identifier
//! (SKI): the SHA-256 digest of the SEC1 compressed public key.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod certificate;
pub mod ecdsa;
pub mod errors;
pub mod kdf;
pub mod key_file;
pub mod symmetric;

// Re-exports
pub use certificate::AdminCertificate;
pub use ecdsa::{AdminPublicKey, AdminSignature, AdminSigningKey, SKI_LENGTH};
pub use errors::KeyError;
pub use key_file::{EncryptedKeyFile, DEFAULT_KDF_ITERATIONS, KEY_FILE_VERSION};
