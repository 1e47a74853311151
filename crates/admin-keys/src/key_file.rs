//! # Administrator Key Files
//!
//! Password-protected JSON files holding one administrator signature key.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "name": "admin1",
//!   "ski": "<hex, 32 bytes>",
//!   "iterations": 210000,
//!   "salt": "<hex, 16 bytes>",
//!   "nonce": "<hex, 24 bytes>",
//!   "ciphertext": "<hex>"
//! }
//! ```
//!
//! The SKI is stored in clear so a key can be matched to an administrator
//! without the password; it is re-checked against the unsealed key on open.

use crate::ecdsa::AdminSigningKey;
use crate::kdf::{derive_sealing_key, generate_salt};
use crate::symmetric::{open, seal, Nonce};
use crate::KeyError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use zeroize::Zeroize;

/// Current key file format version.
pub const KEY_FILE_VERSION: u32 = 1;

/// PBKDF2 iteration count for newly sealed files.
pub const DEFAULT_KDF_ITERATIONS: u32 = 210_000;

/// A sealed administrator key, as stored on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKeyFile {
    /// Format version
    pub version: u32,
    /// Administrator name
    pub name: String,
    /// Hex Subject Key Identifier of the sealed key
    pub ski: String,
    /// PBKDF2 iteration count
    pub iterations: u32,
    /// Hex PBKDF2 salt
    pub salt: String,
    /// Hex XChaCha20 nonce
    pub nonce: String,
    /// Hex sealed private scalar
    pub ciphertext: String,
}

impl EncryptedKeyFile {
    /// Seal a signing key under a password with the default iteration count.
    pub fn seal(name: &str, key: &AdminSigningKey, password: &str) -> Result<Self, KeyError> {
        Self::seal_with_iterations(name, key, password, DEFAULT_KDF_ITERATIONS)
    }

    /// Seal a signing key under a password with an explicit iteration count.
    pub fn seal_with_iterations(
        name: &str,
        key: &AdminSigningKey,
        password: &str,
        iterations: u32,
    ) -> Result<Self, KeyError> {
        if iterations == 0 {
            return Err(KeyError::SealFailed("iteration count must be non-zero".into()));
        }
        let salt = generate_salt();
        let sealing_key = derive_sealing_key(password, &salt, iterations);

        let mut scalar = key.to_bytes();
        let sealed = seal(&sealing_key, &scalar);
        scalar.zeroize();
        let (ciphertext, nonce) = sealed?;

        Ok(Self {
            version: KEY_FILE_VERSION,
            name: name.to_string(),
            ski: hex::encode(key.ski()),
            iterations,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce.as_bytes()),
            ciphertext: hex::encode(ciphertext),
        })
    }

    /// Unseal the signing key with a password.
    ///
    /// # Errors
    ///
    /// - `KeyError::UnsealFailed` for a wrong password or tampered file
    /// - `KeyError::MalformedKeyFile` if the stored SKI does not match the key
    pub fn open(&self, password: &str) -> Result<AdminSigningKey, KeyError> {
        if self.version != KEY_FILE_VERSION {
            return Err(KeyError::UnsupportedVersion(self.version));
        }
        let salt = decode_field("salt", &self.salt)?;
        let nonce = Nonce::from_slice(&decode_field("nonce", &self.nonce)?)?;
        let ciphertext = decode_field("ciphertext", &self.ciphertext)?;

        let sealing_key = derive_sealing_key(password, &salt, self.iterations);
        let mut plaintext = open(&sealing_key, &ciphertext, &nonce)?;

        let scalar: Result<[u8; 32], _> = plaintext.as_slice().try_into();
        plaintext.zeroize();
        let mut scalar = scalar.map_err(|_| {
            KeyError::MalformedKeyFile("sealed scalar must be 32 bytes".into())
        })?;
        let key = AdminSigningKey::from_bytes(scalar);
        scalar.zeroize();
        let key = key?;

        if hex::encode(key.ski()) != self.ski.to_ascii_lowercase() {
            return Err(KeyError::MalformedKeyFile(
                "stored SKI does not match sealed key".into(),
            ));
        }
        Ok(key)
    }

    /// Decoded Subject Key Identifier.
    pub fn ski_bytes(&self) -> Result<Vec<u8>, KeyError> {
        decode_field("ski", &self.ski)
    }

    /// Parse from JSON text.
    pub fn from_json(content: &str) -> Result<Self, KeyError> {
        serde_json::from_str(content).map_err(|e| KeyError::MalformedKeyFile(e.to_string()))
    }

    /// Render as pretty JSON text.
    pub fn to_json(&self) -> Result<String, KeyError> {
        serde_json::to_string_pretty(self).map_err(|e| KeyError::SealFailed(e.to_string()))
    }

    /// Read a key file from disk.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, KeyError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| KeyError::Io {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Write a key file to disk.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), KeyError> {
        fs::write(path.as_ref(), self.to_json()?).map_err(|e| KeyError::Io {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, KeyError> {
    hex::decode(value).map_err(|e| KeyError::MalformedKeyFile(format!("{}: {}", field, e)))
}
