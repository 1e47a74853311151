//! # Administrator Certificates
//!
//! Self-signed binding of an administrator name to a signature key. The HSM
//! installs an administrator from this certificate and keys the roster
//! entry by the embedded public key's SKI.
//!
//! ```text
//! name_len u32 | name (UTF-8) | public_key[33] | signature[64]
//! ```
//!
//! The signature covers SHA-256 of everything before it.

use crate::ecdsa::{AdminPublicKey, AdminSignature, AdminSigningKey, SKI_LENGTH};
use crate::KeyError;
use sha2::{Digest, Sha256};

const PUBLIC_KEY_LENGTH: usize = 33;
const SIGNATURE_LENGTH: usize = 64;

/// Parsed administrator certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminCertificate {
    name: String,
    public_key: AdminPublicKey,
    signature: AdminSignature,
}

impl AdminCertificate {
    /// Issue a certificate for `key` under `name`.
    pub fn issue(name: &str, key: &AdminSigningKey) -> Result<Self, KeyError> {
        let public_key = key.public_key();
        let digest = tbs_digest(name, &public_key)?;
        let signature = key.sign_digest(&digest)?;
        Ok(Self {
            name: name.to_string(),
            public_key,
            signature,
        })
    }

    /// Parse and verify the self-signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let malformed = |reason: &str| KeyError::MalformedCertificate(reason.to_string());

        if bytes.len() < 4 {
            return Err(malformed("truncated name length"));
        }
        let name_len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let expected = 4usize
            .checked_add(name_len)
            .and_then(|n| n.checked_add(PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH))
            .ok_or_else(|| malformed("name length overflow"))?;
        if bytes.len() != expected {
            return Err(malformed("length does not match name length"));
        }

        let name = std::str::from_utf8(&bytes[4..4 + name_len])
            .map_err(|_| malformed("name is not UTF-8"))?
            .to_string();
        let mut key_bytes = [0u8; PUBLIC_KEY_LENGTH];
        key_bytes.copy_from_slice(&bytes[4 + name_len..4 + name_len + PUBLIC_KEY_LENGTH]);
        let public_key = AdminPublicKey::from_bytes(key_bytes)?;
        let mut sig_bytes = [0u8; SIGNATURE_LENGTH];
        sig_bytes.copy_from_slice(&bytes[expected - SIGNATURE_LENGTH..]);
        let signature = AdminSignature::from_bytes(sig_bytes);

        let certificate = Self {
            name,
            public_key,
            signature,
        };
        let digest = tbs_digest(&certificate.name, &certificate.public_key)?;
        certificate
            .public_key
            .verify_digest(&digest, &certificate.signature)
            .map_err(|_| malformed("self-signature does not verify"))?;
        Ok(certificate)
    }

    /// Encode to the wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.name.len() + PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH);
        out.extend_from_slice(&(self.name.len() as u32).to_be_bytes());
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(self.public_key.as_bytes());
        out.extend_from_slice(self.signature.as_bytes());
        out
    }

    /// Administrator name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Certified public key.
    pub fn public_key(&self) -> &AdminPublicKey {
        &self.public_key
    }

    /// SKI of the certified key.
    pub fn ski(&self) -> [u8; SKI_LENGTH] {
        self.public_key.ski()
    }
}

fn tbs_digest(name: &str, public_key: &AdminPublicKey) -> Result<[u8; 32], KeyError> {
    let name_len = u32::try_from(name.len())
        .map_err(|_| KeyError::MalformedCertificate("name too long".to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(name_len.to_be_bytes());
    hasher.update(name.as_bytes());
    hasher.update(public_key.as_bytes());
    Ok(hasher.finalize().into())
}
