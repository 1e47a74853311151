//! Signing with password-protected administrator key files.

use crate::domain::entities::{Credential, SignatureKeyReference};
use crate::domain::errors::SigningError;
use crate::ports::outbound::SignatureProvider;
use admin_keys::{EncryptedKeyFile, KeyError};
use tracing::debug;

/// Unlocks the key file named by `reference.key` with the password
/// credential and signs the digest as an ECDSA prehash.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyFileSigner;

impl KeyFileSigner {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureProvider for KeyFileSigner {
    fn sign(
        &self,
        reference: &SignatureKeyReference,
        digest: &[u8],
    ) -> Result<Vec<u8>, SigningError> {
        let key_name = || reference.key.clone();
        let Credential::Password(password) = &reference.credential else {
            return Err(SigningError::InvalidCredential { key: key_name() });
        };

        let file = EncryptedKeyFile::read(&reference.key).map_err(|e| SigningError::KeyUnavailable {
            key: key_name(),
            reason: e.to_string(),
        })?;
        let mismatch = || SigningError::SkiMismatch {
            key: key_name(),
            expected_ski: reference.ski.to_hex(),
        };
        // compare SKIs before key derivation
        if file.ski_bytes().map_err(|_| mismatch())? != reference.ski.as_bytes() {
            return Err(mismatch());
        }

        let key = file.open(password).map_err(|e| match e {
            KeyError::UnsealFailed => SigningError::InvalidCredential { key: key_name() },
            other => SigningError::KeyUnavailable {
                key: key_name(),
                reason: other.to_string(),
            },
        })?;
        if key.ski().as_slice() != reference.ski.as_bytes() {
            return Err(mismatch());
        }

        let signature = key.sign_digest(digest).map_err(|e| SigningError::Failed {
            key: key_name(),
            reason: e.to_string(),
        })?;
        debug!(key = %reference.key, ski = %reference.ski, "Signed with key file");
        Ok(signature.as_bytes().to_vec())
    }
}
