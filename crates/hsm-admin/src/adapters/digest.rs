//! Command digest strategies.

use crate::ports::outbound::CommandDigest;
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};

/// Hash applied to the encoded admin block before signing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha256,
    /// What the signing service contract names `sha2-512`.
    #[default]
    Sha512,
}

impl DigestAlgorithm {
    /// Name used in signing-service requests.
    pub fn service_name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha2-256",
            DigestAlgorithm::Sha512 => "sha2-512",
        }
    }
}

impl CommandDigest for DigestAlgorithm {
    fn digest(&self, command_bytes: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => Sha256::digest(command_bytes).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(command_bytes).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_lengths() {
        assert_eq!(DigestAlgorithm::Sha256.digest(b"abc").len(), 32);
        assert_eq!(DigestAlgorithm::Sha512.digest(b"abc").len(), 64);
        assert_eq!(DigestAlgorithm::default(), DigestAlgorithm::Sha512);
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            hex::encode(DigestAlgorithm::Sha256.digest(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
