//! Signing through a remote signing service.
//!
//! ```text
//! POST /sign/<key>
//! Authorization: <bearer token>
//! {"hash_algorithm": "sha2-512", "input": "<hex digest>"}
//!
//! 200 {"signature": "<hex>"}
//! ```

use crate::adapters::digest::DigestAlgorithm;
use crate::domain::entities::{Credential, SignatureKeyReference};
use crate::domain::errors::{SigningError, TransportError};
use crate::ports::outbound::{SignatureProvider, SigningServiceClient};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    hash_algorithm: &'a str,
    input: String,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signature: String,
}

/// Signs digests with keys held by a remote signing service.
pub struct SigningServiceSigner<C> {
    client: C,
    algorithm: DigestAlgorithm,
}

impl<C: SigningServiceClient> SigningServiceSigner<C> {
    /// `algorithm` must match the digest the assembler computes.
    pub fn new(client: C, algorithm: DigestAlgorithm) -> Self {
        Self { client, algorithm }
    }
}

impl<C: SigningServiceClient> SignatureProvider for SigningServiceSigner<C> {
    fn sign(
        &self,
        reference: &SignatureKeyReference,
        digest: &[u8],
    ) -> Result<Vec<u8>, SigningError> {
        let Credential::BearerToken(token) = &reference.credential else {
            return Err(SigningError::InvalidCredential {
                key: reference.key.clone(),
            });
        };
        let service_error = |reason: String| SigningError::Service {
            key: reference.key.clone(),
            reason,
        };

        let body = serde_json::to_string(&SignRequest {
            hash_algorithm: self.algorithm.service_name(),
            input: hex::encode(digest),
        })
        .map_err(|e| service_error(e.to_string()))?;

        let path = format!("/sign/{}", reference.key);
        let response = self
            .client
            .post(&path, token, &body)
            .map_err(|e| match e {
                TransportError::Status { status: 401 | 403, .. } => SigningError::InvalidCredential {
                    key: reference.key.clone(),
                },
                other => service_error(other.to_string()),
            })?;

        let parsed: SignResponse = serde_json::from_str(&response)
            .map_err(|e| service_error(format!("malformed response: {}", e)))?;
        let signature = hex::decode(&parsed.signature)
            .map_err(|e| service_error(format!("signature is not hex: {}", e)))?;
        if signature.is_empty() {
            return Err(service_error("empty signature".to_string()));
        }
        debug!(key = %reference.key, ski = %reference.ski, "Signed with signing service");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Ski;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CannedClient {
        reply: Option<Result<String, TransportError>>,
        seen: Mutex<Vec<(String, String, String)>>,
    }

    impl SigningServiceClient for CannedClient {
        fn post(&self, path: &str, bearer_token: &str, body: &str) -> Result<String, TransportError> {
            self.seen
                .lock()
                .push((path.to_string(), bearer_token.to_string(), body.to_string()));
            self.reply
                .clone()
                .unwrap_or_else(|| Ok(r#"{"signature":"0a0b"}"#.to_string()))
        }
    }

    fn reference(credential: Credential) -> SignatureKeyReference {
        SignatureKeyReference::new("admin-key-1", Ski::from_bytes(vec![1; 32]).unwrap(), credential)
    }

    #[test]
    fn test_request_shape() {
        let signer = SigningServiceSigner::new(CannedClient::default(), DigestAlgorithm::Sha512);
        let signature = signer
            .sign(&reference(Credential::BearerToken("Bearer abc".into())), &[0xFF, 0x01])
            .unwrap();
        assert_eq!(signature, vec![0x0A, 0x0B]);

        let seen = signer.client.seen.lock();
        let (path, token, body) = &seen[0];
        assert_eq!(path, "/sign/admin-key-1");
        assert_eq!(token, "Bearer abc");
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["hash_algorithm"], "sha2-512");
        assert_eq!(json["input"], "ff01");
    }

    #[test]
    fn test_unauthorized_maps_to_invalid_credential() {
        let client = CannedClient {
            reply: Some(Err(TransportError::Status {
                status: 401,
                body: "no".into(),
            })),
            ..Default::default()
        };
        let signer = SigningServiceSigner::new(client, DigestAlgorithm::Sha512);
        assert!(matches!(
            signer.sign(&reference(Credential::BearerToken("t".into())), &[1]),
            Err(SigningError::InvalidCredential { .. })
        ));
    }

    #[test]
    fn test_bad_responses() {
        for reply in [r#"{"sig":"00"}"#, r#"{"signature":"xyz"}"#, r#"{"signature":""}"#] {
            let client = CannedClient {
                reply: Some(Ok(reply.to_string())),
                ..Default::default()
            };
            let signer = SigningServiceSigner::new(client, DigestAlgorithm::Sha512);
            assert!(matches!(
                signer.sign(&reference(Credential::BearerToken("t".into())), &[1]),
                Err(SigningError::Service { .. })
            ));
        }
    }

    #[test]
    fn test_password_credential_rejected_without_network() {
        let signer = SigningServiceSigner::new(CannedClient::default(), DigestAlgorithm::Sha512);
        assert!(signer
            .sign(&reference(Credential::Password("pw".into())), &[1])
            .is_err());
        assert!(signer.client.seen.lock().is_empty());
    }
}
