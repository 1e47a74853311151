//! # Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the protocol core depends on. All calls are synchronous;
//! the core never retries them and propagates their errors unchanged.

use crate::domain::entities::{DomainEntry, ModuleId, SignatureKeyReference, TransactionCounter};
use crate::domain::errors::{AdminError, SigningError, TransportError};

/// Delivery of admin requests to an HSM instance.
pub trait HsmTransport: Send + Sync {
    /// POST `body` (a `{"request": "<hex>"}` document) to the HSM identified
    /// by `hsm_id` and return the HSM's hex response string.
    ///
    /// # Errors
    /// * `TransportError::Status` - non-2xx HTTP status
    /// * `TransportError::Connection` - endpoint unreachable
    fn submit(&self, hsm_id: &str, body: &str) -> Result<String, TransportError>;
}

/// Discovery of the domains assigned to a service instance.
pub trait DomainDirectory: Send + Sync {
    fn list_domains(&self) -> Result<Vec<DomainEntry>, TransportError>;
}

/// Produces one participant's signature over a command digest.
///
/// Implementations may unlock a local key file or call a remote signing
/// service; the core does not care which.
pub trait SignatureProvider: Send + Sync {
    fn sign(&self, reference: &SignatureKeyReference, digest: &[u8])
        -> Result<Vec<u8>, SigningError>;
}

/// Source of anti-replay counters.
///
/// Contract: for a given module, every value returned is strictly greater
/// than every value returned before it by the same source.
pub trait TransactionCounterSource: Send + Sync {
    /// # Errors
    /// * `AdminError::InvalidState` - the counter space is exhausted
    fn next(&self, module: ModuleId) -> Result<TransactionCounter, AdminError>;
}

/// Digest the HSM expects signatures to cover.
pub trait CommandDigest: Send + Sync {
    fn digest(&self, command_bytes: &[u8]) -> Vec<u8>;
}

/// Wall clock used to seed counters.
pub trait TimeSource: Send + Sync {
    /// Microseconds since the Unix epoch.
    fn now_micros(&self) -> u64;
}

/// Default time source using the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_micros(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }
}

/// HTTP client for a remote signing service.
pub trait SigningServiceClient: Send + Sync {
    /// POST a JSON `body` to `path` with `Authorization: <bearer_token>` and
    /// return the response body.
    fn post(&self, path: &str, bearer_token: &str, body: &str) -> Result<String, TransportError>;
}
