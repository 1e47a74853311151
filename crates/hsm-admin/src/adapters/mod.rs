//! # Adapters
//!
//! Concrete implementations of the outbound ports plus configuration.
//!
//! - `MonotonicCounterSource` - wall-clock seeded anti-replay counters
//! - `DigestAlgorithm` - SHA-256 / SHA-512 command digests
//! - `KeyFileSigner` - local password-protected key files
//! - `SigningServiceSigner` - remote signing service over a client port
//! - `RequestBody` - `{"request": "<hex>"}` transport body
//! - `StaticDomainDirectory` - fixed domain list
//! - `AdminConfig` - TOML configuration

pub mod config;
pub mod counter;
pub mod digest;
pub mod directory;
pub mod key_file_signer;
pub mod request_body;
pub mod signing_service;

pub use config::{AdminConfig, AdministratorConfig, ConfigError, LoggingConfig};
pub use counter::MonotonicCounterSource;
pub use digest::DigestAlgorithm;
pub use directory::{parse_domain_listing, StaticDomainDirectory};
pub use key_file_signer::KeyFileSigner;
pub use request_body::RequestBody;
pub use signing_service::SigningServiceSigner;
