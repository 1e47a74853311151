//! # HSM Domain Administration
//!
//! Quorum-signed administrative command protocol for cloud-hosted HSM
//! domains: master key register lifecycle, administrator roster, quorum
//! policy and read-only domain queries.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): command ids, admin block codec, builders,
//!   payload formats and register lifecycle. Pure, no I/O
//! - **Ports Layer** (`ports/`): inbound API and outbound collaborator traits
//! - **Assembler** (`assembler.rs`): quorum signing and request assembly
//! - **Response Parser** (`response.rs`): status validation of HSM replies
//! - **Service Layer** (`service/`): wires everything to the ports
//! - **Adapters** (`adapters/`): counters, digests, signers, config
//!
//! ## Data Flow
//!
//! ```text
//! builder ─▶ assembler (+ quorum signer) ─▶ transport ─▶ response parser
//!                                                            │
//!                        lifecycle (may query first) ◀───────┘
//! ```
//!
//! ## Security Notes
//!
//! - Signing is all-or-nothing; no request leaves with a partial quorum
//! - HSM rejections keep their raw return and reason codes
//! - Register state is always re-read from the HSM, never cached
//! - Zeroize and finalize are irreversible and never retried

pub mod adapters;
pub mod assembler;
pub mod domain;
pub mod ports;
pub mod response;
pub mod service;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export public API
pub use adapters::{
    AdminConfig, ConfigError, DigestAlgorithm, KeyFileSigner, MonotonicCounterSource, RequestBody,
    SigningServiceSigner, StaticDomainDirectory,
};
pub use assembler::{QuorumSigner, RequestAssembler};
pub use domain::{
    AdminBlock, AdminCommand, AdminError, AdministratorEntry, CommandId, ControlPoints,
    Credential, DomainAttributes, DomainEntry, DomainId, DomainInfo, HsmInfo, KeyRegister,
    LoadedKey, ModuleId, QuorumAuthorization, RegisterStatus, SignatureKeyReference, SigningError,
    Ski, StatusCode, TransactionCounter, TransportError, VerificationPattern,
};
pub use ports::inbound::DomainAdminApi;
pub use ports::outbound::{
    CommandDigest, DomainDirectory, HsmTransport, SignatureProvider, SigningServiceClient,
    TransactionCounterSource,
};
pub use response::parse_response;
pub use service::{DomainAdminDependencies, DomainAdminService};
pub use telemetry::init_tracing;
