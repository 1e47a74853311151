//! Ports (hexagonal architecture boundaries).

pub mod inbound;
pub mod outbound;

pub use inbound::DomainAdminApi;
pub use outbound::{
    CommandDigest, DomainDirectory, HsmTransport, SignatureProvider, SigningServiceClient,
    SystemTimeSource, TimeSource, TransactionCounterSource,
};
