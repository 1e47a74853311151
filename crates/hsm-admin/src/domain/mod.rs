//! Pure protocol core: no I/O, no signing, no clocks.

pub mod builders;
pub mod codec;
pub mod command;
pub mod entities;
pub mod errors;
pub mod lifecycle;
pub mod payloads;
pub mod value_objects;

pub use command::{CommandId, QuorumKind, QUERY_BASE};
pub use entities::{
    AdminBlock, AdminCommand, AdminRequest, AdminResponse, Credential, DomainEntry, DomainId,
    ModuleId, QuorumAuthorization, QuorumSignature, SignatureKeyReference, Ski, StatusCode,
    TransactionCounter, CONTROL_DOMAIN_SENTINEL,
};
pub use errors::{AdminError, SigningError, TransportError};
pub use value_objects::{
    AdminSummary, AdministratorEntry, ControlPoints, DomainAttributes, DomainInfo, HsmInfo,
    KeyRegister, LoadedKey, MasterKeyRegister, RegisterStatus, VerificationPattern,
    CONTROL_POINTS_LENGTH,
};
