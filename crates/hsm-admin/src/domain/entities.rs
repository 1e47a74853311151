//! # Domain Entities
//!
//! Addressing, admin blocks and the quorum authorization that travels with
//! them.
//!
//! Construction is two-staged: command builders produce an unaddressed
//! [`AdminCommand`]; only the request assembler turns it into an addressed
//! [`AdminBlock`] by filling in domain, module and transaction counter.

use super::command::CommandId;
use super::errors::AdminError;
use serde::Deserialize;
use std::fmt;

/// Wire value of the control-domain sentinel.
pub const CONTROL_DOMAIN_SENTINEL: u32 = 0xFFFF_FFFF;

// =============================================================================
// Addressing
// =============================================================================

/// Administrative domain field of an admin block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainId {
    /// Reserved routing for unauthenticated read queries.
    Control,
    /// A concrete administrative domain.
    Index(u32),
}

impl DomainId {
    /// Wire value.
    pub fn to_wire(self) -> u32 {
        match self {
            DomainId::Control => CONTROL_DOMAIN_SENTINEL,
            DomainId::Index(index) => index,
        }
    }

    /// Decode a wire value.
    pub fn from_wire(value: u32) -> Self {
        if value == CONTROL_DOMAIN_SENTINEL {
            DomainId::Control
        } else {
            DomainId::Index(value)
        }
    }
}

/// Physical crypto module within the HSM fleet. Zero means unset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

impl ModuleId {
    /// Placeholder carried by queries.
    pub const UNSET: ModuleId = ModuleId(0);

    /// Module id for a crypto module index (index + 1, so zero stays unset).
    pub fn from_module_index(index: u32) -> Result<Self, AdminError> {
        index
            .checked_add(1)
            .map(ModuleId)
            .ok_or_else(|| AdminError::argument(format!("crypto module index {} out of range", index)))
    }
}

/// Anti-replay value of a signed command. Zero means unset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionCounter(pub u64);

impl TransactionCounter {
    /// Placeholder carried by queries.
    pub const UNSET: TransactionCounter = TransactionCounter(0);
}

/// A domain as listed for a service instance.
///
/// Deserializes from the directory listing (`GET .../hsms`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DomainEntry {
    /// HSM instance id used in the transport URL.
    pub hsm_id: String,
    /// Location string (zone / data center).
    #[serde(default)]
    pub location: String,
    /// HSM type string.
    #[serde(default, rename = "type")]
    pub hsm_type: String,
    /// Index of the crypto module hosting the domain.
    pub crypto_module_index: u32,
    /// Index of the domain within the module.
    pub domain_index: u32,
}

impl DomainEntry {
    /// Convenience constructor.
    pub fn new(hsm_id: impl Into<String>, crypto_module_index: u32, domain_index: u32) -> Self {
        Self {
            hsm_id: hsm_id.into(),
            location: String::new(),
            hsm_type: String::new(),
            crypto_module_index,
            domain_index,
        }
    }

    /// Administrative domain of this entry.
    ///
    /// # Errors
    ///
    /// `AdminError::Argument` if the index collides with the control sentinel.
    pub fn domain_id(&self) -> Result<DomainId, AdminError> {
        if self.domain_index == CONTROL_DOMAIN_SENTINEL {
            return Err(AdminError::argument(format!(
                "domain index 0x{:08x} is reserved",
                self.domain_index
            )));
        }
        Ok(DomainId::Index(self.domain_index))
    }

    /// Module id of this entry.
    pub fn module_id(&self) -> Result<ModuleId, AdminError> {
        ModuleId::from_module_index(self.crypto_module_index)
    }
}

// =============================================================================
// Admin blocks
// =============================================================================

/// Unaddressed command produced by a builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminCommand {
    pub command_id: CommandId,
    pub input: Vec<u8>,
}

impl AdminCommand {
    pub fn new(command_id: CommandId, input: Vec<u8>) -> Self {
        Self { command_id, input }
    }

    /// Command with no input.
    pub fn empty(command_id: CommandId) -> Self {
        Self::new(command_id, Vec::new())
    }

    /// Address the command. Only the request assembler and tests call this.
    pub fn address(
        self,
        domain_id: DomainId,
        module_id: ModuleId,
        transaction_counter: TransactionCounter,
    ) -> AdminBlock {
        AdminBlock {
            command_id: self.command_id,
            domain_id,
            module_id,
            transaction_counter,
            payload: self.input,
        }
    }
}

/// Addressed admin block: the unit of the wire protocol.
///
/// `payload` is the command input on requests and the command output on
/// responses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminBlock {
    pub command_id: CommandId,
    pub domain_id: DomainId,
    pub module_id: ModuleId,
    pub transaction_counter: TransactionCounter,
    pub payload: Vec<u8>,
}

/// HSM return and reason codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct StatusCode {
    pub return_code: u32,
    pub reason_code: u32,
}

impl StatusCode {
    pub const OK: StatusCode = StatusCode {
        return_code: 0,
        reason_code: 0,
    };

    pub fn new(return_code: u32, reason_code: u32) -> Self {
        Self {
            return_code,
            reason_code,
        }
    }

    /// Only an all-zero status is success; unknown codes are failures.
    pub fn is_success(&self) -> bool {
        self.return_code == 0 && self.reason_code == 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "return code 0x{:08x}, reason code 0x{:08x}",
            self.return_code, self.reason_code
        )
    }
}

/// Request envelope around an addressed block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminRequest {
    pub crypto_module_index: u32,
    pub domain_index: u32,
    pub block: AdminBlock,
    /// `None` on the query path.
    pub authorization: Option<QuorumAuthorization>,
}

/// Response envelope: status plus the echoed block carrying the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminResponse {
    pub status: StatusCode,
    pub block: AdminBlock,
}

// =============================================================================
// Quorum
// =============================================================================

/// Subject Key Identifier of an administrator signature key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ski(Vec<u8>);

impl Ski {
    /// Wrap raw bytes. Empty identifiers are rejected.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, AdminError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AdminError::argument("SKI must not be empty"));
        }
        Ok(Self(bytes))
    }

    /// Decode a hexadecimal SKI.
    ///
    /// # Errors
    ///
    /// `AdminError::Decode` on odd length or non-hex digits.
    pub fn from_hex(value: &str) -> Result<Self, AdminError> {
        let bytes = hex::decode(value)
            .map_err(|e| AdminError::decode(format!("SKI {:?}: {}", value, e)))?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Ski {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ski({})", self.to_hex())
    }
}

impl fmt::Display for Ski {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// How use of a participant's private key is authorized.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Password of a local encrypted key file.
    Password(String),
    /// Bearer token for a remote signing service.
    BearerToken(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Password(<redacted>)"),
            Credential::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
        }
    }
}

/// One quorum participant. Supplied per call, never retained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureKeyReference {
    /// Key file path or signing-service key name.
    pub key: String,
    pub ski: Ski,
    pub credential: Credential,
}

impl SignatureKeyReference {
    pub fn new(key: impl Into<String>, ski: Ski, credential: Credential) -> Self {
        Self {
            key: key.into(),
            ski,
            credential,
        }
    }
}

/// One participant's signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuorumSignature {
    pub ski: Ski,
    pub signature: Vec<u8>,
}

/// Ordered signatures over one command's digest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuorumAuthorization {
    pub signatures: Vec<QuorumSignature>,
}

impl QuorumAuthorization {
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// SKIs in signing order.
    pub fn signers(&self) -> impl Iterator<Item = &Ski> {
        self.signatures.iter().map(|s| &s.ski)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_id_wire_mapping() {
        assert_eq!(DomainId::Control.to_wire(), CONTROL_DOMAIN_SENTINEL);
        assert_eq!(DomainId::from_wire(CONTROL_DOMAIN_SENTINEL), DomainId::Control);
        assert_eq!(DomainId::from_wire(7), DomainId::Index(7));
    }

    #[test]
    fn test_domain_entry_rejects_sentinel_index() {
        let entry = DomainEntry::new("hsm", 0, CONTROL_DOMAIN_SENTINEL);
        assert!(matches!(entry.domain_id(), Err(AdminError::Argument { .. })));
    }

    #[test]
    fn test_module_id_never_unset_for_real_module() {
        assert_eq!(ModuleId::from_module_index(0).unwrap(), ModuleId(1));
        assert!(ModuleId::from_module_index(u32::MAX).is_err());
    }

    #[test]
    fn test_domain_entry_from_listing_json() {
        let json = r#"{"hsm_id":"hsm-1","location":"dal10","type":"crypto-unit",
                       "crypto_module_index":3,"domain_index":14}"#;
        let entry: DomainEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.hsm_type, "crypto-unit");
        assert_eq!(entry.domain_id().unwrap(), DomainId::Index(14));
        assert_eq!(entry.module_id().unwrap(), ModuleId(4));
    }

    #[test]
    fn test_ski_hex() {
        let ski = Ski::from_hex("A1b2C3").unwrap();
        assert_eq!(ski.as_bytes(), &[0xA1, 0xB2, 0xC3]);
        assert_eq!(ski.to_string(), "a1b2c3");

        assert!(matches!(Ski::from_hex("a1b"), Err(AdminError::Decode { .. })));
        assert!(matches!(Ski::from_hex("zz"), Err(AdminError::Decode { .. })));
        assert!(matches!(Ski::from_hex(""), Err(AdminError::Argument { .. })));
    }

    #[test]
    fn test_status_code_success_only_when_zero() {
        assert!(StatusCode::OK.is_success());
        assert!(!StatusCode::new(0, 1).is_success());
        assert!(!StatusCode::new(1, 0).is_success());
    }

    #[test]
    fn test_credentials_are_redacted() {
        let reference = SignatureKeyReference::new(
            "/keys/a.json",
            Ski::from_bytes(vec![1, 2]).unwrap(),
            Credential::Password("hunter2".into()),
        );
        let rendered = format!("{:?}", reference);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }
}
