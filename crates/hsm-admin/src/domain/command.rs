//! # Command Identifiers
//!
//! The closed set of administrative opcodes. The integer values are part of
//! the wire contract with the HSM firmware and must never be renumbered.

use super::errors::AdminError;
use std::fmt;

/// Bit set on every read-only query opcode.
pub const QUERY_BASE: u32 = 0x0001_0000;

/// Administrative operation code carried in every admin block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandId {
    // =========================================================================
    // Mutations (quorum-signed)
    // =========================================================================
    /// Install a domain administrator from its certificate.
    DomainAdminLogin = 2,
    /// Remove a domain administrator by SKI.
    DomainAdminLogout = 4,
    /// Replace the domain attributes wholesale.
    DomainSetAttributes = 8,
    /// Load a random value into the first empty wrapping key register.
    GenerateWrappingKey = 10,
    /// Promote the pending wrapping key register to current.
    FinalizeWrappingKey = 14,
    /// Erase all key material of the domain.
    DomainZeroize = 16,
    /// Replace the domain control points.
    DomainControlPointSet = 17,
    /// Enable domain control points.
    DomainControlPointAdd = 18,
    /// Disable domain control points.
    DomainControlPointRemove = 19,
    /// Empty the pending wrapping key register.
    ClearPendingWrappingKey = 28,

    // =========================================================================
    // Queries (unsigned, routed through the control domain)
    // =========================================================================
    /// Read one administrator's name and certificate.
    QueryDomainAdmin = QUERY_BASE | 2,
    /// Read an outbound-authentication certificate (or the chain length).
    QueryDeviceCertificate = QUERY_BASE | 3,
    /// List the SKIs of installed domain administrators.
    QueryDomainAdmins = QUERY_BASE | 7,
    /// Read the domain attributes.
    QueryDomainAttributes = QUERY_BASE | 9,
    /// Read both wrapping key registers.
    QueryDomainInfo = QUERY_BASE | 11,
    /// Read the 16-byte domain control point mask.
    QueryDomainControlPoints = QUERY_BASE | 13,
}

/// Which configured threshold authorizes a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuorumKind {
    /// Read-only; no signatures.
    None,
    /// `SignatureThreshold` signatures.
    Signature,
    /// `RevocationSignatureThreshold` signatures.
    Revocation,
}

impl CommandId {
    /// Every opcode, in wire order.
    pub const ALL: [CommandId; 16] = [
        CommandId::DomainAdminLogin,
        CommandId::DomainAdminLogout,
        CommandId::DomainSetAttributes,
        CommandId::GenerateWrappingKey,
        CommandId::FinalizeWrappingKey,
        CommandId::DomainZeroize,
        CommandId::DomainControlPointSet,
        CommandId::DomainControlPointAdd,
        CommandId::DomainControlPointRemove,
        CommandId::ClearPendingWrappingKey,
        CommandId::QueryDomainAdmin,
        CommandId::QueryDeviceCertificate,
        CommandId::QueryDomainAdmins,
        CommandId::QueryDomainAttributes,
        CommandId::QueryDomainInfo,
        CommandId::QueryDomainControlPoints,
    ];

    /// Wire value.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Decode a wire value.
    pub fn from_code(code: u32) -> Result<Self, AdminError> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.code() == code)
            .ok_or_else(|| AdminError::Format {
                reason: format!("unknown command id 0x{:08x}", code),
            })
    }

    /// True for read-only queries.
    pub fn is_query(self) -> bool {
        self.code() & QUERY_BASE != 0
    }

    /// Threshold the HSM applies before executing this command.
    pub fn quorum_kind(self) -> QuorumKind {
        match self {
            _ if self.is_query() => QuorumKind::None,
            CommandId::DomainAdminLogout | CommandId::DomainControlPointRemove => {
                QuorumKind::Revocation
            }
            _ => QuorumKind::Signature,
        }
    }

    /// True for commands the HSM cannot undo once executed.
    pub fn is_irreversible(self) -> bool {
        matches!(
            self,
            CommandId::DomainZeroize | CommandId::FinalizeWrappingKey
        )
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:08x})", self, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_are_fixed() {
        assert_eq!(CommandId::DomainAdminLogin.code(), 2);
        assert_eq!(CommandId::DomainAdminLogout.code(), 4);
        assert_eq!(CommandId::DomainSetAttributes.code(), 8);
        assert_eq!(CommandId::GenerateWrappingKey.code(), 10);
        assert_eq!(CommandId::FinalizeWrappingKey.code(), 14);
        assert_eq!(CommandId::DomainZeroize.code(), 16);
        assert_eq!(CommandId::DomainControlPointAdd.code(), 18);
        assert_eq!(CommandId::DomainControlPointRemove.code(), 19);
        assert_eq!(CommandId::ClearPendingWrappingKey.code(), 28);
        assert_eq!(CommandId::QueryDomainInfo.code(), 0x0001_000B);
        assert_eq!(CommandId::QueryDomainControlPoints.code(), 0x0001_000D);
    }

    #[test]
    fn test_codes_roundtrip_and_are_unique() {
        for id in CommandId::ALL {
            assert_eq!(CommandId::from_code(id.code()).unwrap(), id);
        }
        let mut codes: Vec<u32> = CommandId::ALL.iter().map(|c| c.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), CommandId::ALL.len());
    }

    #[test]
    fn test_unknown_code_is_format_error() {
        assert!(matches!(
            CommandId::from_code(0xDEAD),
            Err(AdminError::Format { .. })
        ));
    }

    #[test]
    fn test_quorum_kinds() {
        assert_eq!(CommandId::QueryDomainInfo.quorum_kind(), QuorumKind::None);
        assert_eq!(
            CommandId::DomainAdminLogout.quorum_kind(),
            QuorumKind::Revocation
        );
        assert_eq!(
            CommandId::DomainControlPointRemove.quorum_kind(),
            QuorumKind::Revocation
        );
        assert_eq!(
            CommandId::GenerateWrappingKey.quorum_kind(),
            QuorumKind::Signature
        );
        assert!(!CommandId::DomainZeroize.is_query());
        assert!(CommandId::DomainZeroize.is_irreversible());
    }
}
