//! # Value Objects
//!
//! Domain attributes, control points, key registers and administrator
//! records as read from (or written to) an HSM domain.

use super::entities::Ski;
use super::errors::AdminError;
use serde::Serialize;
use std::fmt;

/// Length of the control point mask.
pub const CONTROL_POINTS_LENGTH: usize = 16;

/// Domain quorum policy. Replaced wholesale; there is no partial update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DomainAttributes {
    pub signature_threshold: u32,
    pub revocation_signature_threshold: u32,
    pub permissions: u32,
    pub operational_mode: u32,
}

/// 128-bit domain control point mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlPoints([u8; CONTROL_POINTS_LENGTH]);

impl ControlPoints {
    pub fn new(mask: [u8; CONTROL_POINTS_LENGTH]) -> Self {
        Self(mask)
    }

    /// Wrap a mask, refusing anything but exactly 16 bytes.
    pub fn from_slice(mask: &[u8]) -> Result<Self, AdminError> {
        let array: [u8; CONTROL_POINTS_LENGTH] =
            mask.try_into().map_err(|_| AdminError::InvalidLength {
                field: "control point mask",
                expected: CONTROL_POINTS_LENGTH,
                actual: mask.len(),
            })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; CONTROL_POINTS_LENGTH] {
        &self.0
    }

    /// True if control point `index` (0 = most significant bit) is set.
    pub fn is_set(&self, index: usize) -> bool {
        index < CONTROL_POINTS_LENGTH * 8 && self.0[index / 8] & (0x80 >> (index % 8)) != 0
    }

    /// Union of two masks.
    pub fn union(&self, other: &ControlPoints) -> ControlPoints {
        let mut mask = self.0;
        mask.iter_mut().zip(other.0.iter()).for_each(|(a, b)| *a |= b);
        ControlPoints(mask)
    }

    /// Bits of `self` not set in `other`.
    pub fn without(&self, other: &ControlPoints) -> ControlPoints {
        let mut mask = self.0;
        mask.iter_mut().zip(other.0.iter()).for_each(|(a, b)| *a &= !b);
        ControlPoints(mask)
    }
}

/// Opaque, non-reversible fingerprint of a key register's contents.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VerificationPattern(Vec<u8>);

impl VerificationPattern {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for VerificationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerificationPattern({})", self.to_hex())
    }
}

/// Wrapping key register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum KeyRegister {
    Current,
    Pending,
}

/// Status of a wrapping key register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterStatus {
    Empty,
    /// Current register only: committed and in active use.
    Valid,
    FullUncommitted,
    FullCommitted,
}

impl RegisterStatus {
    pub fn code(self) -> u32 {
        match self {
            RegisterStatus::Empty => 0,
            RegisterStatus::Valid => 1,
            RegisterStatus::FullUncommitted => 2,
            RegisterStatus::FullCommitted => 3,
        }
    }

    pub fn from_code(code: u32) -> Result<Self, AdminError> {
        match code {
            0 => Ok(RegisterStatus::Empty),
            1 => Ok(RegisterStatus::Valid),
            2 => Ok(RegisterStatus::FullUncommitted),
            3 => Ok(RegisterStatus::FullCommitted),
            other => Err(AdminError::format(format!(
                "unknown register status {}",
                other
            ))),
        }
    }

    pub fn is_empty(self) -> bool {
        self == RegisterStatus::Empty
    }

    /// Operator-facing label.
    pub fn label(self) -> &'static str {
        match self {
            RegisterStatus::Empty => "Empty",
            RegisterStatus::Valid => "Valid",
            RegisterStatus::FullUncommitted => "Full Uncommitted",
            RegisterStatus::FullCommitted => "Full Committed",
        }
    }
}

/// One wrapping key register as reported by the HSM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasterKeyRegister {
    pub status: RegisterStatus,
    pub verification_pattern: VerificationPattern,
}

impl MasterKeyRegister {
    pub fn empty() -> Self {
        Self {
            status: RegisterStatus::Empty,
            verification_pattern: VerificationPattern::new(Vec::new()),
        }
    }
}

/// Both key registers of a domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainInfo {
    pub domain_index: u32,
    pub current: MasterKeyRegister,
    pub pending: MasterKeyRegister,
}

/// Result of loading a random key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedKey {
    /// Which register received the key.
    pub register: KeyRegister,
    pub verification_pattern: VerificationPattern,
}

/// An installed domain administrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdministratorEntry {
    pub ski: Ski,
    pub name: String,
    pub certificate: Vec<u8>,
}

/// Administrator summary in an instance report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminSummary {
    pub name: String,
    pub ski: String,
}

/// Configuration summary of one domain of a service instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HsmInfo {
    pub hsm_id: String,
    pub location: String,
    pub hsm_type: String,
    pub signature_threshold: u32,
    pub revocation_threshold: u32,
    pub admins: Vec<AdminSummary>,
    pub pending_key_status: String,
    pub pending_key_vp: String,
    pub current_key_status: String,
    pub current_key_vp: String,
}
