//! # Domain Lifecycle
//!
//! Transition rules for the two wrapping key registers and the
//! administrator roster of a domain.
//!
//! The HSM owns the authoritative state. The service only uses
//! [`plan_random_key`] and [`pending_pattern`] against a freshly queried
//! [`DomainInfo`]; [`KeyRegisters`] and [`AdminRoster`] model the transitions
//! themselves and back the in-memory HSM used in tests.
//!
//! ```text
//!                 random key                  finalize(vp)
//!   current: Empty ─────────▶ Valid      pending ─────────────▶ current
//!   pending: Empty ─────────▶ FullUncommitted   (pending becomes Empty)
//!
//!   clear pending:  pending ─▶ Empty
//!   zeroize:        current, pending ─▶ Empty
//! ```

use super::command::{CommandId, QuorumKind};
use super::entities::Ski;
use super::errors::AdminError;
use super::value_objects::{
    AdministratorEntry, DomainAttributes, DomainInfo, KeyRegister, LoadedKey, MasterKeyRegister,
    RegisterStatus, VerificationPattern,
};

/// Register a random key would be loaded into.
///
/// # Errors
///
/// `AdminError::InvalidState` when both registers hold a key; one must be
/// cleared or finalized first.
pub fn plan_random_key(info: &DomainInfo) -> Result<KeyRegister, AdminError> {
    if info.current.status.is_empty() {
        Ok(KeyRegister::Current)
    } else if info.pending.status.is_empty() {
        Ok(KeyRegister::Pending)
    } else {
        Err(AdminError::invalid_state(format!(
            "domain {}: current register is {} and pending register is {}; clear or finalize before loading a new key",
            info.domain_index,
            info.current.status.label(),
            info.pending.status.label()
        )))
    }
}

/// Verification pattern that confirms a finalize.
///
/// # Errors
///
/// `AdminError::InvalidState` when the pending register is empty.
pub fn pending_pattern(info: &DomainInfo) -> Result<&VerificationPattern, AdminError> {
    if info.pending.status.is_empty() {
        return Err(AdminError::invalid_state(format!(
            "domain {}: pending register is empty, nothing to finalize",
            info.domain_index
        )));
    }
    Ok(&info.pending.verification_pattern)
}

/// Signatures the HSM requires before executing `command`.
pub fn required_signatures(command: CommandId, attributes: &DomainAttributes) -> u32 {
    match command.quorum_kind() {
        QuorumKind::None => 0,
        QuorumKind::Signature => attributes.signature_threshold,
        QuorumKind::Revocation => attributes.revocation_signature_threshold,
    }
}

// =============================================================================
// Key registers
// =============================================================================

/// Current and pending wrapping key registers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRegisters {
    pub current: MasterKeyRegister,
    pub pending: MasterKeyRegister,
}

impl Default for KeyRegisters {
    fn default() -> Self {
        Self {
            current: MasterKeyRegister::empty(),
            pending: MasterKeyRegister::empty(),
        }
    }
}

impl KeyRegisters {
    pub fn to_info(&self, domain_index: u32) -> DomainInfo {
        DomainInfo {
            domain_index,
            current: self.current.clone(),
            pending: self.pending.clone(),
        }
    }

    /// Load a random key whose verification pattern is `pattern`.
    ///
    /// The first key of an empty domain has nothing to rotate against and
    /// is active at once; a key loaded beside it waits in pending.
    pub fn load_random(&mut self, pattern: VerificationPattern) -> Result<LoadedKey, AdminError> {
        let register = plan_random_key(&self.to_info(0))?;
        let status = match register {
            KeyRegister::Current => RegisterStatus::Valid,
            KeyRegister::Pending => RegisterStatus::FullUncommitted,
        };
        let slot = match register {
            KeyRegister::Current => &mut self.current,
            KeyRegister::Pending => &mut self.pending,
        };
        *slot = MasterKeyRegister {
            status,
            verification_pattern: pattern.clone(),
        };
        Ok(LoadedKey {
            register,
            verification_pattern: pattern,
        })
    }

    /// Promote pending to current if `confirmation` matches pending.
    pub fn finalize(&mut self, confirmation: &VerificationPattern) -> Result<(), AdminError> {
        if self.pending.status.is_empty() {
            return Err(AdminError::invalid_state(
                "pending register is empty, nothing to finalize",
            ));
        }
        let expected = &self.pending.verification_pattern;
        if expected != confirmation {
            return Err(AdminError::invalid_state(format!(
                "pending verification pattern changed: expected {}, got {}",
                expected.to_hex(),
                confirmation.to_hex()
            )));
        }
        self.current = MasterKeyRegister {
            status: RegisterStatus::Valid,
            verification_pattern: self.pending.verification_pattern.clone(),
        };
        self.pending = MasterKeyRegister::empty();
        Ok(())
    }

    pub fn clear_pending(&mut self) {
        self.pending = MasterKeyRegister::empty();
    }

    pub fn zeroize(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// Administrator roster
// =============================================================================

/// Installed administrators in installation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminRoster {
    entries: Vec<AdministratorEntry>,
}

impl AdminRoster {
    pub fn install(&mut self, entry: AdministratorEntry) -> Result<(), AdminError> {
        if self.get(&entry.ski).is_some() {
            return Err(AdminError::invalid_state(format!(
                "administrator {} already installed",
                entry.ski
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, ski: &Ski) -> Result<AdministratorEntry, AdminError> {
        let position = self
            .entries
            .iter()
            .position(|e| &e.ski == ski)
            .ok_or_else(|| AdminError::invalid_state(format!("administrator {} not installed", ski)))?;
        Ok(self.entries.remove(position))
    }

    pub fn get(&self, ski: &Ski) -> Option<&AdministratorEntry> {
        self.entries.iter().find(|e| &e.ski == ski)
    }

    pub fn skis(&self) -> Vec<Ski> {
        self.entries.iter().map(|e| e.ski.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
