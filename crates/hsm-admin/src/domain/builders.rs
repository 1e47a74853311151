//! # Command Builders
//!
//! One pure function per administrative operation. Builders set only the
//! command id and input; addressing and signing belong to the assembler.

use super::command::CommandId;
use super::entities::{AdminCommand, Ski};
use super::errors::AdminError;
use super::payloads::{encode_attributes, ATTRIBUTES_PAYLOAD_LENGTH};
use super::value_objects::{ControlPoints, DomainAttributes, VerificationPattern};

// =============================================================================
// Key registers
// =============================================================================

/// Load a random wrapping key into the first empty register.
pub fn generate_wrapping_key() -> AdminCommand {
    AdminCommand::empty(CommandId::GenerateWrappingKey)
}

/// Commit the pending register. `pattern` must be the pending register's
/// verification pattern as last read from the HSM.
pub fn finalize_wrapping_key(pattern: &VerificationPattern) -> Result<AdminCommand, AdminError> {
    if pattern.is_empty() {
        return Err(AdminError::argument(
            "finalize requires the pending verification pattern",
        ));
    }
    Ok(AdminCommand::new(
        CommandId::FinalizeWrappingKey,
        pattern.as_bytes().to_vec(),
    ))
}

pub fn clear_pending_wrapping_key() -> AdminCommand {
    AdminCommand::empty(CommandId::ClearPendingWrappingKey)
}

pub fn zeroize_domain() -> AdminCommand {
    AdminCommand::empty(CommandId::DomainZeroize)
}

// =============================================================================
// Administrators
// =============================================================================

/// Install an administrator from its certificate.
pub fn add_domain_admin(certificate: &[u8]) -> Result<AdminCommand, AdminError> {
    if certificate.is_empty() {
        return Err(AdminError::argument("administrator certificate is empty"));
    }
    Ok(AdminCommand::new(
        CommandId::DomainAdminLogin,
        certificate.to_vec(),
    ))
}

/// Remove an administrator by SKI.
pub fn remove_domain_admin(ski: &Ski) -> AdminCommand {
    AdminCommand::new(CommandId::DomainAdminLogout, ski.as_bytes().to_vec())
}

/// Remove an administrator by hex SKI.
///
/// # Errors
///
/// `AdminError::Decode` for odd-length or non-hex input.
pub fn remove_domain_admin_hex(ski_hex: &str) -> Result<AdminCommand, AdminError> {
    Ok(remove_domain_admin(&Ski::from_hex(ski_hex)?))
}

// =============================================================================
// Policy
// =============================================================================

pub fn set_domain_attributes(attributes: &DomainAttributes) -> AdminCommand {
    AdminCommand::new(
        CommandId::DomainSetAttributes,
        encode_attributes(attributes),
    )
}

/// Set attributes from a pre-encoded tag/value payload.
pub fn set_domain_attributes_payload(payload: &[u8]) -> Result<AdminCommand, AdminError> {
    check_length("attribute payload", ATTRIBUTES_PAYLOAD_LENGTH, payload)?;
    Ok(AdminCommand::new(
        CommandId::DomainSetAttributes,
        payload.to_vec(),
    ))
}

pub fn add_domain_control_points(mask: &ControlPoints) -> AdminCommand {
    AdminCommand::new(CommandId::DomainControlPointAdd, mask.as_bytes().to_vec())
}

pub fn remove_domain_control_points(mask: &ControlPoints) -> AdminCommand {
    AdminCommand::new(
        CommandId::DomainControlPointRemove,
        mask.as_bytes().to_vec(),
    )
}

pub fn set_domain_control_points(mask: &ControlPoints) -> AdminCommand {
    AdminCommand::new(CommandId::DomainControlPointSet, mask.as_bytes().to_vec())
}

/// Enable control points from a raw mask of exactly 16 bytes.
pub fn add_domain_control_points_raw(mask: &[u8]) -> Result<AdminCommand, AdminError> {
    Ok(add_domain_control_points(&ControlPoints::from_slice(mask)?))
}

/// Disable control points from a raw mask of exactly 16 bytes.
pub fn remove_domain_control_points_raw(mask: &[u8]) -> Result<AdminCommand, AdminError> {
    Ok(remove_domain_control_points(&ControlPoints::from_slice(
        mask,
    )?))
}

// =============================================================================
// Queries
// =============================================================================

pub fn query_domain_info() -> AdminCommand {
    AdminCommand::empty(CommandId::QueryDomainInfo)
}

pub fn query_domain_attributes() -> AdminCommand {
    AdminCommand::empty(CommandId::QueryDomainAttributes)
}

pub fn query_domain_admins() -> AdminCommand {
    AdminCommand::empty(CommandId::QueryDomainAdmins)
}

pub fn query_domain_admin(ski: &Ski) -> AdminCommand {
    AdminCommand::new(CommandId::QueryDomainAdmin, ski.as_bytes().to_vec())
}

pub fn query_domain_control_points() -> AdminCommand {
    AdminCommand::empty(CommandId::QueryDomainControlPoints)
}

/// Read one certificate of the device's outbound-authentication chain.
pub fn query_device_certificate(index: u32) -> AdminCommand {
    AdminCommand::new(
        CommandId::QueryDeviceCertificate,
        index.to_be_bytes().to_vec(),
    )
}

/// Read the length of the device certificate chain.
pub fn query_device_certificate_count() -> AdminCommand {
    AdminCommand::empty(CommandId::QueryDeviceCertificate)
}

fn check_length(field: &'static str, expected: usize, actual: &[u8]) -> Result<(), AdminError> {
    if actual.len() != expected {
        return Err(AdminError::InvalidLength {
            field,
            expected,
            actual: actual.len(),
        });
    }
    Ok(())
}
