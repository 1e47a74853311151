//! # Inbound Ports (Driving Ports / API)
//!
//! The public administrative API for one HSM domain at a time.

use crate::domain::entities::{DomainEntry, SignatureKeyReference, Ski};
use crate::domain::errors::AdminError;
use crate::domain::value_objects::{
    AdministratorEntry, ControlPoints, DomainAttributes, DomainInfo, HsmInfo, LoadedKey,
};

/// Domain administration API.
///
/// Every mutation takes the quorum participants for that call; nothing is
/// retained between calls. Concurrent mutations against the same domain are
/// not serialized here; callers needing ordering must serialize themselves.
pub trait DomainAdminApi: Send + Sync {
    // =========================================================================
    // Key registers
    // =========================================================================

    /// Load a random wrapping key into the first empty register.
    ///
    /// # Errors
    /// * `AdminError::InvalidState` - both registers hold a key; nothing is
    ///   signed or submitted
    fn create_random_key(
        &self,
        entry: &DomainEntry,
        signers: &[SignatureKeyReference],
    ) -> Result<LoadedKey, AdminError>;

    /// Promote the pending register to current. Irreversible.
    ///
    /// Reads the pending verification pattern with one query and sends it
    /// as the confirmation token.
    fn finalize_key(
        &self,
        entry: &DomainEntry,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError>;

    fn clear_pending_key(
        &self,
        entry: &DomainEntry,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError>;

    /// Erase all key material of the domain. Irreversible.
    fn zeroize_domain(
        &self,
        entry: &DomainEntry,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError>;

    // =========================================================================
    // Administrators and policy
    // =========================================================================

    fn add_domain_admin(
        &self,
        entry: &DomainEntry,
        certificate: &[u8],
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError>;

    /// Remove an administrator by hex SKI. Malformed hex fails before any
    /// signing.
    fn remove_domain_admin(
        &self,
        entry: &DomainEntry,
        ski_hex: &str,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError>;

    fn set_domain_attributes(
        &self,
        entry: &DomainEntry,
        attributes: &DomainAttributes,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError>;

    fn add_domain_control_points(
        &self,
        entry: &DomainEntry,
        mask: &ControlPoints,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError>;

    /// Authorized by the revocation quorum.
    fn remove_domain_control_points(
        &self,
        entry: &DomainEntry,
        mask: &ControlPoints,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError>;

    // =========================================================================
    // Queries (unsigned)
    // =========================================================================

    fn query_domain_info(&self, entry: &DomainEntry) -> Result<DomainInfo, AdminError>;

    fn query_domain_attributes(&self, entry: &DomainEntry)
        -> Result<DomainAttributes, AdminError>;

    fn query_domain_admins(&self, entry: &DomainEntry) -> Result<Vec<Ski>, AdminError>;

    fn query_domain_admin(
        &self,
        entry: &DomainEntry,
        ski: &Ski,
    ) -> Result<AdministratorEntry, AdminError>;

    fn query_domain_control_points(&self, entry: &DomainEntry)
        -> Result<ControlPoints, AdminError>;

    fn query_device_certificate(
        &self,
        entry: &DomainEntry,
        index: u32,
    ) -> Result<Vec<u8>, AdminError>;

    fn query_device_certificate_count(&self, entry: &DomainEntry) -> Result<u32, AdminError>;

    /// Configuration summary of every domain in the service instance.
    fn query_instance(&self) -> Result<Vec<HsmInfo>, AdminError>;
}
