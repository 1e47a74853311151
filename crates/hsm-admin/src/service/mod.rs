//! # Domain Admin Service
//!
//! The application service implementing [`DomainAdminApi`].
//!
//! ## Architecture
//!
//! Every operation is one pass of:
//!
//! 1. build the command (pure)
//! 2. assemble it (query path or quorum-signed path)
//! 3. submit through the transport
//! 4. parse the response and interpret the output
//!
//! Key register operations read the domain's current state first and never
//! cache it. The service holds no mutable state of its own.


use crate::adapters::RequestBody;
use crate::assembler::RequestAssembler;
use crate::domain::builders;
use crate::domain::entities::{AdminCommand, DomainEntry, SignatureKeyReference, Ski};
use crate::domain::errors::AdminError;
use crate::domain::lifecycle::{pending_pattern, plan_random_key};
use crate::domain::payloads::{
    decode_admin_list, decode_admin_record, decode_attributes, decode_control_points,
    decode_domain_info, decode_u32,
};
use crate::domain::value_objects::{
    AdminSummary, AdministratorEntry, ControlPoints, DomainAttributes, DomainInfo, HsmInfo,
    LoadedKey, VerificationPattern,
};
use crate::ports::inbound::DomainAdminApi;
use crate::ports::outbound::{
    CommandDigest, DomainDirectory, HsmTransport, SignatureProvider, TransactionCounterSource,
};
use crate::response::parse_response;
use tracing::{debug, info, warn};

/// The Domain Admin Service.
pub struct DomainAdminService<T, D, S, C, H>
where
    T: HsmTransport,
    D: DomainDirectory,
    S: SignatureProvider,
    C: TransactionCounterSource,
    H: CommandDigest,
{
    /// Delivery of requests to the HSM.
    pub(crate) transport: T,
    /// Domain listing for instance-wide queries.
    pub(crate) directory: D,
    /// Produces quorum signatures.
    pub(crate) signer: S,
    /// Anti-replay counters.
    pub(crate) counters: C,
    /// Digest covered by signatures.
    pub(crate) digest: H,
}

/// Dependencies for DomainAdminService
pub struct DomainAdminDependencies<T, D, S, C, H> {
    pub transport: T,
    pub directory: D,
    pub signer: S,
    pub counters: C,
    pub digest: H,
}

impl<T, D, S, C, H> DomainAdminService<T, D, S, C, H>
where
    T: HsmTransport,
    D: DomainDirectory,
    S: SignatureProvider,
    C: TransactionCounterSource,
    H: CommandDigest,
{
    pub fn new(deps: DomainAdminDependencies<T, D, S, C, H>) -> Self {
        Self {
            transport: deps.transport,
            directory: deps.directory,
            signer: deps.signer,
            counters: deps.counters,
            digest: deps.digest,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn assembler(&self) -> RequestAssembler<'_, S, C, H> {
        RequestAssembler::new(&self.signer, &self.counters, &self.digest)
    }

    /// Assemble and sign `command` for `entry` without submitting it.
    ///
    /// Returns the `{"request": "<hex>"}` body a caller can deliver itself.
    pub fn prepare_signed(
        &self,
        entry: &DomainEntry,
        command: AdminCommand,
        signers: &[SignatureKeyReference],
    ) -> Result<String, AdminError> {
        let request = self.assembler().assemble_signed(entry, command, signers)?;
        RequestBody::new(request).to_json()
    }

    fn send(&self, entry: &DomainEntry, request_hex: String) -> Result<String, AdminError> {
        let body = RequestBody::new(request_hex).to_json()?;
        Ok(self.transport.submit(&entry.hsm_id, &body)?)
    }

    /// Run a query and return its output.
    fn run_query(&self, entry: &DomainEntry, command: AdminCommand) -> Result<Vec<u8>, AdminError> {
        let command_id = command.command_id;
        let request = self.assembler().assemble_query(entry, command)?;
        let response = self.send(entry, request)?;
        Ok(parse_response(&response, command_id, entry)?.payload)
    }

    /// Run a signed command and return its output.
    fn run_signed(
        &self,
        entry: &DomainEntry,
        command: AdminCommand,
        signers: &[SignatureKeyReference],
    ) -> Result<Vec<u8>, AdminError> {
        let command_id = command.command_id;
        let request = self.assembler().assemble_signed(entry, command, signers)?;
        if command_id.is_irreversible() {
            warn!(hsm_id = %entry.hsm_id, domain = entry.domain_index, command = %command_id, "Submitting irreversible command");
        }
        let response = self.send(entry, request)?;
        let block = parse_response(&response, command_id, entry)?;
        info!(
            hsm_id = %entry.hsm_id,
            domain = entry.domain_index,
            command = %command_id,
            counter = block.transaction_counter.0,
            "Command accepted by HSM"
        );
        Ok(block.payload)
    }

    fn summarize(&self, entry: &DomainEntry) -> Result<HsmInfo, AdminError> {
        let attributes = self.query_domain_attributes(entry)?;
        let admins = self
            .query_domain_admins(entry)?
            .iter()
            .map(|ski| {
                self.query_domain_admin(entry, ski).map(|admin| AdminSummary {
                    name: admin.name,
                    ski: ski.to_hex(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let info = self.query_domain_info(entry)?;

        Ok(HsmInfo {
            hsm_id: entry.hsm_id.clone(),
            location: entry.location.clone(),
            hsm_type: entry.hsm_type.clone(),
            signature_threshold: attributes.signature_threshold,
            revocation_threshold: attributes.revocation_signature_threshold,
            admins,
            pending_key_status: info.pending.status.label().to_string(),
            pending_key_vp: info.pending.verification_pattern.to_hex(),
            current_key_status: info.current.status.label().to_string(),
            current_key_vp: info.current.verification_pattern.to_hex(),
        })
    }
}

impl<T, D, S, C, H> DomainAdminApi for DomainAdminService<T, D, S, C, H>
where
    T: HsmTransport,
    D: DomainDirectory,
    S: SignatureProvider,
    C: TransactionCounterSource,
    H: CommandDigest,
{
    fn create_random_key(
        &self,
        entry: &DomainEntry,
        signers: &[SignatureKeyReference],
    ) -> Result<LoadedKey, AdminError> {
        let info = self.query_domain_info(entry)?;
        let register = plan_random_key(&info).map_err(|e| {
            warn!(hsm_id = %entry.hsm_id, domain = entry.domain_index, error = %e, "Refusing to load random key");
            e
        })?;

        let output = self.run_signed(entry, builders::generate_wrapping_key(), signers)?;
        if output.is_empty() {
            return Err(AdminError::decode(
                "random key response carries no verification pattern",
            ));
        }
        let verification_pattern = VerificationPattern::new(output);
        info!(
            hsm_id = %entry.hsm_id,
            domain = entry.domain_index,
            register = ?register,
            vp = %verification_pattern.to_hex(),
            "Random wrapping key loaded"
        );
        Ok(LoadedKey {
            register,
            verification_pattern,
        })
    }

    fn finalize_key(
        &self,
        entry: &DomainEntry,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError> {
        let info = self.query_domain_info(entry)?;
        let pattern = pending_pattern(&info)?;
        debug!(hsm_id = %entry.hsm_id, vp = %pattern.to_hex(), "Finalizing pending key");

        self.run_signed(entry, builders::finalize_wrapping_key(pattern)?, signers)?;
        info!(hsm_id = %entry.hsm_id, domain = entry.domain_index, "Pending wrapping key finalized");
        Ok(())
    }

    fn clear_pending_key(
        &self,
        entry: &DomainEntry,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError> {
        self.run_signed(entry, builders::clear_pending_wrapping_key(), signers)?;
        Ok(())
    }

    fn zeroize_domain(
        &self,
        entry: &DomainEntry,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError> {
        self.run_signed(entry, builders::zeroize_domain(), signers)?;
        Ok(())
    }

    fn add_domain_admin(
        &self,
        entry: &DomainEntry,
        certificate: &[u8],
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError> {
        self.run_signed(entry, builders::add_domain_admin(certificate)?, signers)?;
        Ok(())
    }

    fn remove_domain_admin(
        &self,
        entry: &DomainEntry,
        ski_hex: &str,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError> {
        let command = builders::remove_domain_admin_hex(ski_hex)?;
        self.run_signed(entry, command, signers)?;
        Ok(())
    }

    fn set_domain_attributes(
        &self,
        entry: &DomainEntry,
        attributes: &DomainAttributes,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError> {
        self.run_signed(entry, builders::set_domain_attributes(attributes), signers)?;
        Ok(())
    }

    fn add_domain_control_points(
        &self,
        entry: &DomainEntry,
        mask: &ControlPoints,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError> {
        self.run_signed(entry, builders::add_domain_control_points(mask), signers)?;
        Ok(())
    }

    fn remove_domain_control_points(
        &self,
        entry: &DomainEntry,
        mask: &ControlPoints,
        signers: &[SignatureKeyReference],
    ) -> Result<(), AdminError> {
        self.run_signed(entry, builders::remove_domain_control_points(mask), signers)?;
        Ok(())
    }

    fn query_domain_info(&self, entry: &DomainEntry) -> Result<DomainInfo, AdminError> {
        decode_domain_info(&self.run_query(entry, builders::query_domain_info())?)
    }

    fn query_domain_attributes(&self, entry: &DomainEntry) -> Result<DomainAttributes, AdminError> {
        decode_attributes(&self.run_query(entry, builders::query_domain_attributes())?)
    }

    fn query_domain_admins(&self, entry: &DomainEntry) -> Result<Vec<Ski>, AdminError> {
        decode_admin_list(&self.run_query(entry, builders::query_domain_admins())?)
    }

    fn query_domain_admin(
        &self,
        entry: &DomainEntry,
        ski: &Ski,
    ) -> Result<AdministratorEntry, AdminError> {
        decode_admin_record(ski, &self.run_query(entry, builders::query_domain_admin(ski))?)
    }

    fn query_domain_control_points(&self, entry: &DomainEntry) -> Result<ControlPoints, AdminError> {
        decode_control_points(&self.run_query(entry, builders::query_domain_control_points())?)
    }

    fn query_device_certificate(
        &self,
        entry: &DomainEntry,
        index: u32,
    ) -> Result<Vec<u8>, AdminError> {
        self.run_query(entry, builders::query_device_certificate(index))
    }

    fn query_device_certificate_count(&self, entry: &DomainEntry) -> Result<u32, AdminError> {
        decode_u32(
            &self.run_query(entry, builders::query_device_certificate_count())?,
            "certificate count",
        )
    }

    fn query_instance(&self) -> Result<Vec<HsmInfo>, AdminError> {
        let domains = self.directory.list_domains()?;
        debug!(domains = domains.len(), "Querying service instance");
        domains.iter().map(|entry| self.summarize(entry)).collect()
    }
}
