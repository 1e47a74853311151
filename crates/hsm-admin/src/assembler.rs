//! # Quorum Signer and Request Assembler
//!
//! Turns an unaddressed [`AdminCommand`] into the hex request handed to the
//! transport.
//!
//! ```text
//! query:    command ─▶ address(Control, UNSET, UNSET) ─▶ envelope ─▶ hex
//! signed:   command ─▶ address(domain, module, counter) ─▶ encode
//!                    ─▶ digest ─▶ sign × N ─▶ envelope ─▶ hex
//! ```
//!
//! Signing is all-or-nothing: the first failing participant aborts the
//! command before anything is sent.

use crate::domain::codec::{encode_block, encode_request, to_hex};
use crate::domain::entities::{
    AdminCommand, AdminRequest, DomainEntry, DomainId, ModuleId, QuorumAuthorization,
    QuorumSignature, SignatureKeyReference, TransactionCounter,
};
use crate::domain::errors::AdminError;
use crate::ports::outbound::{CommandDigest, SignatureProvider, TransactionCounterSource};
use tracing::{debug, warn};

/// Collects one signature per participant over a command's digest.
pub struct QuorumSigner<'a, S, H> {
    provider: &'a S,
    digest: &'a H,
}

impl<'a, S, H> QuorumSigner<'a, S, H>
where
    S: SignatureProvider,
    H: CommandDigest,
{
    pub fn new(provider: &'a S, digest: &'a H) -> Self {
        Self { provider, digest }
    }

    /// Sign `command_bytes` with every reference, in order.
    ///
    /// # Errors
    /// * `AdminError::Argument` - `signers` is empty
    /// * `AdminError::Signing` - the first participant that failed
    pub fn sign(
        &self,
        command_bytes: &[u8],
        signers: &[SignatureKeyReference],
    ) -> Result<QuorumAuthorization, AdminError> {
        if signers.is_empty() {
            return Err(AdminError::argument(
                "a signed command needs at least one signature key",
            ));
        }
        let digest = self.digest.digest(command_bytes);

        let mut signatures = Vec::with_capacity(signers.len());
        for reference in signers {
            let signature = self.provider.sign(reference, &digest).map_err(|e| {
                warn!(key = %reference.key, ski = %reference.ski, error = %e, "Quorum signing aborted");
                e
            })?;
            signatures.push(QuorumSignature {
                ski: reference.ski.clone(),
                signature,
            });
        }
        Ok(QuorumAuthorization { signatures })
    }
}

/// Addresses, signs and encodes admin requests.
pub struct RequestAssembler<'a, S, C, H> {
    signer: QuorumSigner<'a, S, H>,
    counters: &'a C,
}

impl<'a, S, C, H> RequestAssembler<'a, S, C, H>
where
    S: SignatureProvider,
    C: TransactionCounterSource,
    H: CommandDigest,
{
    pub fn new(provider: &'a S, counters: &'a C, digest: &'a H) -> Self {
        Self {
            signer: QuorumSigner::new(provider, digest),
            counters,
        }
    }

    /// Query path: control-domain routing, no counter, no signatures.
    ///
    /// The envelope still names the real module and domain so the service
    /// can route the request.
    pub fn assemble_query(
        &self,
        entry: &DomainEntry,
        command: AdminCommand,
    ) -> Result<String, AdminError> {
        if !command.command_id.is_query() {
            return Err(AdminError::argument(format!(
                "{} modifies the domain and must be signed",
                command.command_id
            )));
        }
        let request = AdminRequest {
            crypto_module_index: entry.crypto_module_index,
            domain_index: entry.domain_index,
            block: command.address(
                DomainId::Control,
                ModuleId::UNSET,
                TransactionCounter::UNSET,
            ),
            authorization: None,
        };
        debug!(
            hsm_id = %entry.hsm_id,
            domain = entry.domain_index,
            command = %request.block.command_id,
            "Assembled query"
        );
        Ok(to_hex(&encode_request(&request)?))
    }

    /// Signed path: real addressing, fresh counter, quorum signatures over
    /// the encoded block.
    pub fn assemble_signed(
        &self,
        entry: &DomainEntry,
        command: AdminCommand,
        signers: &[SignatureKeyReference],
    ) -> Result<String, AdminError> {
        if command.command_id.is_query() {
            return Err(AdminError::argument(format!(
                "{} is a query and is never signed",
                command.command_id
            )));
        }
        let domain_id = entry.domain_id()?;
        let module_id = entry.module_id()?;
        let counter = self.counters.next(module_id)?;

        let block = command.address(domain_id, module_id, counter);
        let block_bytes = encode_block(&block)?;
        let authorization = self.signer.sign(&block_bytes, signers)?;

        debug!(
            hsm_id = %entry.hsm_id,
            domain = entry.domain_index,
            command = %block.command_id,
            counter = counter.0,
            signatures = authorization.len(),
            "Assembled signed request"
        );

        let request = AdminRequest {
            crypto_module_index: entry.crypto_module_index,
            domain_index: entry.domain_index,
            block,
            authorization: Some(authorization),
        };
        Ok(to_hex(&encode_request(&request)?))
    }
}
