//! Test doubles for the outbound ports.
//!
//! - [`InMemoryHsm`] simulates the HSM end of the protocol: it decodes
//!   requests, checks routing, anti-replay counters and quorum signatures,
//!   applies register and roster transitions and answers queries.
//! - [`RecordingTransport`] wraps any transport and keeps every decoded
//!   request.
//! - [`KeyRingSigner`] signs with real administrator keys held in memory.
//! - [`StaticSigner`] and [`FixedCounterSource`] are deterministic stand-ins
//!   for assembler tests.

use crate::adapters::{DigestAlgorithm, RequestBody};
use crate::domain::codec::{decode_request, encode_block, encode_response, from_hex, to_hex};
use crate::domain::command::CommandId;
use crate::domain::entities::{
    AdminBlock, AdminRequest, AdminResponse, Credential, DomainEntry, DomainId, ModuleId,
    QuorumAuthorization, SignatureKeyReference, Ski, StatusCode, TransactionCounter,
};
use crate::domain::errors::{AdminError, SigningError, TransportError};
use crate::domain::lifecycle::{required_signatures, AdminRoster, KeyRegisters};
use crate::domain::payloads::{
    decode_attributes, encode_admin_list, encode_admin_record, encode_attributes,
    encode_domain_info,
};
use crate::domain::value_objects::{
    AdministratorEntry, ControlPoints, DomainAttributes, DomainInfo, VerificationPattern,
    CONTROL_POINTS_LENGTH,
};
use crate::ports::outbound::{CommandDigest, HsmTransport, SignatureProvider, TransactionCounterSource};
use admin_keys::{AdminCertificate, AdminPublicKey, AdminSignature, AdminSigningKey};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// Return code of every simulated rejection.
pub const RC_REJECTED: u32 = 0x0000_000C;

/// Reason codes of simulated rejections.
pub mod reason {
    pub const BAD_ROUTING: u32 = 0x0000_0B01;
    pub const REPLAY: u32 = 0x0000_0B02;
    pub const QUORUM: u32 = 0x0000_0B03;
    pub const REGISTER_STATE: u32 = 0x0000_0B04;
    pub const BAD_INPUT: u32 = 0x0000_0B05;
    pub const NOT_FOUND: u32 = 0x0000_0B06;
}

fn rejected(reason: u32) -> StatusCode {
    StatusCode::new(RC_REJECTED, reason)
}

/// Reference for participant `n` with SKI `[n; 32]`.
pub fn signer_ref(n: u8) -> SignatureKeyReference {
    SignatureKeyReference::new(
        format!("admin-{}", n),
        Ski::from_bytes(vec![n; 32]).unwrap_or_else(|_| unreachable!()),
        Credential::Password(format!("pw-{}", n)),
    )
}

// =============================================================================
// In-memory HSM
// =============================================================================

struct SimDomain {
    registers: KeyRegisters,
    roster: AdminRoster,
    public_keys: HashMap<Ski, AdminPublicKey>,
    attributes: DomainAttributes,
    control_points: ControlPoints,
}

impl SimDomain {
    fn new() -> Self {
        Self {
            registers: KeyRegisters::default(),
            roster: AdminRoster::default(),
            public_keys: HashMap::new(),
            attributes: DomainAttributes {
                signature_threshold: 1,
                revocation_signature_threshold: 1,
                permissions: 0,
                operational_mode: 0,
            },
            control_points: ControlPoints::new([0u8; CONTROL_POINTS_LENGTH]),
        }
    }
}

#[derive(Default)]
struct HsmState {
    domains: HashMap<(u32, u32), SimDomain>,
    last_counter: HashMap<ModuleId, u64>,
    device_certificates: Vec<Vec<u8>>,
    key_sequence: u64,
    injected: Option<StatusCode>,
}

type Outcome = Result<Vec<u8>, StatusCode>;

/// Simulated HSM answering the admin protocol.
pub struct InMemoryHsm {
    digest: DigestAlgorithm,
    state: Mutex<HsmState>,
}

impl Default for InMemoryHsm {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHsm {
    pub fn new() -> Self {
        Self::with_digest(DigestAlgorithm::default())
    }

    pub fn with_digest(digest: DigestAlgorithm) -> Self {
        Self {
            digest,
            state: Mutex::new(HsmState::default()),
        }
    }

    /// Add an empty domain for `entry`.
    pub fn with_domain(self, entry: &DomainEntry) -> Self {
        self.state
            .lock()
            .domains
            .insert((entry.crypto_module_index, entry.domain_index), SimDomain::new());
        self
    }

    pub fn with_device_certificates(self, certificates: Vec<Vec<u8>>) -> Self {
        self.state.lock().device_certificates = certificates;
        self
    }

    /// Install administrators directly, bypassing quorum.
    pub fn imprint(&self, entry: &DomainEntry, certificates: &[Vec<u8>], attributes: DomainAttributes) {
        let mut state = self.state.lock();
        if let Some(domain) = state.domains.get_mut(&key(entry)) {
            for certificate in certificates {
                let _ = install_admin(domain, certificate);
            }
            domain.attributes = attributes;
        }
    }

    /// Answer the next request with `status` instead of executing it.
    pub fn reject_next(&self, status: StatusCode) {
        self.state.lock().injected = Some(status);
    }

    /// Replace the pending verification pattern, as if the register changed
    /// underneath the caller.
    pub fn tamper_pending(&self, entry: &DomainEntry, pattern: VerificationPattern) {
        if let Some(domain) = self.state.lock().domains.get_mut(&key(entry)) {
            domain.registers.pending.verification_pattern = pattern;
        }
    }

    pub fn domain_info(&self, entry: &DomainEntry) -> Option<DomainInfo> {
        self.state
            .lock()
            .domains
            .get(&key(entry))
            .map(|d| d.registers.to_info(entry.domain_index))
    }

    pub fn attributes(&self, entry: &DomainEntry) -> Option<DomainAttributes> {
        self.state.lock().domains.get(&key(entry)).map(|d| d.attributes)
    }

    pub fn control_points(&self, entry: &DomainEntry) -> Option<ControlPoints> {
        self.state.lock().domains.get(&key(entry)).map(|d| d.control_points)
    }

    pub fn admins(&self, entry: &DomainEntry) -> Vec<Ski> {
        self.state
            .lock()
            .domains
            .get(&key(entry))
            .map(|d| d.roster.skis())
            .unwrap_or_default()
    }

    fn handle(&self, request: AdminRequest) -> AdminResponse {
        let mut state = self.state.lock();
        let echo = request.block.clone();
        let outcome = match state.injected.take() {
            Some(status) => Err(status),
            None => self.execute(&mut state, &request),
        };
        match outcome {
            Ok(payload) => AdminResponse {
                status: StatusCode::OK,
                block: AdminBlock { payload, ..echo },
            },
            Err(status) => AdminResponse {
                status,
                block: AdminBlock {
                    payload: Vec::new(),
                    ..echo
                },
            },
        }
    }

    fn execute(&self, state: &mut HsmState, request: &AdminRequest) -> Outcome {
        let block = &request.block;
        match &request.authorization {
            None => {
                if !block.command_id.is_query() || block.domain_id != DomainId::Control {
                    return Err(rejected(reason::BAD_ROUTING));
                }
                let domain = state
                    .domains
                    .get(&(request.crypto_module_index, request.domain_index))
                    .ok_or(rejected(reason::NOT_FOUND))?;
                query(domain, &state.device_certificates, request.domain_index, block)
            }
            Some(authorization) => {
                let expected_module = ModuleId(request.crypto_module_index + 1);
                if block.command_id.is_query()
                    || block.domain_id != DomainId::Index(request.domain_index)
                    || block.module_id != expected_module
                {
                    return Err(rejected(reason::BAD_ROUTING));
                }
                let last = state.last_counter.get(&block.module_id).copied().unwrap_or(0);
                if block.transaction_counter.0 <= last {
                    return Err(rejected(reason::REPLAY));
                }
                let block_bytes = encode_block(block).map_err(|_| rejected(reason::BAD_INPUT))?;
                let digest = self.digest.digest(&block_bytes);

                state.key_sequence += 1;
                let sequence = state.key_sequence;
                let domain = state
                    .domains
                    .get_mut(&(request.crypto_module_index, request.domain_index))
                    .ok_or(rejected(reason::NOT_FOUND))?;
                check_quorum(domain, block.command_id, authorization, &digest)?;
                let output = mutate(domain, block, sequence)?;
                state
                    .last_counter
                    .insert(block.module_id, block.transaction_counter.0);
                Ok(output)
            }
        }
    }
}

fn key(entry: &DomainEntry) -> (u32, u32) {
    (entry.crypto_module_index, entry.domain_index)
}

fn install_admin(domain: &mut SimDomain, certificate: &[u8]) -> Result<(), StatusCode> {
    let parsed = AdminCertificate::from_bytes(certificate).map_err(|_| rejected(reason::BAD_INPUT))?;
    let ski = Ski::from_bytes(parsed.ski().to_vec()).map_err(|_| rejected(reason::BAD_INPUT))?;
    domain
        .roster
        .install(AdministratorEntry {
            ski: ski.clone(),
            name: parsed.name().to_string(),
            certificate: certificate.to_vec(),
        })
        .map_err(|_| rejected(reason::BAD_INPUT))?;
    domain.public_keys.insert(ski, *parsed.public_key());
    Ok(())
}

/// Imprint mode: an empty roster accepts admin installation and attribute
/// setting without signatures.
fn check_quorum(
    domain: &SimDomain,
    command: CommandId,
    authorization: &QuorumAuthorization,
    digest: &[u8],
) -> Result<(), StatusCode> {
    if domain.roster.is_empty() {
        return match command {
            CommandId::DomainAdminLogin | CommandId::DomainSetAttributes => Ok(()),
            _ => Err(rejected(reason::QUORUM)),
        };
    }
    let mut valid = HashSet::new();
    for entry in &authorization.signatures {
        let Some(public_key) = domain.public_keys.get(&entry.ski) else {
            continue;
        };
        let Ok(bytes) = <[u8; 64]>::try_from(entry.signature.as_slice()) else {
            continue;
        };
        if public_key
            .verify_digest(digest, &AdminSignature::from_bytes(bytes))
            .is_ok()
        {
            valid.insert(entry.ski.clone());
        }
    }
    let required = required_signatures(command, &domain.attributes).max(1);
    if (valid.len() as u32) < required {
        return Err(rejected(reason::QUORUM));
    }
    Ok(())
}

fn mutate(domain: &mut SimDomain, block: &AdminBlock, sequence: u64) -> Outcome {
    let payload = &block.payload;
    let bad_input = |_| rejected(reason::BAD_INPUT);
    match block.command_id {
        CommandId::DomainAdminLogin => install_admin(domain, payload).map(|_| Vec::new()),
        CommandId::DomainAdminLogout => {
            let ski = Ski::from_bytes(payload.clone()).map_err(bad_input)?;
            domain
                .roster
                .remove(&ski)
                .map_err(|_| rejected(reason::NOT_FOUND))?;
            domain.public_keys.remove(&ski);
            Ok(Vec::new())
        }
        CommandId::DomainSetAttributes => {
            domain.attributes = decode_attributes(payload).map_err(bad_input)?;
            Ok(Vec::new())
        }
        CommandId::GenerateWrappingKey => {
            let mut hasher = Sha256::new();
            hasher.update(b"wrapping-key");
            hasher.update(sequence.to_be_bytes());
            let pattern = VerificationPattern::new(hasher.finalize().to_vec());
            let loaded = domain
                .registers
                .load_random(pattern)
                .map_err(|_| rejected(reason::REGISTER_STATE))?;
            Ok(loaded.verification_pattern.as_bytes().to_vec())
        }
        CommandId::FinalizeWrappingKey => {
            domain
                .registers
                .finalize(&VerificationPattern::new(payload.clone()))
                .map_err(|_| rejected(reason::REGISTER_STATE))?;
            Ok(Vec::new())
        }
        CommandId::ClearPendingWrappingKey => {
            domain.registers.clear_pending();
            Ok(Vec::new())
        }
        CommandId::DomainZeroize => {
            domain.registers.zeroize();
            Ok(Vec::new())
        }
        CommandId::DomainControlPointSet
        | CommandId::DomainControlPointAdd
        | CommandId::DomainControlPointRemove => {
            let mask = ControlPoints::from_slice(payload).map_err(bad_input)?;
            domain.control_points = match block.command_id {
                CommandId::DomainControlPointSet => mask,
                CommandId::DomainControlPointAdd => domain.control_points.union(&mask),
                _ => domain.control_points.without(&mask),
            };
            Ok(Vec::new())
        }
        _ => Err(rejected(reason::BAD_ROUTING)),
    }
}

fn query(
    domain: &SimDomain,
    device_certificates: &[Vec<u8>],
    domain_index: u32,
    block: &AdminBlock,
) -> Outcome {
    let bad_input = |_: AdminError| rejected(reason::BAD_INPUT);
    match block.command_id {
        CommandId::QueryDomainInfo => {
            encode_domain_info(&domain.registers.to_info(domain_index)).map_err(bad_input)
        }
        CommandId::QueryDomainAttributes => Ok(encode_attributes(&domain.attributes)),
        CommandId::QueryDomainAdmins => encode_admin_list(&domain.roster.skis()).map_err(bad_input),
        CommandId::QueryDomainAdmin => {
            let ski = Ski::from_bytes(block.payload.clone()).map_err(bad_input)?;
            let entry = domain.roster.get(&ski).ok_or(rejected(reason::NOT_FOUND))?;
            encode_admin_record(&entry.name, &entry.certificate).map_err(bad_input)
        }
        CommandId::QueryDomainControlPoints => Ok(domain.control_points.as_bytes().to_vec()),
        CommandId::QueryDeviceCertificate => {
            if block.payload.is_empty() {
                return Ok((device_certificates.len() as u32).to_be_bytes().to_vec());
            }
            let index = <[u8; 4]>::try_from(block.payload.as_slice())
                .map(u32::from_be_bytes)
                .map_err(|_| rejected(reason::BAD_INPUT))?;
            device_certificates
                .get(index as usize)
                .cloned()
                .ok_or(rejected(reason::NOT_FOUND))
        }
        _ => Err(rejected(reason::BAD_ROUTING)),
    }
}

fn decode_body(body: &str) -> Result<AdminRequest, TransportError> {
    let body = RequestBody::from_json(body)?;
    let bytes = from_hex(&body.request).map_err(|e| TransportError::Status {
        status: 400,
        body: e.to_string(),
    })?;
    decode_request(&bytes).map_err(|e| TransportError::Status {
        status: 400,
        body: e.to_string(),
    })
}

impl HsmTransport for InMemoryHsm {
    fn submit(&self, _hsm_id: &str, body: &str) -> Result<String, TransportError> {
        let request = decode_body(body)?;
        let response = self.handle(request);
        encode_response(&response)
            .map(|bytes| to_hex(&bytes))
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }
}

// =============================================================================
// Recording transport
// =============================================================================

/// Records every decoded request before delegating.
pub struct RecordingTransport<T> {
    inner: T,
    requests: Mutex<Vec<AdminRequest>>,
    failure: Mutex<Option<TransportError>>,
}

impl<T: HsmTransport> RecordingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            requests: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Fail the next submission with `error` without reaching the inner
    /// transport.
    pub fn fail_next(&self, error: TransportError) {
        *self.failure.lock() = Some(error);
    }

    pub fn requests(&self) -> Vec<AdminRequest> {
        self.requests.lock().clone()
    }

    pub fn commands(&self) -> Vec<CommandId> {
        self.requests.lock().iter().map(|r| r.block.command_id).collect()
    }

    pub fn signed_count(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.authorization.is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: HsmTransport> HsmTransport for RecordingTransport<T> {
    fn submit(&self, hsm_id: &str, body: &str) -> Result<String, TransportError> {
        if let Ok(request) = decode_body(body) {
            self.requests.lock().push(request);
        }
        if let Some(error) = self.failure.lock().take() {
            return Err(error);
        }
        self.inner.submit(hsm_id, body)
    }
}

// =============================================================================
// Signers
// =============================================================================

struct RingEntry {
    name: String,
    key: AdminSigningKey,
    password: String,
}

/// Administrator keys held in memory, signing for real.
pub struct KeyRingSigner {
    entries: Vec<RingEntry>,
    calls: Mutex<usize>,
}

impl KeyRingSigner {
    /// `count` fresh administrators named `admin1..=adminN` with password
    /// `pw-adminN`.
    pub fn generate(count: usize) -> Self {
        let entries = (1..=count)
            .map(|i| RingEntry {
                name: format!("admin{}", i),
                key: AdminSigningKey::generate(),
                password: format!("pw-admin{}", i),
            })
            .collect();
        Self {
            entries,
            calls: Mutex::new(0),
        }
    }

    /// Reference to administrator `index` (zero-based) with the correct
    /// password.
    pub fn reference(&self, index: usize) -> SignatureKeyReference {
        let entry = &self.entries[index];
        SignatureKeyReference::new(
            entry.name.clone(),
            self.ski(index),
            Credential::Password(entry.password.clone()),
        )
    }

    pub fn references(&self, indices: &[usize]) -> Vec<SignatureKeyReference> {
        indices.iter().map(|&i| self.reference(i)).collect()
    }

    pub fn ski(&self, index: usize) -> Ski {
        Ski::from_bytes(self.entries[index].key.ski().to_vec()).unwrap_or_else(|_| unreachable!())
    }

    pub fn certificate(&self, index: usize) -> Vec<u8> {
        let entry = &self.entries[index];
        AdminCertificate::issue(&entry.name, &entry.key)
            .map(|c| c.to_bytes())
            .unwrap_or_default()
    }

    pub fn certificates(&self) -> Vec<Vec<u8>> {
        (0..self.entries.len()).map(|i| self.certificate(i)).collect()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl SignatureProvider for KeyRingSigner {
    fn sign(&self, reference: &SignatureKeyReference, digest: &[u8]) -> Result<Vec<u8>, SigningError> {
        *self.calls.lock() += 1;
        let entry = self
            .entries
            .iter()
            .find(|e| e.key.ski().as_slice() == reference.ski.as_bytes())
            .ok_or_else(|| SigningError::KeyUnavailable {
                key: reference.key.clone(),
                reason: "not in key ring".to_string(),
            })?;
        if reference.credential != Credential::Password(entry.password.clone()) {
            return Err(SigningError::InvalidCredential {
                key: reference.key.clone(),
            });
        }
        entry
            .key
            .sign_digest(digest)
            .map(|s| s.as_bytes().to_vec())
            .map_err(|e| SigningError::Failed {
                key: reference.key.clone(),
                reason: e.to_string(),
            })
    }
}

/// Deterministic fake signatures: SHA-256 of SKI and digest.
#[derive(Default)]
pub struct StaticSigner {
    failing: Option<Ski>,
    digests: Mutex<Vec<Vec<u8>>>,
}

impl StaticSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the participant with `ski` as having a bad credential.
    pub fn failing_for(mut self, ski: Ski) -> Self {
        self.failing = Some(ski);
        self
    }

    pub fn calls(&self) -> usize {
        self.digests.lock().len()
    }

    pub fn digests(&self) -> Vec<Vec<u8>> {
        self.digests.lock().clone()
    }
}

impl SignatureProvider for StaticSigner {
    fn sign(&self, reference: &SignatureKeyReference, digest: &[u8]) -> Result<Vec<u8>, SigningError> {
        self.digests.lock().push(digest.to_vec());
        if self.failing.as_ref() == Some(&reference.ski) {
            return Err(SigningError::InvalidCredential {
                key: reference.key.clone(),
            });
        }
        let mut hasher = Sha256::new();
        hasher.update(reference.ski.as_bytes());
        hasher.update(digest);
        Ok(hasher.finalize().to_vec())
    }
}

// =============================================================================
// Counters
// =============================================================================

/// Counter starting at a fixed value and incrementing by one, shared across
/// modules.
pub struct FixedCounterSource {
    next: Mutex<u64>,
    issued: Mutex<usize>,
}

impl FixedCounterSource {
    pub fn new(start: u64) -> Self {
        Self {
            next: Mutex::new(start),
            issued: Mutex::new(0),
        }
    }

    pub fn issued(&self) -> usize {
        *self.issued.lock()
    }
}

impl TransactionCounterSource for FixedCounterSource {
    fn next(&self, _module: ModuleId) -> Result<TransactionCounter, AdminError> {
        let mut next = self.next.lock();
        let value = *next;
        *next = next
            .checked_add(1)
            .ok_or_else(|| AdminError::invalid_state("test counter exhausted"))?;
        *self.issued.lock() += 1;
        Ok(TransactionCounter(value))
    }
}
