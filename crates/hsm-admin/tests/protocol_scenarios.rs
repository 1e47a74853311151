//! # Protocol Scenarios for HSM Domain Administration
//!
//! End-to-end checks of the wire contract through the public API.
//!
//! ## Test Categories
//!
//! 1. **Exact Encoding** - attribute payload bytes, SKI decoding
//! 2. **Codec Reversibility** - every builder output survives encode/decode
//! 3. **Routing** - query sentinel, misrouting, signed addressing, counter freshness
//! 4. **Rejections** - raw HSM codes, malformed hex, signing aborts

use hsm_admin::domain::builders;
use hsm_admin::domain::codec::{
    decode_block, decode_request, encode_block, encode_request, encode_response, from_hex, to_hex,
};
use hsm_admin::domain::entities::{AdminRequest, AdminResponse, CONTROL_DOMAIN_SENTINEL};
use hsm_admin::test_utils::{
    reason, signer_ref, FixedCounterSource, InMemoryHsm, StaticSigner, RC_REJECTED,
};
use hsm_admin::{
    parse_response, AdminCommand, AdminError, CommandId, ControlPoints, DigestAlgorithm,
    DomainAttributes, DomainEntry, DomainId, HsmTransport, ModuleId, MonotonicCounterSource,
    RequestAssembler, RequestBody, Ski, StatusCode, TransactionCounter, VerificationPattern,
};

// =============================================================================
// TEST HELPERS
// =============================================================================

const TWENTY_BYTE_SKI: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f9001122334";

fn entry(module: u32, domain: u32) -> DomainEntry {
    DomainEntry::new("hsm-test", module, domain)
}

fn decode(hex: &str) -> AdminRequest {
    decode_request(&from_hex(hex).unwrap()).unwrap()
}

fn every_builder_output() -> Vec<AdminCommand> {
    let attributes = DomainAttributes {
        signature_threshold: 2,
        revocation_signature_threshold: 1,
        permissions: 0xFFFF_0000,
        operational_mode: 7,
    };
    let mask = ControlPoints::new([0x5A; 16]);
    let ski = Ski::from_hex(TWENTY_BYTE_SKI).unwrap();
    vec![
        builders::generate_wrapping_key(),
        builders::finalize_wrapping_key(&VerificationPattern::new(vec![0x42; 32])).unwrap(),
        builders::clear_pending_wrapping_key(),
        builders::zeroize_domain(),
        builders::add_domain_admin(b"certificate bytes").unwrap(),
        builders::remove_domain_admin(&ski),
        builders::set_domain_attributes(&attributes),
        builders::add_domain_control_points(&mask),
        builders::remove_domain_control_points(&mask),
        builders::set_domain_control_points(&mask),
        builders::query_domain_info(),
        builders::query_domain_attributes(),
        builders::query_domain_admins(),
        builders::query_domain_admin(&ski),
        builders::query_domain_control_points(),
        builders::query_device_certificate(3),
        builders::query_device_certificate_count(),
    ]
}

// =============================================================================
// 1. EXACT ENCODING
// =============================================================================

#[test]
fn set_domain_attributes_payload_is_tag_value_pairs() {
    let command = builders::set_domain_attributes(&DomainAttributes {
        signature_threshold: 2,
        revocation_signature_threshold: 3,
        permissions: 0x0000_0010,
        operational_mode: 1,
    });

    let expected = concat!(
        "00000001", "00000002", "00000002", "00000003", "00000003", "00000010", "00000004",
        "00000001"
    );
    assert_eq!(command.input.len(), 32);
    assert_eq!(to_hex(&command.input), expected);

    let signer = StaticSigner::new();
    let counters = FixedCounterSource::new(1);
    let assembler = RequestAssembler::new(&signer, &counters, &DigestAlgorithm::Sha512);
    let request = decode(
        &assembler
            .assemble_signed(&entry(0, 1), command, &[signer_ref(1)])
            .unwrap(),
    );
    assert_eq!(to_hex(&request.block.payload), expected);
}

#[test]
fn remove_admin_decodes_twenty_byte_ski() {
    let command = builders::remove_domain_admin_hex(TWENTY_BYTE_SKI).unwrap();
    assert_eq!(command.input.len(), 20);
    assert_eq!(command.input, hex::decode(TWENTY_BYTE_SKI).unwrap());
}

#[test]
fn odd_length_ski_fails_before_any_signing() {
    let signer = StaticSigner::new();
    let result = builders::remove_domain_admin_hex(&TWENTY_BYTE_SKI[..39]);
    assert!(matches!(result, Err(AdminError::Decode { .. })));
    assert_eq!(signer.calls(), 0);
}

#[test]
fn wrong_length_fixed_payloads_are_argument_errors() {
    assert!(matches!(
        builders::set_domain_attributes_payload(&[0u8; 31]),
        Err(AdminError::InvalidLength { .. })
    ));
    assert!(matches!(
        builders::add_domain_control_points_raw(&[0u8; 15]),
        Err(AdminError::InvalidLength { .. })
    ));
    assert!(matches!(
        builders::remove_domain_control_points_raw(&[0u8; 17]),
        Err(AdminError::InvalidLength { .. })
    ));
}

// =============================================================================
// 2. CODEC REVERSIBILITY
// =============================================================================

#[test]
fn every_builder_output_roundtrips() {
    for command in every_builder_output() {
        for (domain, module, counter) in [
            (DomainId::Control, ModuleId::UNSET, TransactionCounter::UNSET),
            (DomainId::Index(12), ModuleId(3), TransactionCounter(u64::MAX)),
        ] {
            let block = command.clone().address(domain, module, counter);
            let bytes = encode_block(&block).unwrap();
            assert_eq!(decode_block(&bytes).unwrap(), block, "{}", command.command_id);
        }
    }
}

// =============================================================================
// 3. ROUTING
// =============================================================================

#[test]
fn queries_always_carry_control_sentinel() {
    let signer = StaticSigner::new();
    let counters = FixedCounterSource::new(1);
    let assembler = RequestAssembler::new(&signer, &counters, &DigestAlgorithm::Sha512);

    let queries = every_builder_output()
        .into_iter()
        .filter(|c| c.command_id.is_query());
    for (i, command) in queries.enumerate() {
        let target = entry(i as u32, 100 + i as u32);
        let hex = assembler.assemble_query(&target, command).unwrap();
        let bytes = from_hex(&hex).unwrap();

        // kind byte says query; nothing follows the block
        assert_eq!(bytes[1], 0);
        let request = decode(&hex);
        assert!(request.authorization.is_none());
        assert_eq!(request.block.domain_id.to_wire(), CONTROL_DOMAIN_SENTINEL);
        assert_eq!(request.domain_index, 100 + i as u32);
    }
    assert_eq!(signer.calls(), 0);
}

#[test]
fn query_addressed_to_real_domain_is_misrouted() {
    let target = entry(0, 3);
    let hsm = InMemoryHsm::new().with_domain(&target);
    let request = AdminRequest {
        crypto_module_index: 0,
        domain_index: 3,
        block: builders::query_domain_info().address(
            DomainId::Index(3),
            ModuleId::UNSET,
            TransactionCounter::UNSET,
        ),
        authorization: None,
    };
    let body = RequestBody::new(to_hex(&encode_request(&request).unwrap()))
        .to_json()
        .unwrap();

    let response = hsm.submit(&target.hsm_id, &body).unwrap();
    let rejected = parse_response(&response, CommandId::QueryDomainInfo, &target).unwrap_err();
    assert_eq!(
        rejected.hsm_status(),
        Some(StatusCode::new(RC_REJECTED, reason::BAD_ROUTING))
    );
}

#[test]
fn signed_commands_get_fresh_counters() {
    let signer = StaticSigner::new();
    let counters = MonotonicCounterSource::new();
    let assembler = RequestAssembler::new(&signer, &counters, &DigestAlgorithm::Sha512);
    let target = entry(4, 2);

    let command = builders::zeroize_domain();
    let first = decode(
        &assembler
            .assemble_signed(&target, command.clone(), &[signer_ref(1)])
            .unwrap(),
    );
    let second = decode(
        &assembler
            .assemble_signed(&target, command, &[signer_ref(1)])
            .unwrap(),
    );
    assert!(second.block.transaction_counter > first.block.transaction_counter);
    assert_eq!(first.block.module_id, ModuleId(5));
    assert_eq!(first.block.domain_id, DomainId::Index(2));
}

#[test]
fn signatures_preserve_signer_order() {
    let signer = StaticSigner::new();
    let counters = FixedCounterSource::new(1);
    let assembler = RequestAssembler::new(&signer, &counters, &DigestAlgorithm::Sha512);
    let signers = [signer_ref(9), signer_ref(3), signer_ref(6)];

    let request = decode(
        &assembler
            .assemble_signed(&entry(0, 0), builders::generate_wrapping_key(), &signers)
            .unwrap(),
    );
    let order: Vec<Ski> = request.authorization.unwrap().signers().cloned().collect();
    let expected: Vec<Ski> = signers.iter().map(|s| s.ski.clone()).collect();
    assert_eq!(order, expected);
}

// =============================================================================
// 4. REJECTIONS
// =============================================================================

#[test]
fn rejection_hides_output_and_keeps_codes() {
    let block = builders::generate_wrapping_key().address(
        DomainId::Index(1),
        ModuleId(1),
        TransactionCounter(77),
    );
    let response = AdminResponse {
        status: StatusCode::new(0x0000_000C, 0x0000_8C0A),
        block: hsm_admin::AdminBlock {
            payload: vec![0xAA; 32],
            ..block
        },
    };
    let hex = to_hex(&encode_response(&response).unwrap());

    match parse_response(&hex, CommandId::GenerateWrappingKey, &entry(0, 1)) {
        Err(AdminError::CommandRejected { command, status }) => {
            assert_eq!(command, CommandId::GenerateWrappingKey);
            assert_eq!(status.return_code, 0x0C);
            assert_eq!(status.reason_code, 0x8C0A);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn malformed_response_hex_is_decode_error() {
    for bad in ["0", "zz", "0g00"] {
        assert!(matches!(
            parse_response(bad, CommandId::QueryDomainInfo, &entry(0, 1)),
            Err(AdminError::Decode { .. })
        ));
    }
}

#[test]
fn failed_signer_aborts_the_whole_command() {
    let signer = StaticSigner::new().failing_for(signer_ref(1).ski);
    let counters = FixedCounterSource::new(1);
    let assembler = RequestAssembler::new(&signer, &counters, &DigestAlgorithm::Sha512);

    let result = assembler.assemble_signed(
        &entry(0, 1),
        builders::zeroize_domain(),
        &[signer_ref(1), signer_ref(2)],
    );
    assert!(matches!(result, Err(AdminError::Signing(_))));
    assert_eq!(signer.calls(), 1);
}
