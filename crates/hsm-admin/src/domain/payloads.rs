//! # Command Payloads
//!
//! Encoders for structured command inputs and decoders for query outputs.
//! Builders use the encoders; the service uses the decoders once the
//! response parser has accepted a block.

use super::codec::{put_prefixed, Reader};
use super::entities::Ski;
use super::errors::AdminError;
use super::value_objects::{
    AdministratorEntry, ControlPoints, DomainAttributes, DomainInfo, MasterKeyRegister,
    RegisterStatus, VerificationPattern,
};

/// Encoded size of a full attribute set: four (tag, value) pairs.
pub const ATTRIBUTES_PAYLOAD_LENGTH: usize = 32;

/// Size of a verification pattern in domain info output.
pub const VERIFICATION_PATTERN_LENGTH: usize = 32;

/// Size of the QueryDomainInfo output.
pub const DOMAIN_INFO_LENGTH: usize = 4 + 2 * (4 + VERIFICATION_PATTERN_LENGTH);

/// Attribute tags, in their fixed wire order.
pub mod attribute_tag {
    pub const SIGNATURE_THRESHOLD: u32 = 1;
    pub const REVOCATION_SIGNATURE_THRESHOLD: u32 = 2;
    pub const PERMISSIONS: u32 = 3;
    pub const OPERATIONAL_MODE: u32 = 4;
}

// =============================================================================
// Attributes
// =============================================================================

/// Tag/value encoding, tags 1 to 4 in order.
pub fn encode_attributes(attributes: &DomainAttributes) -> Vec<u8> {
    let pairs = [
        (
            attribute_tag::SIGNATURE_THRESHOLD,
            attributes.signature_threshold,
        ),
        (
            attribute_tag::REVOCATION_SIGNATURE_THRESHOLD,
            attributes.revocation_signature_threshold,
        ),
        (attribute_tag::PERMISSIONS, attributes.permissions),
        (attribute_tag::OPERATIONAL_MODE, attributes.operational_mode),
    ];
    let mut out = Vec::with_capacity(ATTRIBUTES_PAYLOAD_LENGTH);
    for (tag, value) in pairs {
        out.extend_from_slice(&tag.to_be_bytes());
        out.extend_from_slice(&value.to_be_bytes());
    }
    out
}

/// Decode a tag/value attribute sequence.
///
/// Tags 1 to 4 must all be present; other tags are skipped.
pub fn decode_attributes(bytes: &[u8]) -> Result<DomainAttributes, AdminError> {
    if bytes.len() % 8 != 0 {
        return Err(AdminError::format(format!(
            "attribute payload of {} bytes is not a sequence of tag/value pairs",
            bytes.len()
        )));
    }
    let mut found: [Option<u32>; 4] = [None; 4];
    let mut reader = Reader::new(bytes);
    while reader.remaining() > 0 {
        let tag = reader.u32("attribute tag")?;
        let value = reader.u32("attribute value")?;
        if (1..=4).contains(&tag) {
            found[(tag - 1) as usize] = Some(value);
        }
    }
    let required = |tag: u32| {
        found[(tag - 1) as usize]
            .ok_or_else(|| AdminError::format(format!("attribute tag {} missing", tag)))
    };
    Ok(DomainAttributes {
        signature_threshold: required(attribute_tag::SIGNATURE_THRESHOLD)?,
        revocation_signature_threshold: required(attribute_tag::REVOCATION_SIGNATURE_THRESHOLD)?,
        permissions: required(attribute_tag::PERMISSIONS)?,
        operational_mode: required(attribute_tag::OPERATIONAL_MODE)?,
    })
}

// =============================================================================
// Domain info
// =============================================================================

/// Encode domain info output.
pub fn encode_domain_info(info: &DomainInfo) -> Result<Vec<u8>, AdminError> {
    let mut out = Vec::with_capacity(DOMAIN_INFO_LENGTH);
    out.extend_from_slice(&info.domain_index.to_be_bytes());
    for register in [&info.current, &info.pending] {
        let vp = register.verification_pattern.as_bytes();
        let mut fixed = [0u8; VERIFICATION_PATTERN_LENGTH];
        if !vp.is_empty() {
            if vp.len() != VERIFICATION_PATTERN_LENGTH {
                return Err(AdminError::InvalidLength {
                    field: "verification pattern",
                    expected: VERIFICATION_PATTERN_LENGTH,
                    actual: vp.len(),
                });
            }
            fixed.copy_from_slice(vp);
        }
        out.extend_from_slice(&register.status.code().to_be_bytes());
        out.extend_from_slice(&fixed);
    }
    Ok(out)
}

/// Decode domain info output.
pub fn decode_domain_info(bytes: &[u8]) -> Result<DomainInfo, AdminError> {
    if bytes.len() != DOMAIN_INFO_LENGTH {
        return Err(AdminError::format(format!(
            "domain info must be {} bytes, got {}",
            DOMAIN_INFO_LENGTH,
            bytes.len()
        )));
    }
    let mut reader = Reader::new(bytes);
    let domain_index = reader.u32("domain index")?;
    let current = read_register(&mut reader)?;
    let pending = read_register(&mut reader)?;
    if pending.status == RegisterStatus::Valid {
        return Err(AdminError::format("pending register reported as Valid"));
    }
    Ok(DomainInfo {
        domain_index,
        current,
        pending,
    })
}

fn read_register(reader: &mut Reader<'_>) -> Result<MasterKeyRegister, AdminError> {
    let status = RegisterStatus::from_code(reader.u32("register status")?)?;
    let vp = reader.take(VERIFICATION_PATTERN_LENGTH, "verification pattern")?;
    Ok(MasterKeyRegister {
        status,
        verification_pattern: VerificationPattern::new(vp),
    })
}

// =============================================================================
// Administrators
// =============================================================================

/// Encode an administrator SKI list.
pub fn encode_admin_list(skis: &[Ski]) -> Result<Vec<u8>, AdminError> {
    let count =
        u32::try_from(skis.len()).map_err(|_| AdminError::argument("too many administrators"))?;
    let mut out = count.to_be_bytes().to_vec();
    for ski in skis {
        put_prefixed(&mut out, ski.as_bytes())?;
    }
    Ok(out)
}

/// Decode an administrator SKI list.
pub fn decode_admin_list(bytes: &[u8]) -> Result<Vec<Ski>, AdminError> {
    let mut reader = Reader::new(bytes);
    let count = reader.u32("administrator count")?;
    let mut skis = Vec::new();
    for _ in 0..count {
        let ski = reader.prefixed("administrator SKI")?;
        skis.push(Ski::from_bytes(ski).map_err(|_| AdminError::format("empty administrator SKI"))?);
    }
    reader.finish("administrator list")?;
    Ok(skis)
}

/// Encode a single administrator record (name and certificate).
pub fn encode_admin_record(name: &str, certificate: &[u8]) -> Result<Vec<u8>, AdminError> {
    let mut out = Vec::with_capacity(4 + name.len() + certificate.len());
    put_prefixed(&mut out, name.as_bytes())?;
    out.extend_from_slice(certificate);
    Ok(out)
}

/// Decode a single administrator record for `ski`.
pub fn decode_admin_record(ski: &Ski, bytes: &[u8]) -> Result<AdministratorEntry, AdminError> {
    let mut reader = Reader::new(bytes);
    let name = String::from_utf8(reader.prefixed("administrator name")?.to_vec())
        .map_err(|_| AdminError::format("administrator name is not UTF-8"))?;
    let certificate = reader.rest().to_vec();
    Ok(AdministratorEntry {
        ski: ski.clone(),
        name,
        certificate,
    })
}

// =============================================================================
// Small outputs
// =============================================================================

/// Decode a control point query output.
pub fn decode_control_points(bytes: &[u8]) -> Result<ControlPoints, AdminError> {
    ControlPoints::from_slice(bytes).map_err(|_| {
        AdminError::format(format!(
            "control point output must be 16 bytes, got {}",
            bytes.len()
        ))
    })
}

/// Decode a lone big-endian u32 output.
pub fn decode_u32(bytes: &[u8], what: &str) -> Result<u32, AdminError> {
    let mut reader = Reader::new(bytes);
    let value = reader.u32(what)?;
    reader.finish(what)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> DomainInfo {
        DomainInfo {
            domain_index: 9,
            current: MasterKeyRegister {
                status: RegisterStatus::Valid,
                verification_pattern: VerificationPattern::new(vec![0x11; 32]),
            },
            pending: MasterKeyRegister::empty(),
        }
    }

    #[test]
    fn test_attributes_exact_bytes() {
        let attributes = DomainAttributes {
            signature_threshold: 2,
            revocation_signature_threshold: 3,
            permissions: 0x10,
            operational_mode: 1,
        };
        let encoded = encode_attributes(&attributes);
        assert_eq!(
            hex::encode(&encoded),
            "0000000100000002000000020000000300000003000000100000000400000001"
        );
        assert_eq!(decode_attributes(&encoded).unwrap(), attributes);
    }

    #[test]
    fn test_attributes_tolerate_unknown_tags_and_order() {
        let mut bytes = Vec::new();
        for (tag, value) in [(4u32, 1u32), (9, 77), (3, 0x10), (2, 3), (1, 2)] {
            bytes.extend_from_slice(&tag.to_be_bytes());
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        let attributes = decode_attributes(&bytes).unwrap();
        assert_eq!(attributes.signature_threshold, 2);
        assert_eq!(attributes.operational_mode, 1);
    }

    #[test]
    fn test_attributes_missing_tag() {
        let encoded = encode_attributes(&DomainAttributes::default());
        assert!(matches!(
            decode_attributes(&encoded[..24]),
            Err(AdminError::Format { .. })
        ));
        assert!(decode_attributes(&encoded[..7]).is_err());
    }

    #[test]
    fn test_domain_info_layout() {
        let encoded = encode_domain_info(&sample_info()).unwrap();
        assert_eq!(encoded.len(), DOMAIN_INFO_LENGTH);
        assert_eq!(&encoded[4..8], &[0, 0, 0, 1]);

        let decoded = decode_domain_info(&encoded).unwrap();
        assert_eq!(decoded.current, sample_info().current);
        assert_eq!(decoded.pending.status, RegisterStatus::Empty);
        assert_eq!(decoded.pending.verification_pattern.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_domain_info_rejects_bad_shapes() {
        let mut encoded = encode_domain_info(&sample_info()).unwrap();
        assert!(decode_domain_info(&encoded[..75]).is_err());

        // pending status = Valid
        encoded[40..44].copy_from_slice(&1u32.to_be_bytes());
        assert!(matches!(
            decode_domain_info(&encoded),
            Err(AdminError::Format { .. })
        ));
    }

    #[test]
    fn test_admin_list_and_record() {
        let skis = vec![
            Ski::from_bytes(vec![1; 20]).unwrap(),
            Ski::from_bytes(vec![2; 32]).unwrap(),
        ];
        let encoded = encode_admin_list(&skis).unwrap();
        assert_eq!(decode_admin_list(&encoded).unwrap(), skis);
        assert!(decode_admin_list(&encoded[..encoded.len() - 1]).is_err());

        let record = encode_admin_record("alice", b"CERT").unwrap();
        let entry = decode_admin_record(&skis[0], &record).unwrap();
        assert_eq!(entry.name, "alice");
        assert_eq!(entry.certificate, b"CERT");
    }

    #[test]
    fn test_small_outputs() {
        assert!(decode_control_points(&[0u8; 16]).is_ok());
        assert!(matches!(
            decode_control_points(&[0u8; 8]),
            Err(AdminError::Format { .. })
        ));
        assert_eq!(decode_u32(&[0, 0, 0, 3], "count").unwrap(), 3);
        assert!(decode_u32(&[0, 0, 3], "count").is_err());
    }
}
