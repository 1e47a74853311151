//! # Admin Block Codec
//!
//! Exact-byte encoding of admin blocks, request envelopes and responses.
//! All integers are big-endian.
//!
//! ```text
//! AdminBlock  = command_id u32 | domain_id u32 | module_id u32 |
//!               transaction_counter u64 | payload_len u32 | payload
//! Request     = version u8 | kind u8 | crypto_module_index u32 |
//!               domain_index u32 | block_len u32 | AdminBlock |
//!               [kind = signed] count u32 | { ski_len u32 | ski |
//!                                             sig_len u32 | sig }*
//! Response    = return_code u32 | reason_code u32 | AdminBlock
//! ```

use super::command::CommandId;
use super::entities::{
    AdminBlock, AdminRequest, AdminResponse, DomainId, ModuleId, QuorumAuthorization,
    QuorumSignature, Ski, StatusCode, TransactionCounter,
};
use super::errors::AdminError;

/// Size of the fixed admin block header.
pub const BLOCK_HEADER_LENGTH: usize = 24;

/// Request envelope version.
pub const REQUEST_VERSION: u8 = 1;

const KIND_QUERY: u8 = 0;
const KIND_SIGNED: u8 = 1;

// =============================================================================
// Reader
// =============================================================================

/// Big-endian cursor that reports truncation as `FormatError`.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], AdminError> {
        if self.remaining() < len {
            return Err(AdminError::format(format!(
                "truncated {}: need {} bytes, {} remain",
                what,
                len,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self, what: &str) -> Result<u8, AdminError> {
        Ok(self.take(1, what)?[0])
    }

    pub(crate) fn u32(&mut self, what: &str) -> Result<u32, AdminError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub(crate) fn u64(&mut self, what: &str) -> Result<u64, AdminError> {
        let bytes = self.take(8, what)?;
        let mut array = [0u8; 8];
        array.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(array))
    }

    /// u32 length prefix followed by that many bytes.
    pub(crate) fn prefixed(&mut self, what: &str) -> Result<&'a [u8], AdminError> {
        let len = self.u32(what)? as usize;
        self.take(len, what)
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    pub(crate) fn finish(&self, what: &str) -> Result<(), AdminError> {
        if self.remaining() != 0 {
            return Err(AdminError::format(format!(
                "{} trailing bytes after {}",
                self.remaining(),
                what
            )));
        }
        Ok(())
    }
}

pub(crate) fn put_prefixed(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), AdminError> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| AdminError::argument(format!("field of {} bytes is too long", bytes.len())))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

// =============================================================================
// Admin block
// =============================================================================

/// Encode an admin block.
pub fn encode_block(block: &AdminBlock) -> Result<Vec<u8>, AdminError> {
    let mut out = Vec::with_capacity(BLOCK_HEADER_LENGTH + block.payload.len());
    out.extend_from_slice(&block.command_id.code().to_be_bytes());
    out.extend_from_slice(&block.domain_id.to_wire().to_be_bytes());
    out.extend_from_slice(&block.module_id.0.to_be_bytes());
    out.extend_from_slice(&block.transaction_counter.0.to_be_bytes());
    put_prefixed(&mut out, &block.payload)?;
    Ok(out)
}

/// Decode an admin block occupying the whole buffer.
///
/// # Errors
///
/// `AdminError::Format` if the buffer is shorter than the header, the
/// payload length disagrees with the remaining bytes, or the command id is
/// unknown.
pub fn decode_block(bytes: &[u8]) -> Result<AdminBlock, AdminError> {
    if bytes.len() < BLOCK_HEADER_LENGTH {
        return Err(AdminError::format(format!(
            "admin block of {} bytes is shorter than the {}-byte header",
            bytes.len(),
            BLOCK_HEADER_LENGTH
        )));
    }
    let mut reader = Reader::new(bytes);
    let command_id = CommandId::from_code(reader.u32("command id")?)?;
    let domain_id = DomainId::from_wire(reader.u32("domain id")?);
    let module_id = ModuleId(reader.u32("module id")?);
    let transaction_counter = TransactionCounter(reader.u64("transaction counter")?);
    let payload_len = reader.u32("payload length")? as usize;
    if payload_len != reader.remaining() {
        return Err(AdminError::format(format!(
            "payload length {} does not match {} remaining bytes",
            payload_len,
            reader.remaining()
        )));
    }
    let payload = reader.rest().to_vec();

    Ok(AdminBlock {
        command_id,
        domain_id,
        module_id,
        transaction_counter,
        payload,
    })
}

// =============================================================================
// Request envelope
// =============================================================================

/// Encode a request envelope.
pub fn encode_request(request: &AdminRequest) -> Result<Vec<u8>, AdminError> {
    let block = encode_block(&request.block)?;
    let mut out = Vec::with_capacity(14 + block.len());
    out.push(REQUEST_VERSION);
    out.push(if request.authorization.is_some() {
        KIND_SIGNED
    } else {
        KIND_QUERY
    });
    out.extend_from_slice(&request.crypto_module_index.to_be_bytes());
    out.extend_from_slice(&request.domain_index.to_be_bytes());
    put_prefixed(&mut out, &block)?;

    if let Some(authorization) = &request.authorization {
        let count = u32::try_from(authorization.len())
            .map_err(|_| AdminError::argument("too many signatures"))?;
        out.extend_from_slice(&count.to_be_bytes());
        for entry in &authorization.signatures {
            put_prefixed(&mut out, entry.ski.as_bytes())?;
            put_prefixed(&mut out, &entry.signature)?;
        }
    }
    Ok(out)
}

/// Decode a request envelope.
pub fn decode_request(bytes: &[u8]) -> Result<AdminRequest, AdminError> {
    let mut reader = Reader::new(bytes);
    let version = reader.u8("version")?;
    if version != REQUEST_VERSION {
        return Err(AdminError::format(format!(
            "unsupported request version {}",
            version
        )));
    }
    let kind = reader.u8("request kind")?;
    let crypto_module_index = reader.u32("crypto module index")?;
    let domain_index = reader.u32("domain index")?;
    let block = decode_block(reader.prefixed("admin block")?)?;

    let authorization = match kind {
        KIND_QUERY => None,
        KIND_SIGNED => {
            let count = reader.u32("signature count")?;
            let mut signatures = Vec::new();
            for _ in 0..count {
                let ski = Ski::from_bytes(reader.prefixed("signer SKI")?.to_vec())
                    .map_err(|_| AdminError::format("empty signer SKI"))?;
                let signature = reader.prefixed("signature")?.to_vec();
                signatures.push(QuorumSignature { ski, signature });
            }
            Some(QuorumAuthorization { signatures })
        }
        other => {
            return Err(AdminError::format(format!(
                "unknown request kind {}",
                other
            )))
        }
    };
    reader.finish("request envelope")?;

    Ok(AdminRequest {
        crypto_module_index,
        domain_index,
        block,
        authorization,
    })
}

// =============================================================================
// Response
// =============================================================================

/// Encode a response.
pub fn encode_response(response: &AdminResponse) -> Result<Vec<u8>, AdminError> {
    let block = encode_block(&response.block)?;
    let mut out = Vec::with_capacity(8 + block.len());
    out.extend_from_slice(&response.status.return_code.to_be_bytes());
    out.extend_from_slice(&response.status.reason_code.to_be_bytes());
    out.extend_from_slice(&block);
    Ok(out)
}

/// Decode a response.
pub fn decode_response(bytes: &[u8]) -> Result<AdminResponse, AdminError> {
    let mut reader = Reader::new(bytes);
    let return_code = reader.u32("return code")?;
    let reason_code = reader.u32("reason code")?;
    let block = decode_block(reader.rest())?;
    Ok(AdminResponse {
        status: StatusCode::new(return_code, reason_code),
        block,
    })
}

// =============================================================================
// Hex
// =============================================================================

/// Lowercase hex, two digits per byte.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode hex, rejecting odd length and non-hex digits.
pub fn from_hex(value: &str) -> Result<Vec<u8>, AdminError> {
    hex::decode(value.trim()).map_err(|e| AdminError::decode(format!("invalid hex: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AdminCommand;
    use proptest::prelude::*;

    fn sample_block() -> AdminBlock {
        AdminCommand::new(CommandId::FinalizeWrappingKey, vec![0xAB; 32]).address(
            DomainId::Index(5),
            ModuleId(2),
            TransactionCounter(99),
        )
    }

    #[test]
    fn test_block_layout() {
        let block = AdminCommand::new(CommandId::GenerateWrappingKey, vec![0xEE]).address(
            DomainId::Index(1),
            ModuleId(2),
            TransactionCounter(3),
        );
        let bytes = encode_block(&block).unwrap();
        assert_eq!(
            bytes,
            vec![
                0, 0, 0, 10, // command id
                0, 0, 0, 1, // domain
                0, 0, 0, 2, // module
                0, 0, 0, 0, 0, 0, 0, 3, // counter
                0, 0, 0, 1, // payload length
                0xEE,
            ]
        );
    }

    #[test]
    fn test_short_block_rejected() {
        let bytes = encode_block(&sample_block()).unwrap();
        let result = decode_block(&bytes[..BLOCK_HEADER_LENGTH - 1]);
        assert!(matches!(result, Err(AdminError::Format { .. })));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut bytes = encode_block(&sample_block()).unwrap();
        bytes.push(0);
        assert!(matches!(decode_block(&bytes), Err(AdminError::Format { .. })));

        let bytes = encode_block(&sample_block()).unwrap();
        assert!(matches!(
            decode_block(&bytes[..bytes.len() - 1]),
            Err(AdminError::Format { .. })
        ));
    }

    #[test]
    fn test_unknown_command_rejected() {
        let mut bytes = encode_block(&sample_block()).unwrap();
        bytes[..4].copy_from_slice(&0x7777u32.to_be_bytes());
        assert!(matches!(decode_block(&bytes), Err(AdminError::Format { .. })));
    }

    #[test]
    fn test_query_request_has_no_signature_section() {
        let request = AdminRequest {
            crypto_module_index: 1,
            domain_index: 2,
            block: AdminCommand::empty(CommandId::QueryDomainInfo).address(
                DomainId::Control,
                ModuleId::UNSET,
                TransactionCounter::UNSET,
            ),
            authorization: None,
        };
        let bytes = encode_request(&request).unwrap();
        let block_len = BLOCK_HEADER_LENGTH;
        assert_eq!(bytes.len(), 1 + 1 + 4 + 4 + 4 + block_len);
        assert_eq!(bytes[1], KIND_QUERY);
        assert_eq!(decode_request(&bytes).unwrap(), request);
    }

    #[test]
    fn test_signed_request_roundtrip_preserves_order() {
        let authorization = QuorumAuthorization {
            signatures: vec![
                QuorumSignature {
                    ski: Ski::from_bytes(vec![2; 20]).unwrap(),
                    signature: vec![0xB2; 64],
                },
                QuorumSignature {
                    ski: Ski::from_bytes(vec![1; 20]).unwrap(),
                    signature: vec![0xB1; 64],
                },
            ],
        };
        let request = AdminRequest {
            crypto_module_index: 0,
            domain_index: 5,
            block: sample_block(),
            authorization: Some(authorization.clone()),
        };
        let decoded = decode_request(&encode_request(&request).unwrap()).unwrap();
        assert_eq!(decoded.authorization, Some(authorization));
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_response_roundtrip() {
        let response = AdminResponse {
            status: StatusCode::new(0x0C, 0x44),
            block: sample_block(),
        };
        let bytes = encode_response(&response).unwrap();
        assert_eq!(&bytes[..8], &[0, 0, 0, 0x0C, 0, 0, 0, 0x44]);
        assert_eq!(decode_response(&bytes).unwrap(), response);
    }

    #[test]
    fn test_hex_errors() {
        assert_eq!(from_hex("00ff").unwrap(), vec![0x00, 0xFF]);
        assert!(matches!(from_hex("abc"), Err(AdminError::Decode { .. })));
        assert!(matches!(from_hex("zz"), Err(AdminError::Decode { .. })));
        assert_eq!(to_hex(&[0x0A, 0xB0]), "0ab0");
    }

    fn arb_block() -> impl Strategy<Value = AdminBlock> {
        (
            proptest::sample::select(CommandId::ALL.to_vec()),
            any::<u32>(),
            any::<u32>(),
            any::<u64>(),
            proptest::collection::vec(any::<u8>(), 0..256),
        )
            .prop_map(|(command_id, domain, module, counter, payload)| AdminBlock {
                command_id,
                domain_id: DomainId::from_wire(domain),
                module_id: ModuleId(module),
                transaction_counter: TransactionCounter(counter),
                payload,
            })
    }

    proptest! {
        #[test]
        fn prop_block_roundtrip(block in arb_block()) {
            let bytes = encode_block(&block).unwrap();
            prop_assert_eq!(bytes.len(), BLOCK_HEADER_LENGTH + block.payload.len());
            prop_assert_eq!(decode_block(&bytes).unwrap(), block);
        }

        #[test]
        fn prop_truncation_never_panics(block in arb_block(), cut in 0usize..300) {
            let bytes = encode_block(&block).unwrap();
            let cut = cut.min(bytes.len());
            if cut < bytes.len() {
                prop_assert!(decode_block(&bytes[..cut]).is_err());
            }
        }
    }
}
