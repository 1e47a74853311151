//! # Response Parser
//!
//! Validates the HSM's hex response and hands back the output payload only
//! when the HSM reported success.

use crate::domain::codec::{decode_response, from_hex};
use crate::domain::command::CommandId;
use crate::domain::entities::{AdminBlock, DomainEntry, DomainId};
use crate::domain::errors::AdminError;
use tracing::warn;

/// Parse the response to `expected` sent for `entry`.
///
/// # Errors
/// * `AdminError::Decode` - bad hex, or the echoed block does not belong
///   to this request
/// * `AdminError::Format` - the response bytes are malformed
/// * `AdminError::CommandRejected` - non-zero return or reason code; the
///   output is discarded
pub fn parse_response(
    hex_response: &str,
    expected: CommandId,
    entry: &DomainEntry,
) -> Result<AdminBlock, AdminError> {
    let bytes = from_hex(hex_response)?;
    let response = decode_response(&bytes)?;

    if !response.status.is_success() {
        warn!(
            hsm_id = %entry.hsm_id,
            domain = entry.domain_index,
            command = %expected,
            return_code = response.status.return_code,
            reason_code = response.status.reason_code,
            "HSM rejected command"
        );
        return Err(AdminError::CommandRejected {
            command: expected,
            status: response.status,
        });
    }

    let block = response.block;
    if block.command_id != expected {
        return Err(AdminError::decode(format!(
            "response echoes {} but {} was sent",
            block.command_id, expected
        )));
    }
    match block.domain_id {
        DomainId::Control => {}
        DomainId::Index(index) if index == entry.domain_index => {}
        DomainId::Index(index) => {
            return Err(AdminError::decode(format!(
                "response addressed to domain {} but request was for domain {}",
                index, entry.domain_index
            )))
        }
    }
    Ok(block)
}
