//! # Admin Errors
//!
//! Error types for the administrative command protocol.
//!
//! ## Design Principles
//!
//! - Each variant maps to one failure class an operator must tell apart
//! - HSM rejections carry the raw return/reason codes verbatim
//! - Nothing is retried at this layer; every error reaches the caller

use super::command::CommandId;
use super::entities::StatusCode;
use thiserror::Error;

/// Errors raised by the administrative protocol core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminError {
    /// A binary admin block or envelope is malformed.
    #[error("Malformed admin block: {reason}")]
    Format { reason: String },

    /// Caller-supplied argument has the wrong shape.
    #[error("Invalid argument: {reason}")]
    Argument { reason: String },

    /// Fixed-size argument has the wrong length.
    #[error("Invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A quorum participant could not sign; the command was not sent.
    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),

    /// Malformed hex or response envelope.
    #[error("Decode error: {reason}")]
    Decode { reason: String },

    /// The HSM executed nothing and returned a non-zero status.
    #[error("{command} rejected by HSM: {status}")]
    CommandRejected {
        command: CommandId,
        status: StatusCode,
    },

    /// A lifecycle precondition does not hold.
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    /// Passed through from the transport collaborator.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl AdminError {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        AdminError::Format {
            reason: reason.into(),
        }
    }

    pub(crate) fn argument(reason: impl Into<String>) -> Self {
        AdminError::Argument {
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        AdminError::Decode {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        AdminError::InvalidState {
            reason: reason.into(),
        }
    }

    /// Raw HSM status, if this is an HSM rejection.
    pub fn hsm_status(&self) -> Option<StatusCode> {
        match self {
            AdminError::CommandRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error from a signature provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// Password or token was not accepted.
    #[error("credential rejected for signature key {key}")]
    InvalidCredential { key: String },

    /// The key could not be located or loaded.
    #[error("signature key {key} unavailable: {reason}")]
    KeyUnavailable { key: String, reason: String },

    /// The key does not belong to the administrator named by the SKI.
    #[error("signature key {key} does not match SKI {expected_ski}")]
    SkiMismatch { key: String, expected_ski: String },

    /// Remote signing service failure.
    #[error("signing service error for key {key}: {reason}")]
    Service { key: String, reason: String },

    /// The signing primitive failed.
    #[error("signing with key {key} failed: {reason}")]
    Failed { key: String, reason: String },
}

/// Error from the HSM transport collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint answered with a non-2xx status.
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint could not be reached.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The endpoint answered with something other than the expected body.
    #[error("malformed transport response: {0}")]
    MalformedResponse(String),
}
