//! JSON bodies exchanged with the HSM endpoint.

use crate::domain::errors::{AdminError, TransportError};
use serde::{Deserialize, Serialize};

/// `{"request": "<hex>"}` POST body carrying an assembled request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBody {
    pub request: String,
}

impl RequestBody {
    pub fn new(request_hex: impl Into<String>) -> Self {
        Self {
            request: request_hex.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, AdminError> {
        serde_json::to_string(self).map_err(|e| AdminError::argument(e.to_string()))
    }

    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        serde_json::from_str(body).map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }
}
