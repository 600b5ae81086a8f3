//! Wire protocol constants and the error envelope
//!
//! Requests are `POST /` with the operation named in the target header;
//! errors are a status code plus a JSON body shaped like a genuine service
//! error, so client SDKs parse injected and real failures identically.

use serde::{Deserialize, Serialize};

/// Header naming the operation, e.g. `MimicDb_20250101.CreateTable`.
pub const TARGET_HEADER: &str = "x-mimic-target";

/// Version prefix of the target header value.
pub const TARGET_PREFIX: &str = "MimicDb_20250101.";

/// Response header carrying the per-request unique id.
pub const REQUEST_ID_HEADER: &str = "x-mimic-request-id";

/// Service namespace used in the `__type` error marker.
pub const SERVICE_MARKER: &str = "com.mimicdb.v1";

/// JSON body of every error response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireErrorBody {
    /// `<service-marker>#<error-code>`
    #[serde(rename = "__type", default)]
    pub type_marker: String,
    /// Human-readable error message
    #[serde(default)]
    pub message: String,
}

/// Build the `__type` marker for an error code.
pub fn error_type(code: &str) -> String {
    format!("{SERVICE_MARKER}#{code}")
}

/// Extract the error code back out of a `__type` marker.
pub fn error_code_of(type_marker: &str) -> &str {
    type_marker
        .split_once('#')
        .map_or(type_marker, |(_, code)| code)
}
