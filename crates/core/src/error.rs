//! Failure taxonomy shared by the walker, the pager and the shell
//!
//! Errors here describe *what kind* of failure happened. Message formatting and
//! exit policy belong to the caller.

use serde::Serialize;
use serde_json::Value;

/// Broad failure classes used for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed or decorated base URL, detected before any request
    EndpointInvalid,
    /// Connection, timeout or DNS failure
    Transport,
    /// Non-2xx response, or an error envelope in the body
    RemoteStatus,
    /// Response body that could not be interpreted
    UnexpectedShape,
}

/// Failure of a single fetch-JSON call
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote error [{code}]: {message}")]
    Status { code: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Build a status error with the default message for `code`
    pub fn status(code: u16) -> Self {
        FetchError::Status {
            code,
            message: describe_status(code).to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Transport(_) => FailureKind::Transport,
            FetchError::Status { .. } => FailureKind::RemoteStatus,
            FetchError::Decode(_) => FailureKind::UnexpectedShape,
        }
    }
}

/// Errors raised while discovering the folder hierarchy
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unable to read the service root at {url}: {source}")]
    RootUnavailable { url: String, source: FetchError },
}

impl CatalogError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CatalogError::RootUnavailable { source, .. } => source.kind(),
        }
    }
}

/// Detect the ArcGIS error envelope
///
/// ArcGIS servers frequently answer `200 OK` with a body like
/// `{"error": {"code": 498, "message": "Invalid token."}}`. This returns the
/// equivalent `FetchError::Status` so callers treat it like a non-2xx reply.
pub fn remote_error(value: &Value) -> Option<FetchError> {
    let error = value.get("error")?.as_object()?;

    let code = error
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(500);

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| describe_status(code).to_string());

    Some(FetchError::Status { code, message })
}

/// Human-readable description of an HTTP or ArcGIS status code
///
/// Used for message selection only.
pub fn describe_status(code: u16) -> &'static str {
    match code {
        400 => "Bad request",
        401 => "Authentication required",
        403 => "Access denied",
        404 => "Resource not found",
        498 => "Invalid or expired token",
        499 => "Token required",
        500..=599 => "Server error",
        _ => "Unexpected response status",
    }
}
