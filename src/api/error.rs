use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
pub const NOT_FOUND: &str = "NOT_FOUND";

const DEFAULT_MESSAGE: &str = "An error occurred";

/// Uniform error shape for every remote operation.
///
/// Transport failures are normalized to `NETWORK_ERROR`; server-reported
/// errors keep whatever code the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ApiError {
    #[serde(default = "default_code")]
    pub code: String,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

fn default_code() -> String {
    UNKNOWN_ERROR.to_string()
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            request_id: None,
            details: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NETWORK_ERROR, message)
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_ERROR, DEFAULT_MESSAGE)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, message)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn is_network(&self) -> bool {
        self.code == NETWORK_ERROR
    }

    /// True for an explicit `NOT_FOUND` code or any message mentioning "not found".
    pub fn is_not_found(&self) -> bool {
        self.code == NOT_FOUND || self.message.to_lowercase().contains("not found")
    }
}

/// Error body as sent by the scoring service: `{"error": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ApiError>,
}

pub type ApiResult<T> = Result<T, ApiError>;
