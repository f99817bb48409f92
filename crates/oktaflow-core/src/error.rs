//! Error taxonomy of the transport and the Okta error normalizer.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::http_client::HttpError;

/// Non-2xx response as observed on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ErrorResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body decoded as JSON, if it is JSON at all.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Failure reported by the HTTP capability, before any normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{0}")]
    Connection(HttpError),

    #[error("request failed with status code {}", .0.status_code)]
    Status(ErrorResponse),
}

impl TransportError {
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Connection(_) => None,
            Self::Status(response) => Some(response),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response().map(|response| response.status_code)
    }
}

/// Top-level error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OktaError {
    /// Okta error payload carrying an `errorCode`, with its message normalized.
    #[error("{message}")]
    Api {
        message: String,
        description: Option<String>,
        error_code: String,
        #[source]
        cause: TransportError,
    },

    /// Failure without a structured Okta payload, propagated unchanged.
    #[error(transparent)]
    Transport(TransportError),

    #[error("invalid credential: {0}")]
    Credential(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl OktaError {
    pub fn status_code(&self) -> Option<u16> {
        self.cause().and_then(TransportError::status_code)
    }

    pub fn response(&self) -> Option<&ErrorResponse> {
        self.cause().and_then(TransportError::response)
    }

    pub fn cause(&self) -> Option<&TransportError> {
        match self {
            Self::Api { cause, .. } | Self::Transport(cause) => Some(cause),
            Self::Credential(_) | Self::Decode(_) => None,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Api { description, .. } => description.as_deref(),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Api { error_code, .. } => Some(error_code),
            _ => None,
        }
    }
}

impl From<TransportError> for OktaError {
    fn from(error: TransportError) -> Self {
        normalize(error)
    }
}

/// Maps a transport failure to the uniform error shape.
///
/// Only responses whose JSON body carries a string `errorCode` are rewritten.
/// The message comes from [`known_error_message`] when the code is listed, else
/// from the provider's `errorSummary`. `errorCauses` that are missing, `null` or
/// not an array count as no causes; causes without a string `errorSummary` are
/// skipped. Everything else passes through untouched.
pub fn normalize(error: TransportError) -> OktaError {
    let Some(payload) = error.response().and_then(ErrorResponse::json_body) else {
        return OktaError::Transport(error);
    };
    let Some(error_code) = payload.get("errorCode").and_then(Value::as_str) else {
        return OktaError::Transport(error);
    };

    let message = match known_error_message(error_code) {
        Some(message) => message.to_owned(),
        None => payload
            .get("errorSummary")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_owned),
    };

    let description = payload
        .get("errorCauses")
        .and_then(Value::as_array)
        .map(|causes| {
            causes
                .iter()
                .filter_map(|cause| cause.get("errorSummary").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    OktaError::Api {
        message,
        description: (!description.is_empty()).then_some(description),
        error_code: error_code.to_owned(),
        cause: error,
    }
}

/// Human message for the Okta error codes this adapter recognizes.
pub fn known_error_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "E0000001" => "API validation failed",
        "E0000003" => "Resource not found",
        "E0000004" => "Authentication failed",
        "E0000006" => "Insufficient permissions",
        "E0000007" => "Not found",
        "E0000008" => "Internal error",
        "E0000009" => "Internal error",
        "E0000010" => "Service temporarily unavailable",
        "E0000011" => "Invalid token",
        "E0000014" => "Factor not verified",
        "E0000015" => "Conflict",
        "E0000016" => "Activation failed",
        "E0000017" => "Reset password failed",
        "E0000018" => "Deactivate user failed",
        "E0000019" => "Delete user failed",
        "E0000020" => "User not found",
        "E0000021" => "Bad request",
        "E0000022" => "Operation not allowed",
        "E0000047" => "API call exceeded rate limit",
        _ => return None,
    };
    Some(message)
}
