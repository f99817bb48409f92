use oktaflow_core::OktaError;
use thiserror::Error;

/// Node-level error categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error(transparent)]
    Okta(#[from] OktaError),

    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("operation '{operation}' is not supported for resource '{resource}'")]
    UnsupportedOperation { resource: String, operation: String },
}

impl NodeError {
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Normalized Okta error, when the failure came from the API.
    pub fn okta(&self) -> Option<&OktaError> {
        match self {
            Self::Okta(error) => Some(error),
            _ => None,
        }
    }
}
