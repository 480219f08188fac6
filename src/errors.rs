use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum GatewayError {
    /// The request is malformed or uses an unsupported combination of
    /// roles, modes or fields. Terminal for the current request.
    #[error("{0}")]
    Validation(String),

    /// A user-correctable problem, carrying a usage hint to display.
    #[error("{message}")]
    User { message: String, usage: String },

    /// An external collaborator (storage, raw fetch) failed. Not retried
    /// here; surfaced as an upstream-unavailable condition.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// A programming-contract violation, e.g. an unmapped finish reason.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        GatewayError::Validation(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        GatewayError::Internal(message.into())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
