use hx_core::ValidationError;
use thiserror::Error;

use crate::transport::Method;

/// Harvest API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token or account id was unusable.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(#[from] ValidationError),
    /// A credential could not be encoded as an HTTP header.
    #[error("invalid value for header {header}")]
    InvalidHeader { header: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// The service could not be reached.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with something other than 200 OK.
    #[error("{method} {endpoint} returned status {status}: {body}")]
    Status {
        method: Method,
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    /// A collection page did not contain the named record array.
    #[error("response from {endpoint} has no `{field}` array")]
    MissingField { endpoint: String, field: String },
}

impl ApiError {
    /// HTTP status for errors reported by the service.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
