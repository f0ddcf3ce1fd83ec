use thiserror::Error;

use crate::outcome::CancelReason;
use crate::validation::ValidationError;

/// Errors that end an AI call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    /// No API key was configured
    #[error("credential not configured")]
    CredentialMissing,

    /// The request was rejected before anything was sent
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// Upstream returned a non-retryable status
    #[error("provider returned {status}: {message}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Every attempt hit a transient failure
    #[error("giving up after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// Number of requests issued
        attempts: u32,
        /// Status of the last response, absent if the last attempt never got one
        status: Option<u16>,
        /// Description of the last failure
        message: String,
    },

    /// The response succeeded but carried no text
    #[error("no text content in response")]
    NoTextContent,

    /// The response body was not a valid envelope
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The call was cancelled or ran out of time
    #[error("{0}")]
    Cancelled(CancelReason),

    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl AiError {
    /// HTTP status attached to this error, if any
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::RetriesExhausted { status, .. } => *status,
            _ => None,
        }
    }

    /// Stable machine-readable code for log entries
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "CREDENTIAL_MISSING",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            Self::NoTextContent => "NO_TEXT_CONTENT",
            Self::Parse(_) => "PARSE_ERROR",
            Self::Cancelled(_) => "CANCELLED",
            Self::Client(_) => "CLIENT_ERROR",
        }
    }

    /// Whether this error came from a transient upstream condition
    ///
    /// Transient failures are retried inside the client, so by the time a
    /// caller sees one the retry budget is spent. Callers can still use this
    /// to answer with a "try again later" style response.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}
