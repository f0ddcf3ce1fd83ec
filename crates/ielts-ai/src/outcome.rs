use std::fmt;

use crate::error::AiError;

/// Why a call stopped before reaching a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired
    Token,
    /// The caller's deadline passed
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => f.write_str("request cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Terminal result of an AI call
///
/// Returned instead of an error so both paths must be handled explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// The call produced a value
    Success(T),
    /// The call failed
    Failure(AiError),
    /// The call was abandoned before finishing
    Cancelled(CancelReason),
}

/// Outcome carrying the raw response body
pub type AiOutcome = Outcome<String>;

impl<T> Outcome<T> {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// The error, if this is a failure
    pub const fn error(&self) -> Option<&AiError> {
        match self {
            Self::Failure(error) => Some(error),
            _ => None,
        }
    }

    /// HTTP status attached to a failure, if any
    pub fn status(&self) -> Option<u16> {
        self.error().and_then(AiError::status)
    }

    /// Transform the success value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Failure(error) => Outcome::Failure(error),
            Self::Cancelled(reason) => Outcome::Cancelled(reason),
        }
    }

    /// Chain a fallible step onto a success value
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Success(value) => f(value),
            Self::Failure(error) => Outcome::Failure(error),
            Self::Cancelled(reason) => Outcome::Cancelled(reason),
        }
    }

    /// Convert into a `Result`, folding cancellation into [`AiError::Cancelled`]
    ///
    /// # Errors
    ///
    /// Returns the failure or cancellation as an [`AiError`]
    pub fn into_result(self) -> Result<T, AiError> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(error) => Err(error),
            Self::Cancelled(reason) => Err(AiError::Cancelled(reason)),
        }
    }
}
