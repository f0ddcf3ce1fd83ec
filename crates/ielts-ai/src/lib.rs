//! AI completion client for the IELTS prep edge functions
//!
//! Wraps the provider's Messages API with request validation, retry with
//! exponential backoff, cancellation, and per-request structured logging.
//! Every call ends in an [`Outcome`] rather than an error so handlers have
//! to deal with success, failure and cancellation explicitly.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod client;
pub mod error;
pub mod logger;
pub mod outcome;
pub mod retry;
pub mod transport;
pub mod types;
pub mod validation;
pub mod wire;

pub use client::{AiClient, Cancellation, extract_text};
pub use error::AiError;
pub use logger::{LogEntry, LogLevel, LogSink, MemorySink, RequestLogger, StdoutSink};
pub use outcome::{AiOutcome, CancelReason, Outcome};
pub use retry::{Jitter, RetryPolicy, is_retryable_status};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
pub use types::{AiRequest, Message, Role};
pub use validation::ValidationError;
