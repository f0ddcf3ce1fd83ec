//! Resilient AI completion client
//!
//! One logical "ask the model" operation: validate, send, retry transient
//! failures with exponential backoff, and hand back an [`Outcome`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ielts_config::AiConfig;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::AiError;
use crate::logger::{ErrorInfo, LogLevel, RequestLogger};
use crate::outcome::{AiOutcome, CancelReason, Outcome};
use crate::retry::{RetryPolicy, is_retryable_status};
use crate::transport::{HttpTransport, RawResponse, Transport};
use crate::types::AiRequest;
use crate::wire::{MessagesRequest, MessagesResponse};

/// Longest slice of an error body kept in failure messages
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Caller-side bound on a call
///
/// Both the in-flight request and the backoff sleep are raced against the
/// token and the deadline.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Never cancels
    pub fn none() -> Self {
        Self::default()
    }

    /// Cancel when `token` fires
    pub fn token(token: CancellationToken) -> Self {
        Self {
            token: Some(token),
            deadline: None,
        }
    }

    /// Give up once `deadline` passes
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the deadline to `timeout` from now
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Reason to stop right now, if any
    pub fn check(&self) -> Option<CancelReason> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(CancelReason::Token);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(CancelReason::DeadlineExceeded);
        }
        None
    }

    /// Resolve once the token fires or the deadline passes
    async fn fired(&self) -> CancelReason {
        let token = async {
            match &self.token {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = token => CancelReason::Token,
            () = deadline => CancelReason::DeadlineExceeded,
        }
    }
}

/// Client for the AI completion API
#[derive(Clone)]
pub struct AiClient {
    api_key: Option<SecretString>,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for AiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiClient")
            .field("has_credential", &self.api_key.is_some())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AiClient {
    /// Create a client talking HTTP to the configured provider
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Client`] if the HTTP client cannot be built
    pub fn new(config: &AiConfig) -> Result<Self, AiError> {
        let transport = HttpTransport::new(&config.base_url, &config.api_version, config.timeout)
            .map_err(|e| AiError::Client(e.to_string()))?;

        Ok(Self::with_transport(config.api_key.clone(), Arc::new(transport))
            .with_policy(RetryPolicy::from(&config.retry)))
    }

    /// Create a client over any transport
    pub fn with_transport(api_key: Option<SecretString>, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.expose_secret().trim().is_empty()),
            policy: RetryPolicy::default(),
            transport,
        }
    }

    /// Replace the policy used when a call does not supply one
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Policy used when a call does not supply one
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `request`, retrying transient failures according to `policy`
    ///
    /// On success the raw response body is returned untouched.
    pub async fn call_with_retry(
        &self,
        request: &AiRequest,
        policy: &RetryPolicy,
        logger: Option<&RequestLogger>,
    ) -> AiOutcome {
        self.call_with_retry_until(request, policy, logger, &Cancellation::none())
            .await
    }

    /// [`call_with_retry`](Self::call_with_retry) bounded by a cancellation token and/or deadline
    pub async fn call_with_retry_until(
        &self,
        request: &AiRequest,
        policy: &RetryPolicy,
        logger: Option<&RequestLogger>,
        cancel: &Cancellation,
    ) -> AiOutcome {
        let Some(api_key) = &self.api_key else {
            tracing::error!("AI credential not configured");
            return failed(logger, "AI credential not configured", AiError::CredentialMissing);
        };

        if let Err(e) = request.validate() {
            tracing::warn!(error = %e, "rejecting invalid AI request");
            let error = AiError::InvalidRequest(e);
            if let Some(logger) = logger {
                logger.log(
                    LogLevel::Warn,
                    "invalid AI request",
                    Map::new(),
                    Some(ErrorInfo::from_error(&error, Some(error.code()))),
                );
            }
            return Outcome::Failure(error);
        }

        if let Some(reason) = cancel.check() {
            return cancelled(reason, 0, logger);
        }

        let body = MessagesRequest::from(request);
        let max_attempts = policy.max_attempts();
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                biased;
                reason = cancel.fired() => return cancelled(reason, attempt, logger),
                result = self.transport.send(&body, api_key) => result,
            };

            let (status, message) = match result {
                Ok(response) if response.is_success() => {
                    tracing::debug!(attempt, status = response.status, "AI call succeeded");
                    log_attempt(logger, attempt, max_attempts, "success", Some(response.status), None);
                    return Outcome::Success(response.body);
                }
                Ok(response) if !is_retryable_status(response.status) => {
                    let message = error_message(&response);
                    tracing::warn!(attempt, status = response.status, "AI call failed permanently");
                    log_attempt(logger, attempt, max_attempts, "failed", Some(response.status), Some(&message));
                    return failed(
                        logger,
                        "AI call failed",
                        AiError::Upstream {
                            status: response.status,
                            message,
                        },
                    );
                }
                // Retryable status: the body is discarded
                Ok(response) => (
                    Some(response.status),
                    format!("provider returned {}", response.status),
                ),
                Err(e) => (None, e.to_string()),
            };

            tracing::warn!(attempt, max_attempts, status = ?status, error = %message, "AI call attempt failed");
            log_attempt(logger, attempt, max_attempts, "retryable", status, Some(&message));

            if attempt >= max_attempts {
                return failed(
                    logger,
                    "AI call retries exhausted",
                    AiError::RetriesExhausted {
                        attempts: attempt,
                        status,
                        message,
                    },
                );
            }

            let delay = policy.backoff(attempt);
            tracing::debug!(attempt, delay = ?delay, "backing off before retry");

            tokio::select! {
                biased;
                reason = cancel.fired() => return cancelled(reason, attempt, logger),
                () = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    /// Ask the model and return the text of the first content block
    ///
    /// `policy` falls back to the client's configured policy. A successful
    /// response without text is reported as [`AiError::NoTextContent`] and
    /// is not retried.
    pub async fn call_for_text(
        &self,
        request: &AiRequest,
        policy: Option<&RetryPolicy>,
        logger: Option<&RequestLogger>,
    ) -> Outcome<String> {
        self.call_for_text_until(request, policy, logger, &Cancellation::none())
            .await
    }

    /// [`call_for_text`](Self::call_for_text) bounded by a cancellation token and/or deadline
    pub async fn call_for_text_until(
        &self,
        request: &AiRequest,
        policy: Option<&RetryPolicy>,
        logger: Option<&RequestLogger>,
        cancel: &Cancellation,
    ) -> Outcome<String> {
        let policy = policy.unwrap_or(&self.policy);

        self.call_with_retry_until(request, policy, logger, cancel)
            .await
            .and_then(|body| match extract_text(&body) {
                Outcome::Failure(error) => failed(logger, "unusable AI response", error),
                outcome => outcome,
            })
    }
}

/// Pull `content[0].text` out of a response envelope
pub fn extract_text(body: &str) -> Outcome<String> {
    match serde_json::from_str::<MessagesResponse>(body) {
        Ok(response) => match response.first_text() {
            Some(text) => Outcome::Success(text.to_owned()),
            None => Outcome::Failure(AiError::NoTextContent),
        },
        Err(e) => Outcome::Failure(AiError::Parse(e.to_string())),
    }
}

/// Record a terminal failure with its error details
fn failed<T>(logger: Option<&RequestLogger>, message: &str, error: AiError) -> Outcome<T> {
    if let Some(logger) = logger {
        logger.error_with(message, &error, Some(error.code()));
    }
    Outcome::Failure(error)
}

fn cancelled(reason: CancelReason, attempt: u32, logger: Option<&RequestLogger>) -> AiOutcome {
    tracing::info!(attempt, reason = %reason, "AI call cancelled");
    if let Some(logger) = logger {
        logger.warn(
            "AI call cancelled",
            fields(json!({ "attempt": attempt, "reason": reason.to_string() })),
        );
    }
    Outcome::Cancelled(reason)
}

fn log_attempt(
    logger: Option<&RequestLogger>,
    attempt: u32,
    max_attempts: u32,
    outcome: &str,
    status: Option<u16>,
    error: Option<&str>,
) {
    let Some(logger) = logger else {
        return;
    };

    let mut context = fields(json!({
        "attempt": attempt,
        "maxAttempts": max_attempts,
        "outcome": outcome,
    }));
    if let Some(status) = status {
        context.insert("status".to_owned(), status.into());
    }
    if let Some(error) = error {
        context.insert("error".to_owned(), error.into());
    }

    if outcome == "success" {
        logger.info("AI call attempt", context);
    } else {
        logger.warn("AI call attempt", context);
    }
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Describe a non-retryable error response
///
/// Prefers the provider's `error.message`, falling back to a truncated body.
fn error_message(response: &RawResponse) -> String {
    let from_json = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_owned));

    match from_json {
        Some(message) => message,
        None if response.body.trim().is_empty() => "empty response body".to_owned(),
        None => response.body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}
