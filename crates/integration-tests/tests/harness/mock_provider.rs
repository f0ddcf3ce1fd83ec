//! Mock Messages API backend for integration tests
//!
//! Fails a configurable number of requests with a chosen status, then
//! answers with a canned envelope. Records what it received.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// What the mock answers once it stops failing
#[derive(Debug, Clone)]
pub enum Reply {
    /// A normal envelope with one text block
    Text(String),
    /// A success envelope with no content blocks
    Empty,
    /// A fixed error status with a provider-style error body
    Error(u16, String),
}

/// Mock provider that returns predictable responses
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

/// Headers and body of the last request the mock received
#[derive(Debug, Clone, Default)]
pub struct Received {
    pub api_key: Option<String>,
    pub version: Option<String>,
    pub body: Option<serde_json::Value>,
}

struct MockState {
    request_count: AtomicU32,
    /// Number of requests to fail before replying (`u32::MAX` = always)
    fail_count: AtomicU32,
    fail_status: StatusCode,
    reply: Reply,
    delay: Option<Duration>,
    received: Mutex<Received>,
}

/// Builder for [`MockProvider`]
pub struct MockProviderBuilder {
    fail_count: u32,
    fail_status: StatusCode,
    reply: Reply,
    delay: Option<Duration>,
}

impl MockProviderBuilder {
    /// Fail the first `n` requests with `status`
    pub fn failing(mut self, n: u32, status: u16) -> Self {
        self.fail_count = n;
        self.fail_status = StatusCode::from_u16(status).expect("valid status");
        self
    }

    /// Fail every request with `status`
    pub fn always_failing(self, status: u16) -> Self {
        self.failing(u32::MAX, status)
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    /// Wait before answering each request
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn start(self) -> anyhow::Result<MockProvider> {
        let state = Arc::new(MockState {
            request_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(self.fail_count),
            fail_status: self.fail_status,
            reply: self.reply,
            delay: self.delay,
            received: Mutex::new(Received::default()),
        });

        let app = Router::new()
            .route("/v1/messages", routing::post(handle_messages))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockProvider { addr, shutdown, state })
    }
}

impl MockProvider {
    pub fn builder() -> MockProviderBuilder {
        MockProviderBuilder {
            fail_count: 0,
            fail_status: StatusCode::INTERNAL_SERVER_ERROR,
            reply: Reply::Text("Hello from mock provider".to_owned()),
            delay: None,
        }
    }

    /// Start a mock that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::builder().start().await
    }

    /// Base URL for configuring the client
    ///
    /// Includes `/v1` since the transport appends `/messages`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// The last request received
    pub fn received(&self) -> Received {
        self.state.received.lock().expect("lock").clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_messages(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.request_count.fetch_add(1, Ordering::SeqCst);

    {
        let mut received = state.received.lock().expect("lock");
        received.api_key = header(&headers, "x-api-key");
        received.version = header(&headers, "anthropic-version");
        received.body = Some(body.clone());
    }

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let remaining = state.fail_count.load(Ordering::SeqCst);
    if remaining > 0 {
        if remaining != u32::MAX {
            state.fail_count.fetch_sub(1, Ordering::SeqCst);
        }
        return (
            state.fail_status,
            Json(serde_json::json!({
                "type": "error",
                "error": {"type": "api_error", "message": "mock provider intentional failure"}
            })),
        )
            .into_response();
    }

    let model = body["model"].as_str().unwrap_or("mock-model").to_owned();

    match &state.reply {
        Reply::Text(text) => Json(serde_json::json!({
            "id": "msg_mock_123",
            "type": "message",
            "role": "assistant",
            "model": model,
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .into_response(),
        Reply::Empty => Json(serde_json::json!({
            "id": "msg_mock_empty",
            "type": "message",
            "role": "assistant",
            "model": model,
            "content": []
        }))
        .into_response(),
        Reply::Error(status, message) => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST),
            Json(serde_json::json!({
                "type": "error",
                "error": {"type": "invalid_request_error", "message": message}
            })),
        )
            .into_response(),
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}
