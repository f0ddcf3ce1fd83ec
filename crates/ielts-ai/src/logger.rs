//! Per-request structured logger
//!
//! Each handler invocation builds one [`RequestLogger`]. Every log call turns
//! into a single [`LogEntry`] tagged with the request id and the time elapsed
//! since the logger was created, and is handed to a [`LogSink`].

use std::error::Error as StdError;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Error details attached to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    /// Chain of underlying causes, outermost first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorInfo {
    /// Capture an error and its source chain
    pub fn from_error(error: &(dyn StdError + 'static), code: Option<&str>) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            message: error.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\ncaused by: ")),
            code: code.map(str::to_owned),
        }
    }
}

/// One structured log line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub request_id: String,
    pub context: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Milliseconds since the logger was created
    pub duration: u64,
}

/// Destination for log entries
pub trait LogSink: Send + Sync {
    fn write(&self, entry: &LogEntry);
}

/// Writes each entry as one JSON object per line on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, entry: &LogEntry) {
        let Ok(line) = serde_json::to_string(entry) else {
            return;
        };
        let mut stdout = std::io::stdout().lock();
        // Logging must never fail the request it describes
        let _ = writeln!(stdout, "{line}");
    }
}

/// Keeps entries in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl LogSink for MemorySink {
    fn write(&self, entry: &LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
    }
}

/// Structured logger scoped to one request
#[derive(Clone)]
pub struct RequestLogger {
    request_id: String,
    started: Instant,
    context: Map<String, Value>,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLogger")
            .field("request_id", &self.request_id)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl RequestLogger {
    /// Create a logger with a fresh request id
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            started: Instant::now(),
            context: Map::new(),
            sink,
        }
    }

    /// Create a logger writing JSON lines to stdout
    pub fn stdout() -> Self {
        Self::new(Arc::new(StdoutSink))
    }

    /// Reuse an id assigned upstream, e.g. from a request header
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Attach a field to every entry written by this logger
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn debug(&self, message: &str, context: Map<String, Value>) {
        self.log(LogLevel::Debug, message, context, None);
    }

    pub fn info(&self, message: &str, context: Map<String, Value>) {
        self.log(LogLevel::Info, message, context, None);
    }

    pub fn warn(&self, message: &str, context: Map<String, Value>) {
        self.log(LogLevel::Warn, message, context, None);
    }

    pub fn error(&self, message: &str, context: Map<String, Value>) {
        self.log(LogLevel::Error, message, context, None);
    }

    /// Log at error level with details of `error`
    pub fn error_with(&self, message: &str, error: &(dyn StdError + 'static), code: Option<&str>) {
        self.log(LogLevel::Error, message, Map::new(), Some(ErrorInfo::from_error(error, code)));
    }

    /// Write one entry
    pub fn log(&self, level: LogLevel, message: &str, context: Map<String, Value>, error: Option<ErrorInfo>) {
        let mut merged = self.context.clone();
        merged.extend(context);

        let entry = LogEntry {
            level,
            message: message.to_owned(),
            timestamp: jiff::Timestamp::now().to_string(),
            request_id: self.request_id.clone(),
            context: merged,
            error,
            duration: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        self.sink.write(&entry);
    }
}
