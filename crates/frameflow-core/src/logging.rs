// crates/frameflow-core/src/logging.rs
// ============================================================================
// Module: Frame Logging
// Description: Structured log events and sinks for frame request handling.
// Purpose: Emit JSON-line events without hard dependencies on a log stack.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Middlewares report warnings (malformed state, inconsistent button results)
//! and the renderer reports internal failures through a [`FrameLogSink`].
//! Sinks are injected per pipeline so deployments can route events to their
//! preferred logging pipeline. Events never carry raw request bodies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a frame log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Informational event.
    Info,
    /// Degraded but recoverable behavior.
    Warn,
    /// Failure reported to the client as an error response.
    Error,
}

/// Structured frame log event.
#[derive(Debug, Clone, Serialize)]
pub struct FrameLogEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event severity.
    pub level: LogLevel,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request path when available.
    pub path: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Optional structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl FrameLogEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(event: &'static str, level: LogLevel, message: impl Into<String>) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            level,
            timestamp_ms,
            path: None,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches the request path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for frame log events.
pub trait FrameLogSink: Send + Sync {
    /// Record a log event.
    fn record(&self, event: &FrameLogEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink that logs JSON lines to stderr.
pub struct StderrLogSink;

impl FrameLogSink for StderrLogSink {
    fn record(&self, event: &FrameLogEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that logs JSON lines to a file.
pub struct FileLogSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileLogSink {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl FrameLogSink for FileLogSink {
    fn record(&self, event: &FrameLogEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
        }
    }
}

/// No-op log sink.
pub struct NoopLogSink;

impl FrameLogSink for NoopLogSink {
    fn record(&self, _event: &FrameLogEvent) {}
}

/// Sink that keeps events in memory, for tests and diagnostics.
#[derive(Default)]
pub struct MemoryLogSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<FrameLogEvent>>,
}

impl MemoryLogSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<FrameLogEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the recorded events with the given identifier.
    #[must_use]
    pub fn events_named(&self, event: &str) -> Vec<FrameLogEvent> {
        self.events().into_iter().filter(|recorded| recorded.event == event).collect()
    }
}

impl FrameLogSink for MemoryLogSink {
    fn record(&self, event: &FrameLogEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
