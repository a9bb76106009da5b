// crates/data-lifecycle-core/src/runtime/audit.rs
// ============================================================================
// Module: Run Log Sinks
// Description: Stderr, file, in-memory, and fan-out sinks for run log events.
// Purpose: Route structured run events without a logging framework.
// Dependencies: crate::{core, interfaces}, serde, serde_json
// ============================================================================

//! ## Overview
//! Sinks render [`RunLogEvent`] values either as `LEVEL: message` text lines
//! or as JSON lines. Write failures are dropped so logging never fails a run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;

use crate::core::RunLogEvent;
use crate::interfaces::RunLogSink;

// ============================================================================
// SECTION: Format
// ============================================================================

/// Rendering used by stream sinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// `LEVEL: message` lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Renders an event in this format; `None` if serialization fails.
    #[must_use]
    pub fn render(self, event: &RunLogEvent) -> Option<String> {
        match self {
            Self::Text => Some(event.render_text()),
            Self::Json => serde_json::to_string(event).ok(),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink that writes events to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrRunLogSink {
    /// Line format.
    format: LogFormat,
}

impl StderrRunLogSink {
    /// Creates a stderr sink with the given format.
    #[must_use]
    pub const fn new(format: LogFormat) -> Self {
        Self {
            format,
        }
    }
}

impl RunLogSink for StderrRunLogSink {
    fn record(&self, event: &RunLogEvent) {
        if let Some(line) = self.format.render(event) {
            let _ = writeln!(io::stderr(), "{line}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileRunLogSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileRunLogSink {
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

impl RunLogSink for FileRunLogSink {
    fn record(&self, event: &RunLogEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRunLogSink;

impl RunLogSink for NoopRunLogSink {
    fn record(&self, _event: &RunLogEvent) {}
}

/// Sink that keeps events in memory, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRunLogSink {
    /// Recorded events in arrival order.
    events: Arc<Mutex<Vec<RunLogEvent>>>,
}

impl MemoryRunLogSink {
    /// Creates an empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RunLogEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Returns recorded events rendered as `LEVEL: message` lines.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events().iter().map(RunLogEvent::render_text).collect()
    }
}

impl RunLogSink for MemoryRunLogSink {
    fn record(&self, event: &RunLogEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}

/// Sink that forwards every event to each inner sink in order.
#[derive(Clone, Default)]
pub struct CompositeRunLogSink {
    /// Downstream sinks.
    sinks: Vec<Arc<dyn RunLogSink>>,
}

impl CompositeRunLogSink {
    /// Creates a fan-out sink.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn RunLogSink>>) -> Self {
        Self {
            sinks,
        }
    }

    /// Adds a downstream sink.
    pub fn push(&mut self, sink: Arc<dyn RunLogSink>) {
        self.sinks.push(sink);
    }
}

impl RunLogSink for CompositeRunLogSink {
    fn record(&self, event: &RunLogEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
