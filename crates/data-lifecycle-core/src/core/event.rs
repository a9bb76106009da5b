// crates/data-lifecycle-core/src/core/event.rs
// ============================================================================
// Module: Run Log Events
// Description: Structured operator-facing events emitted by the row loop.
// Purpose: Give every log line a stable, serializable shape.
// Dependencies: crate::core::record, serde
// ============================================================================

//! ## Overview
//! The row loop never writes to a stream directly. It builds
//! [`RunLogEvent`] values and hands them to a
//! [`crate::interfaces::RunLogSink`], which decides how to render them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::core::record::TableKey;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a run log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Informational progress or audit line.
    Info,
    /// Row-level or run-level failure.
    Error,
}

impl LogLevel {
    /// Returns the upper-case label used in text output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
        }
    }
}

/// Processing stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    /// Run start.
    Start,
    /// Record validation.
    Validate,
    /// Numeric pre-flight checks.
    Preflight,
    /// Procedure execution.
    Execute,
    /// Audit result reporting.
    Report,
    /// Checkpoint write-back.
    Checkpoint,
    /// Storage reclamation.
    Vacuum,
    /// Statistics refresh.
    Analyze,
    /// Run completion.
    Finish,
}

impl RunStage {
    /// Returns the snake-case stage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Validate => "validate",
            Self::Preflight => "preflight",
            Self::Execute => "execute",
            Self::Report => "report",
            Self::Checkpoint => "checkpoint",
            Self::Vacuum => "vacuum",
            Self::Analyze => "analyze",
            Self::Finish => "finish",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured run log event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLogEvent {
    /// Event identifier.
    pub event: String,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: LogLevel,
    /// Processing stage.
    pub stage: RunStage,
    /// Warehouse schema of the row, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    /// Warehouse table of the row, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Generated procedure call, attached to execute-stage events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
}

impl RunLogEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(
        level: LogLevel,
        stage: RunStage,
        table: Option<&TableKey>,
        message: impl Into<String>,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "data_lifecycle".to_string(),
            timestamp_ms,
            level,
            stage,
            schema_name: table.map(|key| key.schema_name.clone()),
            table_name: table.map(|key| key.table_name.clone()),
            message: message.into(),
            statement: None,
        }
    }

    /// Creates an informational event.
    #[must_use]
    pub fn info(stage: RunStage, table: Option<&TableKey>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, stage, table, message)
    }

    /// Creates an error event.
    #[must_use]
    pub fn error(stage: RunStage, table: Option<&TableKey>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, stage, table, message)
    }

    /// Attaches the generated statement.
    #[must_use]
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    /// Renders the event as a `LEVEL: message` text line.
    #[must_use]
    pub fn render_text(&self) -> String {
        format!("{}: {}", self.level.label(), self.message)
    }
}
