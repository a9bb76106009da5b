// crates/data-lifecycle-core/src/runtime/report.rs
// ============================================================================
// Module: Audit Reporting
// Description: Human-readable audit lines for procedure results.
// Purpose: Describe what a lifecycle call unloaded or deleted.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Reporting is pure: it turns a record and a [`ProcedureOutcome`] into a
//! [`LogLevel`] and a message. It never fails. An unrecognized
//! `update_delete_flag` yields an error-level configuration line instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::ConfigRecord;
use crate::core::LogLevel;
use crate::interfaces::ProcedureOutcome;

// ============================================================================
// SECTION: Granularity
// ============================================================================

/// Unit label derived from a record's granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GranularityUnit {
    /// `daily`.
    Days,
    /// `monthly`.
    Months,
    /// Anything else.
    Invalid,
}

impl GranularityUnit {
    /// Classifies a granularity label (case-insensitive).
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("daily") {
            Self::Days
        } else if label.eq_ignore_ascii_case("monthly") {
            Self::Months
        } else {
            Self::Invalid
        }
    }

    /// Returns the unit label used in audit lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Days => "day(s)",
            Self::Months => "month(s)",
            Self::Invalid => "Invalid",
        }
    }
}

// ============================================================================
// SECTION: Lifecycle Action
// ============================================================================

/// Action selected by `update_delete_flag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// `0`: export only.
    Unload,
    /// `1`: delete only.
    Delete,
    /// `2`: export, then delete.
    UnloadAndDelete,
}

impl LifecycleAction {
    /// Parses the flag text; returns `None` for anything but `0`, `1`, `2`.
    #[must_use]
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim().parse::<i64>().ok()? {
            0 => Some(Self::Unload),
            1 => Some(Self::Delete),
            2 => Some(Self::UnloadAndDelete),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Audit Line
// ============================================================================

/// Message reported when the update/delete flag is not recognized.
pub const INVALID_FLAG_MESSAGE: &str = "Invalid update_delete_flag in the configuration";

/// One formatted audit line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLine {
    /// Line severity.
    pub level: LogLevel,
    /// Line text.
    pub message: String,
}

/// Describes a procedure outcome for operators.
#[must_use]
pub fn describe_outcome(record: &ConfigRecord, outcome: &ProcedureOutcome) -> AuditLine {
    let unit = GranularityUnit::from_label(record.granularity_level()).label();
    let units = &outcome.units_processed;
    let rows = &outcome.row_count;
    let s3_path = record.s3_path();
    let message = match LifecycleAction::from_flag(record.update_delete_flag()) {
        Some(LifecycleAction::Unload) => format!(
            "Unloaded {units} {unit} of data comprising {rows} row(s) to s3 location: {s3_path}"
        ),
        Some(LifecycleAction::Delete) => {
            format!("Deleted {units} {unit} of data comprising {rows} row(s)")
        }
        Some(LifecycleAction::UnloadAndDelete) => format!(
            "Unloaded and Deleted {units} {unit} of data comprising {rows} row(s) to s3 \
             location: {s3_path}"
        ),
        None => {
            return AuditLine {
                level: LogLevel::Error,
                message: INVALID_FLAG_MESSAGE.to_string(),
            };
        }
    };
    AuditLine {
        level: LogLevel::Info,
        message,
    }
}

/// Describes a checkpoint advance.
#[must_use]
pub fn checkpoint_message(previous: &str, next: &str) -> String {
    format!("Updated the checkpoint from: {previous} to: {next}")
}
