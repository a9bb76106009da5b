// crates/data-lifecycle-core/src/runtime/runner.rs
// ============================================================================
// Module: Row Execution Loop
// Description: Sequential per-table lifecycle processing with checkpointing.
// Purpose: Run every config row once, isolating failures to their own row.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! [`run`] scans the config store, orders items by ascending priority (stable
//! among ties), and drives each row through validate, preflight, execute,
//! report, checkpoint, and reclaim stages. A failing stage ends that row only:
//! - validation, preflight, or execution failures skip the rest of the row;
//!   execution failures also settle the connection (commit-on-error);
//! - a checkpoint write failure skips reclamation, so reclamation only ever
//!   follows a durably recorded advance;
//! - reclamation failures are logged and have no further effect.
//!
//! Only failing to enumerate the config store aborts the run. A partially
//! applied row (exported but not checkpointed) is recovered by re-running the
//! job from the stored checkpoint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::ConfigRecord;
use crate::core::RawItem;
use crate::core::RunLogEvent;
use crate::core::RunStage;
use crate::core::TableKey;
use crate::core::ValidationError;
use crate::core::sort_by_priority;
use crate::interfaces::ConfigStore;
use crate::interfaces::ConfigStoreError;
use crate::interfaces::RunLogSink;
use crate::interfaces::WarehouseExecutor;
use crate::interfaces::scan_all;
use crate::runtime::command::CommandContext;
use crate::runtime::command::generate_procedure_call;
use crate::runtime::report::LifecycleAction;
use crate::runtime::report::checkpoint_message;
use crate::runtime::report::describe_outcome;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Run-wide options for the row loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Statement generation context.
    pub context: CommandContext,
    /// Reject non-numeric retention periods and unknown flags before execution.
    pub preflight_numeric_checks: bool,
}

impl RunOptions {
    /// Creates options with pre-flight checks enabled.
    #[must_use]
    pub const fn new(context: CommandContext) -> Self {
        Self {
            context,
            preflight_numeric_checks: true,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal run errors; row-level failures never surface here.
#[derive(Debug, Error)]
pub enum RunError {
    /// Config items could not be enumerated.
    #[error(transparent)]
    ConfigStore(#[from] ConfigStoreError),
}

/// Numeric pre-flight failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreflightError {
    /// Retention period is not an integer.
    #[error("retention_period must be an integer, got '{0}'")]
    RetentionPeriod(String),
    /// Update/delete flag is not 0, 1, or 2.
    #[error("update_delete_flag must be one of [0, 1, 2], got '{0}'")]
    UpdateDeleteFlag(String),
}

/// Checks the numeric fields that the statement embeds unquoted.
///
/// # Errors
///
/// Returns [`PreflightError`] for the first offending field.
pub fn preflight(record: &ConfigRecord) -> Result<(), PreflightError> {
    if record.retention_period().trim().parse::<i64>().is_err() {
        return Err(PreflightError::RetentionPeriod(record.retention_period().to_string()));
    }
    if LifecycleAction::from_flag(record.update_delete_flag()).is_none() {
        return Err(PreflightError::UpdateDeleteFlag(record.update_delete_flag().to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Terminal state of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Execute and checkpoint stages succeeded.
    Succeeded {
        /// A new checkpoint was written.
        checkpoint_advanced: bool,
        /// Vacuum and analyze both succeeded.
        reclaimed: bool,
    },
    /// Record failed validation.
    ValidationFailed,
    /// Record failed numeric pre-flight checks.
    PreflightFailed,
    /// Procedure call failed.
    ExecutionFailed,
    /// Checkpoint write failed.
    CheckpointFailed,
}

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Rows scanned.
    pub rows: usize,
    /// Rows that executed and checkpointed.
    pub succeeded: usize,
    /// Rows rejected by validation.
    pub validation_failures: usize,
    /// Rows rejected by pre-flight checks.
    pub preflight_failures: usize,
    /// Rows whose procedure call failed.
    pub execution_failures: usize,
    /// Rows whose checkpoint write failed.
    pub checkpoint_failures: usize,
    /// Succeeded rows whose reclamation failed.
    pub reclaim_failures: usize,
    /// Rows that advanced their checkpoint.
    pub checkpoints_advanced: usize,
}

impl RunSummary {
    /// Folds one row outcome into the summary.
    pub const fn absorb(&mut self, outcome: RowOutcome) {
        self.rows += 1;
        match outcome {
            RowOutcome::Succeeded {
                checkpoint_advanced,
                reclaimed,
            } => {
                self.succeeded += 1;
                if checkpoint_advanced {
                    self.checkpoints_advanced += 1;
                }
                if !reclaimed {
                    self.reclaim_failures += 1;
                }
            }
            RowOutcome::ValidationFailed => self.validation_failures += 1,
            RowOutcome::PreflightFailed => self.preflight_failures += 1,
            RowOutcome::ExecutionFailed => self.execution_failures += 1,
            RowOutcome::CheckpointFailed => self.checkpoint_failures += 1,
        }
    }

    /// Returns the number of rows that did not succeed.
    #[must_use]
    pub const fn failed(&self) -> usize {
        self.validation_failures
            + self.preflight_failures
            + self.execution_failures
            + self.checkpoint_failures
    }

    /// Renders a one-line summary.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Processed {} config row(s): {} succeeded, {} failed ({} validation, {} preflight, {} \
             execution, {} checkpoint), {} checkpoint(s) advanced, {} reclamation failure(s)",
            self.rows,
            self.succeeded,
            self.failed(),
            self.validation_failures,
            self.preflight_failures,
            self.execution_failures,
            self.checkpoint_failures,
            self.checkpoints_advanced,
            self.reclaim_failures,
        )
    }
}

// ============================================================================
// SECTION: Planning
// ============================================================================

/// Validation and generation result for one item, without execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRow {
    /// Best-effort table key for labeling.
    pub key: Option<TableKey>,
    /// Validated record and its statement, or the validation failure.
    pub result: Result<(ConfigRecord, String), ValidationError>,
}

/// Orders items by priority, validates them, and generates their statements.
#[must_use]
pub fn plan_rows(mut items: Vec<RawItem>, context: &CommandContext) -> Vec<PlannedRow> {
    sort_by_priority(&mut items);
    items
        .iter()
        .map(|item| PlannedRow {
            key: TableKey::from_raw(item),
            result: ConfigRecord::from_raw(item).map(|record| {
                let statement = generate_procedure_call(&record, context);
                (record, statement)
            }),
        })
        .collect()
}

// ============================================================================
// SECTION: Run Loop
// ============================================================================

/// Processes every config row in priority order.
///
/// # Errors
///
/// Returns [`RunError`] only when the config store cannot be enumerated.
pub fn run<S, E>(
    store: &S,
    executor: &mut E,
    options: &RunOptions,
    log: &dyn RunLogSink,
) -> Result<RunSummary, RunError>
where
    S: ConfigStore + ?Sized,
    E: WarehouseExecutor + ?Sized,
{
    let mut items = scan_all(store)?;
    sort_by_priority(&mut items);
    log.record(&RunLogEvent::info(
        RunStage::Start,
        None,
        format!("Processing {} config row(s)", items.len()),
    ));
    let mut summary = RunSummary::default();
    for item in &items {
        let outcome = process_row(store, executor, options, log, item);
        summary.absorb(outcome);
    }
    log.record(&RunLogEvent::info(RunStage::Finish, None, summary.render()));
    Ok(summary)
}

/// Drives one item through every stage.
fn process_row<S, E>(
    store: &S,
    executor: &mut E,
    options: &RunOptions,
    log: &dyn RunLogSink,
    item: &RawItem,
) -> RowOutcome
where
    S: ConfigStore + ?Sized,
    E: WarehouseExecutor + ?Sized,
{
    let record = match ConfigRecord::from_raw(item) {
        Ok(record) => record,
        Err(err) => {
            let key = TableKey::from_raw(item);
            log.record(&RunLogEvent::error(RunStage::Validate, key.as_ref(), err.to_string()));
            return RowOutcome::ValidationFailed;
        }
    };
    let key = record.key();
    let statement = generate_procedure_call(&record, &options.context);

    if options.preflight_numeric_checks
        && let Err(err) = preflight(&record)
    {
        log.record(&RunLogEvent::error(RunStage::Preflight, Some(key), err.to_string()));
        return RowOutcome::PreflightFailed;
    }

    log.record(
        &RunLogEvent::info(RunStage::Execute, Some(key), format!("TABLE: {key}"))
            .with_statement(statement.as_str()),
    );
    let outcome = match executor.call_procedure(&statement) {
        Ok(outcome) => outcome,
        Err(err) => {
            log.record(&RunLogEvent::error(
                RunStage::Execute,
                Some(key),
                format!("An exception has occurred: {err}"),
            ));
            if let Err(settle_err) = executor.settle() {
                log.record(&RunLogEvent::error(
                    RunStage::Execute,
                    Some(key),
                    format!("Failed to settle the connection after an error: {settle_err}"),
                ));
            }
            return RowOutcome::ExecutionFailed;
        }
    };

    let line = describe_outcome(&record, &outcome);
    log.record(&RunLogEvent::new(line.level, RunStage::Report, Some(key), line.message));

    let mut checkpoint_advanced = false;
    if let Some(next) = outcome.new_checkpoint.as_deref() {
        if let Err(err) = store.update_checkpoint(key, next) {
            log.record(&RunLogEvent::error(
                RunStage::Checkpoint,
                Some(key),
                format!("An exception has occurred while updating the checkpoint: {err}"),
            ));
            return RowOutcome::CheckpointFailed;
        }
        checkpoint_advanced = true;
        log.record(&RunLogEvent::info(
            RunStage::Checkpoint,
            Some(key),
            checkpoint_message(record.checkpoint(), next),
        ));
    }

    let reclaimed = reclaim(executor, log, key);
    RowOutcome::Succeeded {
        checkpoint_advanced,
        reclaimed,
    }
}

/// Runs vacuum then analyze; returns true when both succeed.
fn reclaim<E>(executor: &mut E, log: &dyn RunLogSink, key: &TableKey) -> bool
where
    E: WarehouseExecutor + ?Sized,
{
    if let Err(err) = executor.vacuum(key) {
        log.record(&RunLogEvent::error(
            RunStage::Vacuum,
            Some(key),
            format!("Vacuuming failed: {err}"),
        ));
        return false;
    }
    log.record(&RunLogEvent::info(RunStage::Vacuum, Some(key), "Vacuum done successfully"));
    if let Err(err) = executor.analyze(key) {
        log.record(&RunLogEvent::error(
            RunStage::Analyze,
            Some(key),
            format!("Statistics update failed: {err}"),
        ));
        return false;
    }
    log.record(&RunLogEvent::info(
        RunStage::Analyze,
        Some(key),
        "Statistics update done successfully",
    ));
    true
}
