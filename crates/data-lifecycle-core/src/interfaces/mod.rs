// crates/data-lifecycle-core/src/interfaces/mod.rs
// ============================================================================
// Module: Data Lifecycle Interfaces
// Description: Backend-agnostic contracts for the config store, the
//              warehouse executor, and run log sinks.
// Purpose: Keep the row loop independent of AWS and Postgres clients.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The row loop talks to three collaborators: a [`ConfigStore`] that can be
//! scanned page by page and updated per table, a [`WarehouseExecutor`] that
//! runs the lifecycle procedure and post-processing over one connection, and
//! a [`RunLogSink`] that receives structured events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::RawItem;
use crate::core::RunLogEvent;
use crate::core::TableKey;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of scan pages followed before the scan is abandoned.
pub const MAX_SCAN_PAGES: usize = 100_000;

// ============================================================================
// SECTION: Config Store
// ============================================================================

/// Config store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigStoreError {
    /// Transport or service failure.
    #[error("config store io error: {0}")]
    Io(String),
    /// Store returned data the job cannot interpret.
    #[error("config store invalid data: {0}")]
    Invalid(String),
    /// Store failed for another reason.
    #[error("config store error: {0}")]
    Store(String),
}

/// One page of a config store scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage<C> {
    /// Items returned by this page, in store order.
    pub items: Vec<RawItem>,
    /// Continuation cursor; `None` on the final page.
    pub next: Option<C>,
}

/// Durable key-value store holding one config item per table.
pub trait ConfigStore {
    /// Opaque continuation cursor.
    type Cursor;

    /// Returns one page of items starting after `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when the page cannot be read.
    fn scan_page(
        &self,
        cursor: Option<Self::Cursor>,
    ) -> Result<ScanPage<Self::Cursor>, ConfigStoreError>;

    /// Writes a new checkpoint for the item keyed by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when the update fails.
    fn update_checkpoint(&self, key: &TableKey, checkpoint: &str) -> Result<(), ConfigStoreError>;
}

/// Scans every item in the store, following continuation cursors.
///
/// # Errors
///
/// Returns [`ConfigStoreError`] when any page fails or the page limit is hit.
pub fn scan_all<S>(store: &S) -> Result<Vec<RawItem>, ConfigStoreError>
where
    S: ConfigStore + ?Sized,
{
    let mut items = Vec::new();
    let mut cursor = None;
    for _ in 0 .. MAX_SCAN_PAGES {
        let page = store.scan_page(cursor)?;
        items.extend(page.items);
        match page.next {
            Some(next) => cursor = Some(next),
            None => return Ok(items),
        }
    }
    Err(ConfigStoreError::Store(format!("scan exceeded {MAX_SCAN_PAGES} pages")))
}

// ============================================================================
// SECTION: Warehouse Executor
// ============================================================================

/// Warehouse executor errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// Connection-level failure.
    #[error("warehouse connection error: {0}")]
    Connection(String),
    /// Statement was rejected or failed.
    #[error("warehouse statement error: {0}")]
    Statement(String),
    /// Statement returned an unexpected result shape.
    #[error("warehouse result error: {0}")]
    Result(String),
}

/// Audit tuple returned by the lifecycle procedure.
///
/// # Invariants
/// - `new_checkpoint` is `None` when the procedure returned NULL or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureOutcome {
    /// Granularity units processed, as reported.
    pub units_processed: String,
    /// Rows processed, as reported.
    pub row_count: String,
    /// New checkpoint to persist, if any.
    pub new_checkpoint: Option<String>,
}

impl ProcedureOutcome {
    /// Builds an outcome from the three positional result columns.
    #[must_use]
    pub fn from_columns(
        units_processed: impl Into<String>,
        row_count: impl Into<String>,
        new_checkpoint: Option<&str>,
    ) -> Self {
        Self {
            units_processed: units_processed.into(),
            row_count: row_count.into(),
            new_checkpoint: new_checkpoint
                .filter(|checkpoint| !checkpoint.is_empty())
                .map(str::to_string),
        }
    }
}

/// Single-connection executor for the warehouse lifecycle procedure.
pub trait WarehouseExecutor {
    /// Executes a procedure call and returns its audit tuple.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when execution fails or returns no usable row.
    fn call_procedure(&mut self, statement: &str) -> Result<ProcedureOutcome, ExecutorError>;

    /// Settles any open transaction after a failed call (commit-on-error).
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the connection cannot be settled.
    fn settle(&mut self) -> Result<(), ExecutorError>;

    /// Reclaims storage for a table; runs outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the vacuum fails.
    fn vacuum(&mut self, table: &TableKey) -> Result<(), ExecutorError>;

    /// Refreshes planner statistics for a table.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the analyze fails.
    fn analyze(&mut self, table: &TableKey) -> Result<(), ExecutorError>;
}

// ============================================================================
// SECTION: Run Log Sink
// ============================================================================

/// Receives structured run log events.
///
/// Sinks must not fail the run; write errors are dropped.
pub trait RunLogSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: &RunLogEvent);
}
