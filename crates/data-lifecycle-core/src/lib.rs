// crates/data-lifecycle-core/src/lib.rs
// ============================================================================
// Module: Data Lifecycle Core Library
// Description: Public API surface for the data lifecycle job.
// Purpose: Expose config validation, statement generation, and the row loop.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Data lifecycle core validates per-table retention policies read from a
//! key-value config store, turns each into one call of the warehouse
//! lifecycle procedure, and records the returned checkpoint. It is
//! backend-agnostic: AWS and Postgres clients live behind the traits in
//! [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ConfigStore;
pub use interfaces::ConfigStoreError;
pub use interfaces::ExecutorError;
pub use interfaces::ProcedureOutcome;
pub use interfaces::RunLogSink;
pub use interfaces::ScanPage;
pub use interfaces::WarehouseExecutor;
pub use interfaces::scan_all;
pub use runtime::CommandContext;
pub use runtime::CompositeRunLogSink;
pub use runtime::FileRunLogSink;
pub use runtime::InMemoryConfigStore;
pub use runtime::LogFormat;
pub use runtime::MemoryRunLogSink;
pub use runtime::NoopRunLogSink;
pub use runtime::PlannedRow;
pub use runtime::RunError;
pub use runtime::RunOptions;
pub use runtime::RunSummary;
pub use runtime::StderrRunLogSink;
pub use runtime::generate_procedure_call;
pub use runtime::plan_rows;
pub use runtime::run;
