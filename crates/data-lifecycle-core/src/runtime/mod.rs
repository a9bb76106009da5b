// crates/data-lifecycle-core/src/runtime/mod.rs
// ============================================================================
// Module: Data Lifecycle Runtime
// Description: Statement generation, reporting, run log sinks, and the row loop.
// Purpose: Group the runtime pieces that drive one lifecycle run.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime turns validated records into procedure calls, executes them
//! through a [`crate::interfaces::WarehouseExecutor`], and writes checkpoints
//! back through a [`crate::interfaces::ConfigStore`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod command;
pub mod report;
pub mod runner;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::CompositeRunLogSink;
pub use audit::FileRunLogSink;
pub use audit::LogFormat;
pub use audit::MemoryRunLogSink;
pub use audit::NoopRunLogSink;
pub use audit::StderrRunLogSink;
pub use command::CommandContext;
pub use command::PROCEDURE_ARITY;
pub use command::PROCEDURE_NAME;
pub use command::generate_procedure_call;
pub use report::AuditLine;
pub use report::GranularityUnit;
pub use report::LifecycleAction;
pub use report::describe_outcome;
pub use runner::PlannedRow;
pub use runner::PreflightError;
pub use runner::RowOutcome;
pub use runner::RunError;
pub use runner::RunOptions;
pub use runner::RunSummary;
pub use runner::plan_rows;
pub use runner::preflight;
pub use runner::run;
pub use store::InMemoryConfigStore;
