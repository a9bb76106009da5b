// crates/data-lifecycle-warehouse/src/error.rs
// ============================================================================
// Module: Warehouse Errors
// Description: Failures raised while preparing warehouse access.
// Purpose: Separate setup failures from per-statement executor errors.
// Dependencies: thiserror, data-lifecycle-core
// ============================================================================

//! Failures raised while preparing warehouse access.

use data_lifecycle_core::ExecutorError;
use thiserror::Error;

/// Errors raised by credential resolution and procedure installation.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Local I/O or runtime failure.
    #[error("warehouse io error: {0}")]
    Io(String),
    /// Secrets Manager call failed.
    #[error("warehouse secrets error: {0}")]
    Secrets(String),
    /// Secret content is unusable.
    #[error("warehouse credentials error: {0}")]
    Credentials(String),
    /// Connection or statement failure.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}
