// crates/data-lifecycle-warehouse/src/install.rs
// ============================================================================
// Module: Procedure Installation
// Description: Installs the lifecycle procedure DDL into a target schema.
// Purpose: Bind the schema placeholder and run the script atomically.
// Dependencies: postgres (via the executor)
// ============================================================================

//! Installs the lifecycle procedure DDL into a target schema.

use crate::error::WarehouseError;
use crate::executor::RedshiftExecutor;

/// Placeholder replaced by the target schema in procedure scripts.
pub const SCHEMA_PLACEHOLDER: &str = "SCHEMAVARIABLE";

/// Replaces every schema placeholder in `script`.
#[must_use]
pub fn render_install_script(script: &str, target_schema: &str) -> String {
    script.replace(SCHEMA_PLACEHOLDER, target_schema)
}

/// Installs the procedure script into `target_schema` in one transaction.
///
/// # Errors
///
/// Returns [`WarehouseError::Io`] when the script is blank and
/// [`WarehouseError::Executor`] when execution fails (the transaction is
/// rolled back).
pub fn install_procedure(
    executor: &mut RedshiftExecutor,
    script: &str,
    target_schema: &str,
) -> Result<(), WarehouseError> {
    if script.trim().is_empty() {
        return Err(WarehouseError::Io("procedure script is empty".to_string()));
    }
    let rendered = render_install_script(script, target_schema);
    executor.execute_in_transaction(&rendered)?;
    Ok(())
}
