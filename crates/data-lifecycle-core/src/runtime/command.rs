// crates/data-lifecycle-core/src/runtime/command.rs
// ============================================================================
// Module: Procedure Call Generator
// Description: Maps a validated config record to one lifecycle procedure call.
// Purpose: Produce byte-identical statements for identical inputs.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`generate_procedure_call`] is a pure function of the record and the
//! [`CommandContext`]. It never fails: malformed numeric fields are passed
//! through for the warehouse to reject (the row loop may pre-flight them).
//!
//! The call always has [`PROCEDURE_ARITY`] positional arguments, in order:
//! schema, table, column, granularity, retention (unquoted), s3 path, format
//! clause, partition clause, role ARN, region, max file size, parallel clause,
//! update/delete flag (unquoted), checkpoint.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::ConfigRecord;
use crate::core::NO_CHECKPOINT;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the warehouse lifecycle procedure.
pub const PROCEDURE_NAME: &str = "rs_data_lc_manager";
/// Number of positional arguments in every procedure call.
pub const PROCEDURE_ARITY: usize = 14;
/// Parallel clause emitted when parallel unload is disabled.
pub const PARALLEL_OFF: &str = "PARALLEL OFF";
/// Placeholder keeping the parallel argument slot when parallel is enabled.
pub const PARALLEL_DEFAULT: &str = " ";

// ============================================================================
// SECTION: Context
// ============================================================================

/// Run-wide inputs to statement generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandContext {
    /// Schema that owns the lifecycle procedure.
    pub target_schema: String,
    /// IAM role the warehouse assumes for unloads.
    pub role_arn: String,
    /// Region used when the record has no override.
    pub default_region: String,
}

impl CommandContext {
    /// Creates a command context.
    #[must_use]
    pub fn new(
        target_schema: impl Into<String>,
        role_arn: impl Into<String>,
        default_region: impl Into<String>,
    ) -> Self {
        Self {
            target_schema: target_schema.into(),
            role_arn: role_arn.into(),
            default_region: default_region.into(),
        }
    }
}

// ============================================================================
// SECTION: Clauses
// ============================================================================

/// Returns `" PARTITION BY (<column>)"`, or empty without a partition column.
#[must_use]
pub fn partition_clause(record: &ConfigRecord) -> String {
    if record.partition_column().is_empty() {
        String::new()
    } else {
        format!(" PARTITION BY ({})", record.partition_column())
    }
}

/// Returns the checkpoint argument, mapping empty or `none` to `None`.
#[must_use]
pub fn checkpoint_clause(record: &ConfigRecord) -> &str {
    let checkpoint = record.checkpoint();
    if checkpoint.is_empty() || checkpoint.eq_ignore_ascii_case("none") {
        NO_CHECKPOINT
    } else {
        checkpoint
    }
}

/// Returns the record's unload region, or the default when it has none.
#[must_use]
pub fn resolve_region<'a>(record: &'a ConfigRecord, default_region: &'a str) -> &'a str {
    if record.unload_region().is_empty() { default_region } else { record.unload_region() }
}

/// Builds the unload format clause.
///
/// The empty format assembles the clause from component flags. `csv` uses a
/// narrower rule for the null clause: it is only emitted when `null_as` is
/// exactly `"1"`. `parquet` takes no sub-clauses. Any other value is passed
/// through untouched.
#[must_use]
pub fn format_clause(record: &ConfigRecord) -> String {
    let file_format = record.file_format();
    if file_format.is_empty() {
        component_format_clause(record)
    } else if file_format.eq_ignore_ascii_case("csv") {
        csv_format_clause(record)
    } else if file_format.eq_ignore_ascii_case("parquet") {
        "PARQUET".to_string()
    } else {
        file_format.to_string()
    }
}

/// Format clause for an empty `file_format`.
fn component_format_clause(record: &ConfigRecord) -> String {
    let mut clause = String::new();
    if record.header().is_on() {
        clause.push_str("HEADER");
    }
    if !record.delimiter().is_empty() {
        clause.push_str(&delimiter_clause(record.delimiter()));
    }
    if record.add_quotes().is_on() {
        clause.push_str(" ADDQUOTES");
    }
    if !record.null_as().is_empty() {
        clause.push_str(&null_clause(record.null_as()));
    }
    if record.escape().is_on() {
        clause.push_str(" ESCAPE");
    }
    if !record.compression().is_empty() {
        clause.push(' ');
        clause.push_str(record.compression());
    }
    clause
}

/// Format clause for `file_format = csv`.
fn csv_format_clause(record: &ConfigRecord) -> String {
    let mut clause = String::from("CSV");
    if record.header().is_on() {
        clause.push_str("HEADER");
    }
    if !record.delimiter().is_empty() {
        clause.push_str(&delimiter_clause(record.delimiter()));
    }
    if record.null_as() == "1" {
        clause.push_str(&null_clause(record.null_as()));
    }
    if !record.compression().is_empty() {
        clause.push(' ');
        clause.push_str(record.compression());
    }
    clause
}

/// Delimiter sub-clause; quotes are doubled because the clause is itself quoted.
fn delimiter_clause(delimiter: &str) -> String {
    format!(" DELIMITER AS ''{delimiter}''")
}

/// Null representation sub-clause.
fn null_clause(null_as: &str) -> String {
    format!(" NULL AS '{null_as}'")
}

/// Returns the parallel clause.
#[must_use]
pub const fn parallel_clause(record: &ConfigRecord) -> &'static str {
    if record.parallel().is_on() { PARALLEL_DEFAULT } else { PARALLEL_OFF }
}

// ============================================================================
// SECTION: Statement
// ============================================================================

/// Generates the lifecycle procedure call for one record.
#[must_use]
pub fn generate_procedure_call(record: &ConfigRecord, context: &CommandContext) -> String {
    format!(
        "call {target}.{PROCEDURE_NAME}('{schema}','{table}','{column}','{granularity}',\
         {retention},'{s3_path}','{format}','{partition}','{role}','{region}','{max_filesize}',\
         '{parallel}',{flag},'{checkpoint}');",
        target = context.target_schema,
        schema = record.schema_name(),
        table = record.table_name(),
        column = record.column_name(),
        granularity = record.granularity_level(),
        retention = record.retention_period(),
        s3_path = record.s3_path(),
        format = format_clause(record),
        partition = partition_clause(record),
        role = context.role_arn,
        region = resolve_region(record, &context.default_region),
        max_filesize = record.max_filesize(),
        parallel = parallel_clause(record),
        flag = record.update_delete_flag(),
        checkpoint = checkpoint_clause(record),
    )
}
