// crates/data-lifecycle-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: Sample config items and a scripted warehouse executor.
// Purpose: Keep integration tests focused on behavior rather than setup.
// ============================================================================

//! Fixtures shared by the core integration tests.

#![allow(dead_code, reason = "Not every test binary uses every fixture.")]

use std::collections::BTreeMap;
use std::collections::VecDeque;

use data_lifecycle_core::CommandContext;
use data_lifecycle_core::ExecutorError;
use data_lifecycle_core::ProcedureOutcome;
use data_lifecycle_core::RawItem;
use data_lifecycle_core::RawValue;
use data_lifecycle_core::TableKey;
use data_lifecycle_core::WarehouseExecutor;

/// Returns a fully populated, valid raw config item.
pub fn sample_item(schema: &str, table: &str) -> RawItem {
    let mut item = RawItem::new();
    let text = |value: &str| RawValue::text(value);
    item.insert("schema_name".to_string(), text(schema));
    item.insert("table_name".to_string(), text(table));
    item.insert("column_name".to_string(), text("event_date"));
    item.insert("granularity_level".to_string(), text("daily"));
    item.insert("retention_period".to_string(), text("30"));
    item.insert("checkpoint".to_string(), text("None"));
    item.insert("partition_column".to_string(), text(""));
    item.insert("s3_path".to_string(), text("s3://archive/events/"));
    item.insert("file_format".to_string(), text("parquet"));
    item.insert("header".to_string(), RawValue::int(0));
    item.insert("add_quotes".to_string(), RawValue::int(0));
    item.insert("escape".to_string(), RawValue::int(0));
    item.insert("parallel".to_string(), RawValue::int(1));
    item.insert("delimiter".to_string(), text(""));
    item.insert("null_as".to_string(), text(""));
    item.insert("compression".to_string(), text(""));
    item.insert("unload_region".to_string(), text(""));
    item.insert("update_delete_flag".to_string(), text("0"));
    item.insert("max_filesize".to_string(), text("100 MB"));
    item.insert("priority".to_string(), text("1"));
    item
}

/// Returns `item` with `field` replaced.
pub fn with_field(mut item: RawItem, field: &str, value: RawValue) -> RawItem {
    item.insert(field.to_string(), value);
    item
}

/// Returns `item` with `field` removed.
pub fn without_field(mut item: RawItem, field: &str) -> RawItem {
    item.remove(field);
    item
}

/// Returns the command context used across tests.
pub fn sample_context() -> CommandContext {
    CommandContext::new("lifecycle", "arn:aws:iam::123456789012:role/unload", "us-east-1")
}

/// Warehouse call recorded by [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Procedure(String),
    Settle,
    Vacuum(TableKey),
    Analyze(TableKey),
}

/// Executor replaying scripted procedure results and recording every call.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    /// Results returned by successive procedure calls.
    pub results: VecDeque<Result<ProcedureOutcome, ExecutorError>>,
    /// Tables whose vacuum fails.
    pub failing_vacuum: Vec<TableKey>,
    /// Tables whose analyze fails.
    pub failing_analyze: Vec<TableKey>,
    /// Calls in arrival order.
    pub calls: Vec<Call>,
}

impl ScriptedExecutor {
    pub fn new(results: Vec<Result<ProcedureOutcome, ExecutorError>>) -> Self {
        Self {
            results: results.into(),
            ..Self::default()
        }
    }

    pub fn procedure_calls(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Procedure(statement) => Some(statement.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }
}

impl WarehouseExecutor for ScriptedExecutor {
    fn call_procedure(&mut self, statement: &str) -> Result<ProcedureOutcome, ExecutorError> {
        self.calls.push(Call::Procedure(statement.to_string()));
        self.results
            .pop_front()
            .unwrap_or_else(|| Ok(ProcedureOutcome::from_columns("0", "0", None)))
    }

    fn settle(&mut self) -> Result<(), ExecutorError> {
        self.calls.push(Call::Settle);
        Ok(())
    }

    fn vacuum(&mut self, table: &TableKey) -> Result<(), ExecutorError> {
        self.calls.push(Call::Vacuum(table.clone()));
        if self.failing_vacuum.contains(table) {
            return Err(ExecutorError::Statement("vacuum rejected".to_string()));
        }
        Ok(())
    }

    fn analyze(&mut self, table: &TableKey) -> Result<(), ExecutorError> {
        self.calls.push(Call::Analyze(table.clone()));
        if self.failing_analyze.contains(table) {
            return Err(ExecutorError::Statement("analyze rejected".to_string()));
        }
        Ok(())
    }
}

/// Splits the argument list of a generated call, honoring SQL quote doubling.
pub fn split_call_arguments(statement: &str) -> Vec<String> {
    let open = statement.find('(').unwrap();
    let close = statement.rfind(')').unwrap();
    let body = &statement[open + 1 .. close];
    let mut args = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars().peekable();
    let mut quoted = false;
    while let Some(ch) = chars.next() {
        match ch {
            '\'' if quoted && chars.peek() == Some(&'\'') => {
                current.push('\'');
                current.push('\'');
                chars.next();
            }
            '\'' => {
                quoted = !quoted;
                current.push(ch);
            }
            ',' if !quoted => args.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    args.push(current);
    args
}

/// Builds a raw item from `(name, value)` pairs.
pub fn item_of(pairs: &[(&str, RawValue)]) -> RawItem {
    pairs.iter().cloned().map(|(name, value)| (name.to_string(), value)).collect::<BTreeMap<_, _>>()
}
