// crates/data-lifecycle-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, input decoding, and reports.
// Purpose: Cover CLI behavior that needs no AWS or warehouse access.
// Dependencies: data-lifecycle-cli main helpers
// ============================================================================

//! ## Overview
//! Exercises argument parsing, input decoding, and report rendering.
//!
//! Inputs are treated as untrusted; size limits must fail closed.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;

use clap::CommandFactory;
use clap::Parser;
use data_lifecycle_config::LifecycleConfig;
use data_lifecycle_config::WarehouseSslMode;
use data_lifecycle_core::CommandContext;
use data_lifecycle_core::LogFormat;
use data_lifecycle_core::RawValue;
use data_lifecycle_core::RunSummary;
use data_lifecycle_core::plan_rows;
use data_lifecycle_warehouse::SslMode;
use tempfile::NamedTempFile;

use super::Cli;
use super::Commands;
use super::render_report;
use super::session_config;
use super::summary_line;
use super::validated_items;
use super::validation_report;
use crate::input::InputError;
use crate::input::InputLocation;
use crate::input::decode_text;
use crate::input::parse_csv_items;
use crate::input::parse_json_items;
use crate::input::read_bytes_with_limit;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const CSV_HEADER: &str = "schema_name,table_name,column_name,granularity_level,retention_period,\
                          checkpoint,partition_column,s3_path,file_format,header,add_quotes,\
                          escape,parallel,delimiter,null_as,compression,unload_region,\
                          update_delete_flag,max_filesize,priority";

fn csv_row(table: &str, parallel: &str, priority: &str) -> String {
    format!(
        "sales,{table},event_date,daily,30,,,s3://archive/{table}/,parquet,0,0,0,{parallel},,,,,\
         0,100 MB,{priority}"
    )
}

fn json_rows() -> &'static str {
    r#"[
        {"schema_name": "sales", "table_name": "orders", "column_name": "order_date",
         "granularity_level": "daily", "retention_period": "90", "checkpoint": "None",
         "partition_column": "", "s3_path": "s3://archive/orders/", "file_format": "csv",
         "header": 1, "add_quotes": true, "escape": "f", "parallel": 0, "delimiter": "|",
         "null_as": "", "compression": "gzip", "unload_region": "", "update_delete_flag": "2",
         "max_filesize": "", "priority": "5"},
        {"schema_name": "sales", "table_name": "returns", "granularity_level": "weekly"}
    ]"#
}

fn context() -> CommandContext {
    CommandContext::new("lifecycle", "arn:aws:iam::123456789012:role/unload", "us-east-1")
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn global_overrides_parse_after_subcommand() {
    let cli = Cli::try_parse_from([
        "data-lifecycle",
        "run",
        "--secret",
        "prod/redshift",
        "--role-arn",
        "arn:aws:iam::1:role/r",
        "--region-name",
        "us-west-2",
        "--dynamodb-table-name",
        "lifecycle_config",
        "--redshift-schema",
        "lifecycle",
    ])
    .expect("parse run");
    assert!(matches!(cli.command, Commands::Run));
    let overrides = cli.global.overrides();
    assert_eq!(overrides.secret.as_deref(), Some("prod/redshift"));
    assert_eq!(overrides.dynamodb_table_name.as_deref(), Some("lifecycle_config"));
    assert_eq!(overrides.redshift_schema.as_deref(), Some("lifecycle"));
}

#[test]
fn inspect_and_install_commands_parse() {
    let cli = Cli::try_parse_from(["data-lifecycle", "render", "--input", "rows.json"])
        .expect("parse render");
    match cli.command {
        Commands::Render(command) => assert_eq!(command.input, Some(PathBuf::from("rows.json"))),
        other => panic!("unexpected command {other:?}"),
    }
    let cli = Cli::try_parse_from([
        "data-lifecycle",
        "--config",
        "job.toml",
        "install-procedure",
        "--script",
        "s3://bucket/sql/proc.sql",
    ])
    .expect("parse install");
    assert_eq!(cli.global.config, Some(PathBuf::from("job.toml")));
    assert!(matches!(cli.command, Commands::InstallProcedure(_)));
}

#[test]
fn ingest_requires_csv_source() {
    assert!(Cli::try_parse_from(["data-lifecycle", "ingest"]).is_err());
}

#[test]
fn session_config_carries_warehouse_ssl_mode() {
    let mut config = LifecycleConfig::default();
    assert_eq!(session_config(&config).ssl_mode, SslMode::Prefer);
    for (configured, expected) in [
        (WarehouseSslMode::Disable, SslMode::Disable),
        (WarehouseSslMode::Require, SslMode::Require),
    ] {
        config.warehouse.ssl_mode = configured;
        assert_eq!(session_config(&config).ssl_mode, expected);
    }
}

// ============================================================================
// SECTION: Inputs
// ============================================================================

#[test]
fn locations_distinguish_s3_and_local() {
    assert_eq!(
        InputLocation::parse("s3://config/lifecycle/tables.csv").unwrap(),
        InputLocation::S3 {
            bucket: "config".to_string(),
            key: "lifecycle/tables.csv".to_string(),
        }
    );
    assert_eq!(
        InputLocation::parse("./tables.csv").unwrap(),
        InputLocation::Local(PathBuf::from("./tables.csv"))
    );
    for bad in ["s3://bucket", "s3://bucket/", "s3:///key", " "] {
        assert!(matches!(InputLocation::parse(bad), Err(InputError::Location(_))), "{bad}");
    }
}

#[test]
fn bounded_read_rejects_oversized_files() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[b'x'; 64]).unwrap();
    assert_eq!(read_bytes_with_limit(file.path(), 64).unwrap().len(), 64);
    let err = read_bytes_with_limit(file.path(), 63).unwrap_err();
    assert!(matches!(err, InputError::TooLarge { size: 64, limit: 63 }));
}

#[test]
fn decode_strips_byte_order_mark() {
    let bytes = "\u{feff}schema_name\nsales\n".as_bytes();
    assert_eq!(decode_text(bytes).unwrap(), "schema_name\nsales\n");
    assert!(decode_text(&[0xFF, 0xFE]).is_err());
}

#[test]
fn csv_cells_become_text_values() {
    let text = format!("{CSV_HEADER}\n{}\n", csv_row("orders", "1", "2"));
    let rows = parse_csv_items(&text).unwrap();
    assert_eq!(rows.len(), 1);
    let item = rows[0].item.as_ref().unwrap();
    assert_eq!(item.len(), 20);
    assert_eq!(item.get("checkpoint"), Some(&RawValue::text("")));
    assert_eq!(item.get("parallel"), Some(&RawValue::text("1")));
}

#[test]
fn csv_rows_longer_than_header_are_rejected_individually() {
    let text = "schema_name,table_name\nsales,orders\nsales,returns,extra\nsales\n";
    let rows = parse_csv_items(text).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].item.is_ok());
    assert!(rows[1].item.as_ref().unwrap_err().contains("3 cells"));
    assert_eq!(rows[2].number, 3);
    assert_eq!(rows[2].item.as_ref().unwrap().len(), 1);
}

#[test]
fn csv_without_header_is_a_parse_error() {
    assert!(matches!(parse_csv_items(""), Err(InputError::Parse(_))));
}

#[test]
fn json_input_must_be_array_of_objects() {
    assert_eq!(parse_json_items(json_rows()).unwrap().len(), 2);
    assert!(parse_json_items(r#"{"schema_name": "sales"}"#).is_err());
    let err = parse_json_items(r#"[{"schema_name": "sales"}, 3]"#).unwrap_err();
    assert!(err.to_string().contains("element 1"));
}

// ============================================================================
// SECTION: Reports
// ============================================================================

#[test]
fn ingest_normalizes_valid_rows_and_reports_invalid_ones() {
    let text = format!(
        "{CSV_HEADER}\n{}\n{}\n",
        csv_row("orders", "yes", "1"),
        csv_row("returns", "true", "2")
    );
    let (items, rejected) = validated_items(parse_csv_items(&text).unwrap());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("table_name"), Some(&RawValue::text("returns")));
    assert_eq!(items[0].get("parallel"), Some(&RawValue::int(1)));
    assert_eq!(items[0].get("checkpoint"), Some(&RawValue::text("None")));
    assert_eq!(rejected.len(), 1);
    assert!(rejected[0].starts_with("ERROR: csv row 1:"));
    assert!(rejected[0].contains("parallel"));
}

#[test]
fn validation_report_counts_invalid_rows() {
    let items = parse_json_items(json_rows()).unwrap();
    let (lines, invalid) = validation_report(&items);
    assert_eq!(invalid, 1);
    assert_eq!(lines[0], "VALID: sales.orders");
    assert!(lines[1].starts_with("INVALID: sales.returns: invalid config record:"));
}

#[test]
fn render_report_orders_statements_and_skips_invalid_rows() {
    let items = parse_json_items(json_rows()).unwrap();
    let planned = plan_rows(items, &context());
    let (statements, skipped) = render_report(&planned);
    assert_eq!(statements.len(), 1);
    assert!(statements[0].starts_with("call lifecycle.rs_data_lc_manager('sales','orders',"));
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].starts_with("ERROR: skipping sales.returns:"));
}

#[test]
fn summary_line_follows_log_format() {
    let summary = RunSummary {
        rows: 2,
        succeeded: 1,
        execution_failures: 1,
        ..RunSummary::default()
    };
    assert!(summary_line(&summary, LogFormat::Text).unwrap().starts_with("Processed 2"));
    let json: serde_json::Value =
        serde_json::from_str(&summary_line(&summary, LogFormat::Json).unwrap()).unwrap();
    assert_eq!(json["execution_failures"], 1);
}
