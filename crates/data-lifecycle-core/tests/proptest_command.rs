//! Procedure call generator property-based tests.
//!
//! ## Purpose
//! Randomized config items must either fail validation or yield a statement
//! with the fixed argument count, regardless of field contents.
// crates/data-lifecycle-core/tests/proptest_command.rs
// ============================================================================
// Module: Procedure Call Property-Based Tests
// Description: Fuzz-like checks for validation and statement shape.
// Purpose: Ensure generation never panics and keeps its positional contract.
// ============================================================================

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
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use data_lifecycle_core::ConfigRecord;
use data_lifecycle_core::Flag;
use data_lifecycle_core::RawValue;
use data_lifecycle_core::generate_procedure_call;
use data_lifecycle_core::runtime::PROCEDURE_ARITY;
use proptest::prelude::*;

use crate::common::sample_context;
use crate::common::sample_item;
use crate::common::split_call_arguments;
use crate::common::with_field;

fn raw_value() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        Just(RawValue::Null),
        any::<bool>().prop_map(RawValue::Bool),
        any::<i32>().prop_map(|value| RawValue::int(i64::from(value))),
        "[A-Za-z0-9 _]{0,12}".prop_map(RawValue::text),
        Just(RawValue::Other("map".to_string())),
    ]
}

proptest! {
    #[test]
    fn bool_like_fields_only_hold_zero_or_one(value in raw_value()) {
        let item = with_field(sample_item("s", "t"), "escape", value);
        if let Ok(record) = ConfigRecord::from_raw(&item) {
            prop_assert!(matches!(record.escape(), Flag::Off | Flag::On));
            prop_assert!(record.escape().as_u8() <= 1);
        }
    }

    #[test]
    fn valid_records_yield_fixed_arity_statements(
        table in "[a-z_]{1,16}",
        column in "[a-z_]{1,16}",
        partition in "[a-z_]{0,8}",
        retention in 0_u32..10_000,
        header in any::<bool>(),
        parallel in any::<bool>(),
        format in prop_oneof![Just(""), Just("csv"), Just("parquet"), Just("PARQUET")],
        compression in prop_oneof![Just(""), Just("gzip"), Just("zstd"), Just("bzip2")],
    ) {
        let item = with_field(sample_item("s", &table), "column_name", RawValue::text(column));
        let item = with_field(item, "partition_column", RawValue::text(partition));
        let item = with_field(item, "retention_period", RawValue::int(i64::from(retention)));
        let item = with_field(item, "header", RawValue::Bool(header));
        let item = with_field(item, "parallel", RawValue::Bool(parallel));
        let item = with_field(item, "file_format", RawValue::text(format));
        let item = with_field(item, "compression", RawValue::text(compression));
        let record = ConfigRecord::from_raw(&item).unwrap();
        let statement = generate_procedure_call(&record, &sample_context());
        let args = split_call_arguments(&statement);
        prop_assert_eq!(args.len(), PROCEDURE_ARITY);
        prop_assert_eq!(args[4].clone(), retention.to_string());
        prop_assert_eq!(statement.clone(), generate_procedure_call(&record, &sample_context()));
    }
}
