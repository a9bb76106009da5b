// crates/data-lifecycle-store-dynamodb/tests/dynamodb_store.rs
// ============================================================================
// Module: DynamoDB Config Store Tests
// Description: Store construction, config serde, and item conversion.
// Purpose: Validate the store surface without real AWS services.
// ============================================================================

//! DynamoDB config store unit tests.

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

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use data_lifecycle_core::ConfigRecord;
use data_lifecycle_core::ConfigStoreError;
use data_lifecycle_core::RawItem;
use data_lifecycle_core::RawValue;
use data_lifecycle_store_dynamodb::DynamoDbConfigStore;
use data_lifecycle_store_dynamodb::DynamoDbConfigStoreConfig;
use data_lifecycle_store_dynamodb::attributes_from_item;
use data_lifecycle_store_dynamodb::item_from_attributes;

fn base_config() -> DynamoDbConfigStoreConfig {
    DynamoDbConfigStoreConfig {
        table_name: "data_lifecycle_config".to_string(),
        region: Some("us-east-1".to_string()),
        endpoint: Some("http://localhost:8000".to_string()),
        scan_page_size: Some(50),
        read_capacity_units: 5,
        write_capacity_units: 5,
        table_ready_timeout_ms: 300_000,
        table_poll_interval_ms: 3_000,
    }
}

fn stored_item() -> HashMap<String, AttributeValue> {
    let text = |value: &str| AttributeValue::S(value.to_string());
    let number = |value: &str| AttributeValue::N(value.to_string());
    HashMap::from([
        ("schema_name".to_string(), text("sales")),
        ("table_name".to_string(), text("orders")),
        ("column_name".to_string(), text("order_date")),
        ("granularity_level".to_string(), text("monthly")),
        ("retention_period".to_string(), text("12")),
        ("checkpoint".to_string(), text("2024-01-01")),
        ("partition_column".to_string(), text("")),
        ("s3_path".to_string(), text("s3://archive/orders/")),
        ("file_format".to_string(), text("parquet")),
        ("header".to_string(), number("0")),
        ("add_quotes".to_string(), number("0")),
        ("escape".to_string(), number("0")),
        ("parallel".to_string(), AttributeValue::Bool(true)),
        ("delimiter".to_string(), text("")),
        ("null_as".to_string(), text("")),
        ("compression".to_string(), text("")),
        ("unload_region".to_string(), text("")),
        ("update_delete_flag".to_string(), text("1")),
        ("max_filesize".to_string(), text("")),
        ("priority".to_string(), number("3")),
    ])
}

#[test]
fn store_rejects_empty_table_name() {
    let mut config = base_config();
    config.table_name = String::new();
    let result = DynamoDbConfigStore::new(config);
    assert!(matches!(result, Err(ConfigStoreError::Invalid(_))));
}

#[test]
fn store_reports_its_table_name() {
    let Ok(store) = DynamoDbConfigStore::new(base_config()) else {
        return;
    };
    assert_eq!(store.table_name(), "data_lifecycle_config");
}

#[test]
fn store_config_serde_roundtrip() {
    let original = base_config();
    let json = serde_json::to_string(&original).expect("serialize");
    let restored: DynamoDbConfigStoreConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(original, restored);
}

#[test]
fn stored_items_validate_into_records() {
    let raw = item_from_attributes(&stored_item());
    let record = ConfigRecord::from_raw(&raw).expect("valid record");
    assert_eq!(record.key().to_string(), "sales.orders");
    assert!(record.parallel().is_on());
    assert_eq!(record.checkpoint(), "2024-01-01");
}

#[test]
fn records_write_flags_as_numbers() {
    let raw = item_from_attributes(&stored_item());
    let record = ConfigRecord::from_raw(&raw).expect("valid record");
    let written = attributes_from_item(&record.to_raw_item());
    assert_eq!(written.get("parallel"), Some(&AttributeValue::N("1".to_string())));
    assert_eq!(written.get("priority"), Some(&AttributeValue::S("3".to_string())));
}

#[test]
fn unsupported_attributes_fail_validation_not_conversion() {
    let mut item = stored_item();
    item.insert("priority".to_string(), AttributeValue::L(Vec::new()));
    let raw: RawItem = item_from_attributes(&item);
    assert_eq!(raw.get("priority"), Some(&RawValue::Other("list".to_string())));
    assert!(ConfigRecord::from_raw(&raw).is_err());
}
