// crates/data-lifecycle-warehouse/tests/credentials_and_install.rs
// ============================================================================
// Module: Warehouse Offline Tests
// Description: Secret parsing, result decoding, and script rendering.
// Purpose: Cover warehouse plumbing that needs no live connection.
// ============================================================================

//! Warehouse plumbing tests that run without a live connection.

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

use data_lifecycle_warehouse::WarehouseCredentials;
use data_lifecycle_warehouse::WarehouseError;
use data_lifecycle_warehouse::outcome_from_columns;
use data_lifecycle_warehouse::render_install_script;

#[test]
fn secret_with_extra_fields_parses() {
    let secret = r#"{
        "engine": "redshift",
        "host": "cluster.example.internal",
        "port": "5439",
        "database": "dev",
        "username": "lifecycle",
        "password": "secret",
        "dbClusterIdentifier": "cluster"
    }"#;
    let credentials = WarehouseCredentials::from_secret_string(secret).unwrap();
    assert_eq!(credentials.host, "cluster.example.internal");
    assert_eq!(credentials.port, 5439);
    assert_eq!(credentials.username, "lifecycle");
}

#[test]
fn secret_missing_password_is_rejected() {
    let err = WarehouseCredentials::from_secret_string(
        r#"{"host":"h","port":5439,"database":"dev","username":"u"}"#,
    )
    .unwrap_err();
    assert!(matches!(err, WarehouseError::Credentials(message) if message.contains("password")));
}

#[test]
fn secret_with_out_of_range_port_is_rejected() {
    for port in ["70000", "\"abc\"", "-1"] {
        let secret =
            format!(r#"{{"host":"h","port":{port},"database":"dev","username":"u","password":"p"}}"#);
        assert!(WarehouseCredentials::from_secret_string(&secret).is_err(), "port {port}");
    }
}

#[test]
fn secret_with_blank_host_is_rejected() {
    let err = WarehouseCredentials::from_secret_string(
        r#"{"host":" ","port":5439,"database":"dev","username":"u","password":"p"}"#,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "warehouse credentials error: secret host is empty");
}

#[test]
fn every_placeholder_is_replaced() {
    let script = "CREATE OR REPLACE PROCEDURE SCHEMAVARIABLE.rs_data_lc_manager()\n\
                  AS $$ BEGIN INSERT INTO SCHEMAVARIABLE.audit VALUES (1); END; $$ LANGUAGE plpgsql;";
    let rendered = render_install_script(script, "lifecycle");
    assert!(!rendered.contains("SCHEMAVARIABLE"));
    assert_eq!(rendered.matches("lifecycle.").count(), 2);
}

#[test]
fn extra_result_columns_are_ignored() {
    let outcome =
        outcome_from_columns(&[Some("1"), None, Some("2024-01-01"), Some("extra")]).unwrap();
    assert_eq!(outcome.row_count, "NULL");
    assert_eq!(outcome.new_checkpoint.as_deref(), Some("2024-01-01"));
}
