//! Config load and validation tests for data-lifecycle-config.
// crates/data-lifecycle-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards, overrides, and limits.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use data_lifecycle_config::ConfigError;
use data_lifecycle_config::ConfigOverrides;
use data_lifecycle_config::DEFAULT_STATEMENT_TIMEOUT_MS;
use data_lifecycle_config::LifecycleConfig;
use data_lifecycle_config::WarehouseSslMode;
use data_lifecycle_core::LogFormat;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

const VALID_CONFIG: &str = r#"
[job]
redshift_schema = "lifecycle"
role_arn = "arn:aws:iam::123456789012:role/unload"
region_name = "us-east-1"

[warehouse]
secret = "prod/redshift/lifecycle"

[config_store]
table_name = "data_lifecycle_config"
scan_page_size = 50

[logging]
format = "json"
"#;

fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

fn valid_config() -> Result<LifecycleConfig, String> {
    LifecycleConfig::parse(VALID_CONFIG).map_err(|err| err.to_string())
}

#[test]
fn load_accepts_valid_file_with_defaults() -> TestResult {
    let file = write_config(VALID_CONFIG.as_bytes())?;
    let config = LifecycleConfig::load_with_overrides(Some(file.path()), &ConfigOverrides::default())
        .map_err(|err| err.to_string())?;
    if config.warehouse.statement_timeout_ms != DEFAULT_STATEMENT_TIMEOUT_MS {
        return Err("statement timeout default not applied".to_string());
    }
    if !config.job.preflight_numeric_checks {
        return Err("preflight checks should default on".to_string());
    }
    if config.logging.format != LogFormat::Json {
        return Err("logging format not parsed".to_string());
    }
    if config.store_region() != Some("us-east-1") {
        return Err("store region should fall back to job region".to_string());
    }
    Ok(())
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(LifecycleConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        LifecycleConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(LifecycleConfig::load(Some(&path)), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'#'; 1_048_577])?;
    assert_invalid(LifecycleConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(LifecycleConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn parse_rejects_unknown_keys() -> TestResult {
    assert_invalid(LifecycleConfig::parse("[job]\nschema = \"x\"\n"), "config parse error")
}

#[test]
fn overrides_replace_file_values() -> TestResult {
    let mut config = valid_config()?;
    config.apply_overrides(&ConfigOverrides {
        secret: Some("dev/redshift".to_string()),
        redshift_schema: Some("ops".to_string()),
        dynamodb_table_name: Some("other_table".to_string()),
        ..ConfigOverrides::default()
    });
    config.validate().map_err(|err| err.to_string())?;
    let context = config.command_context().map_err(|err| err.to_string())?;
    if context.target_schema != "ops" || context.default_region != "us-east-1" {
        return Err(format!("unexpected context {}", context.target_schema));
    }
    if config.secret().map_err(|err| err.to_string())? != "dev/redshift" {
        return Err("secret override not applied".to_string());
    }
    if config.table_name().map_err(|err| err.to_string())? != "other_table" {
        return Err("table override not applied".to_string());
    }
    Ok(())
}

#[test]
fn flags_alone_form_a_complete_config() -> TestResult {
    let mut config = LifecycleConfig::default();
    config.apply_overrides(&ConfigOverrides {
        secret: Some("prod/redshift".to_string()),
        role_arn: Some("arn:aws:iam::1:role/r".to_string()),
        region_name: Some("eu-west-1".to_string()),
        dynamodb_table_name: Some("lifecycle_config".to_string()),
        redshift_schema: Some("lifecycle".to_string()),
    });
    config.validate().map_err(|err| err.to_string())?;
    let options = config.run_options().map_err(|err| err.to_string())?;
    if !options.preflight_numeric_checks {
        return Err("preflight should default on".to_string());
    }
    Ok(())
}

#[test]
fn validate_requires_secret() -> TestResult {
    let mut config = valid_config()?;
    config.warehouse.secret = None;
    assert_invalid(config.validate(), "warehouse.secret is required")
}

#[test]
fn validate_rejects_role_without_arn_prefix() -> TestResult {
    let mut config = valid_config()?;
    config.job.role_arn = Some("unload-role".to_string());
    assert_invalid(config.validate(), "job.role_arn must start with 'arn:'")
}

#[test]
fn validate_rejects_unsafe_schema_identifier() -> TestResult {
    let mut config = valid_config()?;
    config.job.redshift_schema = Some("lifecycle; drop table x".to_string());
    assert_invalid(config.validate(), "job.redshift_schema must only contain")
}

#[test]
fn validate_rejects_statement_timeout_out_of_range() -> TestResult {
    let mut config = valid_config()?;
    config.warehouse.statement_timeout_ms = 10;
    assert_invalid(config.validate(), "warehouse.statement_timeout_ms must be between")
}

#[test]
fn validate_rejects_scan_page_size_out_of_range() -> TestResult {
    let mut config = valid_config()?;
    config.config_store.scan_page_size = Some(0);
    assert_invalid(config.validate(), "config_store.scan_page_size")
}

#[test]
fn validate_rejects_bad_table_name() -> TestResult {
    let mut config = valid_config()?;
    config.config_store.table_name = Some("ab".to_string());
    assert_invalid(config.validate(), "config_store.table_name must be")
}

#[test]
fn validate_rejects_non_http_endpoint() -> TestResult {
    let mut config = valid_config()?;
    config.config_store.endpoint = Some("localhost:8000".to_string());
    assert_invalid(config.validate(), "config_store.endpoint must be an http(s) url")
}

#[test]
fn validate_rejects_ready_timeout_below_poll_interval() -> TestResult {
    let mut config = valid_config()?;
    config.config_store.table_ready_timeout_ms = 500;
    config.config_store.table_poll_interval_ms = 1_000;
    assert_invalid(config.validate(), "table_ready_timeout_ms")
}

#[test]
fn target_schema_is_checked_without_other_sections() -> TestResult {
    let mut config = LifecycleConfig::default();
    config.apply_overrides(&ConfigOverrides {
        redshift_schema: Some("lifecycle".to_string()),
        ..ConfigOverrides::default()
    });
    if config.target_schema().map_err(|err| err.to_string())? != "lifecycle" {
        return Err("target schema not resolved".to_string());
    }
    config.job.redshift_schema = Some("bad schema".to_string());
    assert_invalid(config.target_schema(), "job.redshift_schema must only contain")
}

#[test]
fn section_validation_is_independent() -> TestResult {
    let mut config = valid_config()?;
    config.warehouse.secret = None;
    config.config_store.validate().map_err(|err| err.to_string())?;
    assert_invalid(config.warehouse.validate(), "warehouse.secret is required")
}

#[test]
fn warehouse_ssl_mode_defaults_to_prefer() -> TestResult {
    let config = valid_config()?;
    if config.warehouse.ssl_mode != WarehouseSslMode::Prefer {
        return Err("ssl mode should default to prefer".to_string());
    }
    Ok(())
}

#[test]
fn warehouse_ssl_mode_parses_each_setting() -> TestResult {
    for (text, expected) in [
        ("disable", WarehouseSslMode::Disable),
        ("prefer", WarehouseSslMode::Prefer),
        ("require", WarehouseSslMode::Require),
    ] {
        let content = VALID_CONFIG.replace(
            "secret = \"prod/redshift/lifecycle\"",
            &format!("secret = \"prod/redshift/lifecycle\"\nssl_mode = \"{text}\""),
        );
        let config = LifecycleConfig::parse(&content).map_err(|err| err.to_string())?;
        if config.warehouse.ssl_mode != expected {
            return Err(format!("ssl_mode {text} parsed incorrectly"));
        }
    }
    Ok(())
}

#[test]
fn warehouse_ssl_mode_rejects_unknown_setting() -> TestResult {
    let content = VALID_CONFIG.replace(
        "secret = \"prod/redshift/lifecycle\"",
        "secret = \"prod/redshift/lifecycle\"\nssl_mode = \"verify-full\"",
    );
    assert_invalid(LifecycleConfig::parse(&content), "config parse error")
}
