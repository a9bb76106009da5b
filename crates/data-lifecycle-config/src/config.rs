// crates/data-lifecycle-config/src/config.rs
// ============================================================================
// Module: Data Lifecycle Configuration
// Description: Configuration loading, overrides, and validation.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: data-lifecycle-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overlaid with command-line values. When neither an explicit path nor
//! the environment override is given and the default file is absent, the
//! configuration is built from overrides alone. Validation rejects missing
//! required values and out-of-range limits before anything connects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use data_lifecycle_core::CommandContext;
use data_lifecycle_core::LogFormat;
use data_lifecycle_core::RunOptions;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "data-lifecycle.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DATA_LIFECYCLE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum warehouse identifier length.
pub(crate) const MAX_IDENTIFIER_LENGTH: usize = 127;
/// Minimum config table name length.
pub(crate) const MIN_TABLE_NAME_LENGTH: usize = 3;
/// Maximum config table name length.
pub(crate) const MAX_TABLE_NAME_LENGTH: usize = 255;

/// Default statement timeout applied to the warehouse session.
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 1_200_000;
/// Minimum statement timeout.
pub(crate) const MIN_STATEMENT_TIMEOUT_MS: u64 = 1_000;
/// Maximum statement timeout.
pub(crate) const MAX_STATEMENT_TIMEOUT_MS: u64 = 86_400_000;
/// Default warehouse connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
/// Minimum warehouse connect timeout.
pub(crate) const MIN_CONNECT_TIMEOUT_MS: u64 = 100;
/// Maximum warehouse connect timeout.
pub(crate) const MAX_CONNECT_TIMEOUT_MS: u64 = 120_000;
/// Default warehouse session application name.
pub const DEFAULT_APPLICATION_NAME: &str = "data-lifecycle";

/// Maximum items per config store scan page.
pub(crate) const MAX_SCAN_PAGE_SIZE: u32 = 1_000;
/// Default provisioned capacity for a newly created config table.
pub const DEFAULT_CAPACITY_UNITS: i64 = 5;
/// Default wait for a newly created config table to become active.
pub const DEFAULT_TABLE_READY_TIMEOUT_MS: u64 = 300_000;
/// Default poll interval while waiting for the config table.
pub const DEFAULT_TABLE_POLL_INTERVAL_MS: u64 = 3_000;
/// Minimum poll interval while waiting for the config table.
pub(crate) const MIN_TABLE_POLL_INTERVAL_MS: u64 = 100;
/// Maximum poll interval while waiting for the config table.
pub(crate) const MAX_TABLE_POLL_INTERVAL_MS: u64 = 60_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root job configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Statement generation and run behavior.
    #[serde(default)]
    pub job: JobConfig,
    /// Warehouse connection settings.
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    /// Config store settings.
    #[serde(default)]
    pub config_store: ConfigStoreConfig,
    /// Run log settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Job-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Schema owning the lifecycle procedure.
    #[serde(default)]
    pub redshift_schema: Option<String>,
    /// IAM role the warehouse assumes for unloads.
    #[serde(default)]
    pub role_arn: Option<String>,
    /// Default unload region.
    #[serde(default)]
    pub region_name: Option<String>,
    /// Reject malformed numeric fields before execution.
    #[serde(default = "default_true")]
    pub preflight_numeric_checks: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            redshift_schema: None,
            role_arn: None,
            region_name: None,
            preflight_numeric_checks: true,
        }
    }
}

/// Warehouse connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// Secrets Manager identifier holding connection credentials.
    #[serde(default)]
    pub secret: Option<String>,
    /// Session statement timeout in milliseconds.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Session application name.
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Transport security for the warehouse connection.
    #[serde(default)]
    pub ssl_mode: WarehouseSslMode,
}

/// Transport security negotiated with the warehouse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseSslMode {
    /// Plaintext only.
    Disable,
    /// TLS when the server offers it, plaintext otherwise.
    #[default]
    Prefer,
    /// TLS or fail.
    Require,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            secret: None,
            statement_timeout_ms: DEFAULT_STATEMENT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            ssl_mode: WarehouseSslMode::default(),
        }
    }
}

/// Config store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigStoreConfig {
    /// Table holding one config item per warehouse table.
    #[serde(default)]
    pub table_name: Option<String>,
    /// Region override for the store; defaults to the job region.
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override, for local emulators.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Items per scan page; the service default when unset.
    #[serde(default)]
    pub scan_page_size: Option<u32>,
    /// Read capacity for a newly created table.
    #[serde(default = "default_capacity_units")]
    pub read_capacity_units: i64,
    /// Write capacity for a newly created table.
    #[serde(default = "default_capacity_units")]
    pub write_capacity_units: i64,
    /// Wait for a new table to become active, in milliseconds.
    #[serde(default = "default_table_ready_timeout_ms")]
    pub table_ready_timeout_ms: u64,
    /// Poll interval while waiting for the table, in milliseconds.
    #[serde(default = "default_table_poll_interval_ms")]
    pub table_poll_interval_ms: u64,
}

impl Default for ConfigStoreConfig {
    fn default() -> Self {
        Self {
            table_name: None,
            region: None,
            endpoint: None,
            scan_page_size: None,
            read_capacity_units: DEFAULT_CAPACITY_UNITS,
            write_capacity_units: DEFAULT_CAPACITY_UNITS,
            table_ready_timeout_ms: DEFAULT_TABLE_READY_TIMEOUT_MS,
            table_poll_interval_ms: DEFAULT_TABLE_POLL_INTERVAL_MS,
        }
    }
}

/// Run log settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Stderr line format.
    #[serde(default)]
    pub format: LogFormat,
    /// Optional JSON-lines file receiving every event as well.
    #[serde(default)]
    pub audit_path: Option<PathBuf>,
}

/// Command-line values layered over the file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Warehouse credential secret.
    pub secret: Option<String>,
    /// Unload IAM role.
    pub role_arn: Option<String>,
    /// Default region.
    pub region_name: Option<String>,
    /// Config store table.
    pub dynamodb_table_name: Option<String>,
    /// Procedure schema.
    pub redshift_schema: Option<String>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl LifecycleConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or parsing fails. The result is
    /// not validated; call [`LifecycleConfig::validate`] after overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads, applies overrides, and validates in one step.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_overrides(
        path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Replaces file values with any command-line values that are set.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        overlay(&mut self.warehouse.secret, overrides.secret.as_ref());
        overlay(&mut self.job.role_arn, overrides.role_arn.as_ref());
        overlay(&mut self.job.region_name, overrides.region_name.as_ref());
        overlay(&mut self.config_store.table_name, overrides.dynamodb_table_name.as_ref());
        overlay(&mut self.job.redshift_schema, overrides.redshift_schema.as_ref());
    }

    /// Validates the configuration for completeness and limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.job.validate()?;
        self.warehouse.validate()?;
        self.config_store.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the statement generation context.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a required job value is missing.
    pub fn command_context(&self) -> Result<CommandContext, ConfigError> {
        Ok(CommandContext::new(
            required("job.redshift_schema", self.job.redshift_schema.as_deref())?,
            required("job.role_arn", self.job.role_arn.as_deref())?,
            required("job.region_name", self.job.region_name.as_deref())?,
        ))
    }

    /// Returns row loop options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a required job value is missing.
    pub fn run_options(&self) -> Result<RunOptions, ConfigError> {
        Ok(RunOptions {
            context: self.command_context()?,
            preflight_numeric_checks: self.job.preflight_numeric_checks,
        })
    }

    /// Returns the warehouse credential secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no secret is configured.
    pub fn secret(&self) -> Result<&str, ConfigError> {
        required("warehouse.secret", self.warehouse.secret.as_deref())
    }

    /// Returns the config store table name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no table is configured.
    pub fn table_name(&self) -> Result<&str, ConfigError> {
        required("config_store.table_name", self.config_store.table_name.as_deref())
    }

    /// Returns the validated procedure schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the schema is missing or unsafe.
    pub fn target_schema(&self) -> Result<&str, ConfigError> {
        let schema = required("job.redshift_schema", self.job.redshift_schema.as_deref())?;
        validate_identifier("job.redshift_schema", schema)?;
        Ok(schema)
    }

    /// Returns the config store region, falling back to the job region.
    #[must_use]
    pub fn store_region(&self) -> Option<&str> {
        self.config_store.region.as_deref().or(self.job.region_name.as_deref())
    }
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

impl JobConfig {
    /// Validates job settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let schema = required("job.redshift_schema", self.redshift_schema.as_deref())?;
        validate_identifier("job.redshift_schema", schema)?;
        let role_arn = required("job.role_arn", self.role_arn.as_deref())?;
        if !role_arn.starts_with("arn:") {
            return Err(ConfigError::Invalid("job.role_arn must start with 'arn:'".to_string()));
        }
        required("job.region_name", self.region_name.as_deref())?;
        Ok(())
    }
}

impl WarehouseConfig {
    /// Validates warehouse settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        required("warehouse.secret", self.secret.as_deref())?;
        validate_range(
            "warehouse.statement_timeout_ms",
            self.statement_timeout_ms,
            MIN_STATEMENT_TIMEOUT_MS,
            MAX_STATEMENT_TIMEOUT_MS,
        )?;
        validate_range(
            "warehouse.connect_timeout_ms",
            self.connect_timeout_ms,
            MIN_CONNECT_TIMEOUT_MS,
            MAX_CONNECT_TIMEOUT_MS,
        )?;
        if self.application_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "warehouse.application_name must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl ConfigStoreConfig {
    /// Validates config store settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let table_name = required("config_store.table_name", self.table_name.as_deref())?;
        let valid_chars = table_name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
        if !valid_chars
            || !(MIN_TABLE_NAME_LENGTH ..= MAX_TABLE_NAME_LENGTH).contains(&table_name.len())
        {
            return Err(ConfigError::Invalid(format!(
                "config_store.table_name must be {MIN_TABLE_NAME_LENGTH}-{MAX_TABLE_NAME_LENGTH} \
                 characters of [A-Za-z0-9_.-]"
            )));
        }
        if let Some(size) = self.scan_page_size
            && !(1 ..= MAX_SCAN_PAGE_SIZE).contains(&size)
        {
            return Err(ConfigError::Invalid(format!(
                "config_store.scan_page_size must be between 1 and {MAX_SCAN_PAGE_SIZE}"
            )));
        }
        if self.read_capacity_units < 1 || self.write_capacity_units < 1 {
            return Err(ConfigError::Invalid(
                "config_store capacity units must be at least 1".to_string(),
            ));
        }
        validate_range(
            "config_store.table_poll_interval_ms",
            self.table_poll_interval_ms,
            MIN_TABLE_POLL_INTERVAL_MS,
            MAX_TABLE_POLL_INTERVAL_MS,
        )?;
        if self.table_ready_timeout_ms < self.table_poll_interval_ms {
            return Err(ConfigError::Invalid(
                "config_store.table_ready_timeout_ms must be at least the poll interval"
                    .to_string(),
            ));
        }
        if let Some(endpoint) = &self.endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(
                "config_store.endpoint must be an http(s) url".to_string(),
            ));
        }
        Ok(())
    }
}

impl LoggingConfig {
    /// Validates logging settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.audit_path {
            validate_path_string("logging.audit_path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default for boolean options that are on unless disabled.
const fn default_true() -> bool {
    true
}

/// Default statement timeout in milliseconds.
const fn default_statement_timeout_ms() -> u64 {
    DEFAULT_STATEMENT_TIMEOUT_MS
}

/// Default connect timeout in milliseconds.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default session application name.
fn default_application_name() -> String {
    DEFAULT_APPLICATION_NAME.to_string()
}

/// Default provisioned capacity units.
const fn default_capacity_units() -> i64 {
    DEFAULT_CAPACITY_UNITS
}

/// Default table ready timeout in milliseconds.
const fn default_table_ready_timeout_ms() -> u64 {
    DEFAULT_TABLE_READY_TIMEOUT_MS
}

/// Default table poll interval in milliseconds.
const fn default_table_poll_interval_ms() -> u64 {
    DEFAULT_TABLE_POLL_INTERVAL_MS
}

/// Replaces `slot` when `value` is set.
fn overlay(slot: &mut Option<String>, value: Option<&String>) {
    if let Some(value) = value {
        *slot = Some(value.clone());
    }
}

/// Returns a trimmed-non-empty required value.
fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Invalid(format!("{field} is required"))),
    }
}

/// Validates a warehouse identifier that is embedded unquoted in statements.
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds {MAX_IDENTIFIER_LENGTH} characters"
        )));
    }
    if !value.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$') {
        return Err(ConfigError::Invalid(format!("{field} must only contain [A-Za-z0-9_$]")));
    }
    Ok(())
}

/// Validates a value against inclusive bounds.
fn validate_range(field: &str, value_ms: u64, min_ms: u64, max_ms: u64) -> Result<(), ConfigError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {min_ms} and {max_ms} milliseconds",
        )));
    }
    Ok(())
}

/// Resolves the config path; the flag is true unless the default was used.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn validate_range_accepts_bounds() {
        assert!(validate_range("t", 100, 100, 200).is_ok());
        assert!(validate_range("t", 200, 100, 200).is_ok());
    }

    #[test]
    fn validate_range_rejects_outside_bounds() {
        let err = validate_range("warehouse.t", 99, 100, 200).unwrap_err();
        assert!(err.to_string().contains("warehouse.t must be between 100 and 200"));
        assert!(validate_range("t", 201, 100, 200).is_err());
    }

    #[test]
    fn identifier_rejects_statement_breaking_characters() {
        assert!(validate_identifier("s", "lifecycle_ops$1").is_ok());
        assert!(validate_identifier("s", "ops; drop").is_err());
        assert!(validate_identifier("s", "ops.proc").is_err());
        assert!(validate_identifier("s", &"a".repeat(128)).is_err());
    }

    #[test]
    fn required_rejects_blank_values() {
        assert!(required("f", Some("  ")).is_err());
        assert!(required("f", None).is_err());
        assert_eq!(required("f", Some("x")).unwrap(), "x");
    }

    #[test]
    fn overlay_keeps_existing_value_when_unset() {
        let mut slot = Some("file".to_string());
        overlay(&mut slot, None);
        assert_eq!(slot.as_deref(), Some("file"));
        overlay(&mut slot, Some(&"flag".to_string()));
        assert_eq!(slot.as_deref(), Some("flag"));
    }
}
