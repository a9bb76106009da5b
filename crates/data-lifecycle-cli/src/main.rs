// crates/data-lifecycle-cli/src/main.rs
// ============================================================================
// Module: Data Lifecycle CLI Entry Point
// Description: Command dispatcher for the data lifecycle job and its tooling.
// Purpose: Run the lifecycle job and manage its config table and procedure.
// Dependencies: clap, data-lifecycle-core, data-lifecycle-config,
// data-lifecycle-store-dynamodb, data-lifecycle-warehouse, thiserror.
// ============================================================================

//! ## Overview
//! `data-lifecycle run` executes the lifecycle procedure once per config
//! row and persists checkpoints. `validate` and `render` inspect config rows
//! without touching the warehouse, `ingest` loads rows from CSV into the
//! config table, and `install-procedure` installs the warehouse procedure.
//! Every command reads the TOML job configuration and layers command-line
//! values over it.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod input;
#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use data_lifecycle_config::ConfigOverrides;
use data_lifecycle_config::LifecycleConfig;
use data_lifecycle_config::WarehouseSslMode;
use data_lifecycle_core::CompositeRunLogSink;
use data_lifecycle_core::ConfigRecord;
use data_lifecycle_core::FileRunLogSink;
use data_lifecycle_core::LogFormat;
use data_lifecycle_core::PlannedRow;
use data_lifecycle_core::RawItem;
use data_lifecycle_core::RunLogSink;
use data_lifecycle_core::RunSummary;
use data_lifecycle_core::StderrRunLogSink;
use data_lifecycle_core::TableKey;
use data_lifecycle_core::plan_rows;
use data_lifecycle_core::run as run_job;
use data_lifecycle_core::scan_all;
use data_lifecycle_store_dynamodb::DynamoDbConfigStore;
use data_lifecycle_store_dynamodb::DynamoDbConfigStoreConfig;
use data_lifecycle_store_dynamodb::TableReadiness;
use data_lifecycle_warehouse::RedshiftExecutor;
use data_lifecycle_warehouse::RedshiftSessionConfig;
use data_lifecycle_warehouse::SecretsManagerCredentialSource;
use data_lifecycle_warehouse::SslMode;
use data_lifecycle_warehouse::install_procedure;
use thiserror::Error;

use crate::input::CsvRow;
use crate::input::InputLocation;
use crate::input::MAX_INPUT_BYTES;
use crate::input::decode_text;
use crate::input::parse_csv_items;
use crate::input::parse_json_items;
use crate::input::read_bytes_with_limit;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "data-lifecycle", version, disable_help_subcommand = true)]
struct Cli {
    /// Job configuration values shared by every command.
    #[command(flatten)]
    global: GlobalArgs,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Configuration flags accepted by every command.
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Config file path (defaults to `DATA_LIFECYCLE_CONFIG`, then `data-lifecycle.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Secrets Manager secret holding warehouse credentials.
    #[arg(long, value_name = "SECRET", global = true)]
    secret: Option<String>,
    /// IAM role the warehouse assumes for unloads.
    #[arg(long, value_name = "ARN", global = true)]
    role_arn: Option<String>,
    /// Default unload region.
    #[arg(long, value_name = "REGION", global = true)]
    region_name: Option<String>,
    /// Config store table.
    #[arg(long, value_name = "TABLE", global = true)]
    dynamodb_table_name: Option<String>,
    /// Schema owning the lifecycle procedure.
    #[arg(long, value_name = "SCHEMA", global = true)]
    redshift_schema: Option<String>,
}

impl GlobalArgs {
    /// Returns the command-line overrides.
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            secret: self.secret.clone(),
            role_arn: self.role_arn.clone(),
            region_name: self.region_name.clone(),
            dynamodb_table_name: self.dynamodb_table_name.clone(),
            redshift_schema: self.redshift_schema.clone(),
        }
    }
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Process every config row against the warehouse.
    Run,
    /// Validate config rows and report every invalid one.
    Validate(InspectCommand),
    /// Print the procedure call each valid row would execute.
    Render(InspectCommand),
    /// Load config rows from a CSV file into the config table.
    Ingest(IngestCommand),
    /// Install the lifecycle procedure into the target schema.
    InstallProcedure(InstallCommand),
}

/// Arguments for commands that inspect config rows.
#[derive(Args, Debug)]
struct InspectCommand {
    /// JSON array of config objects to use instead of the config table.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,
}

/// Arguments for `ingest`.
#[derive(Args, Debug)]
struct IngestCommand {
    /// CSV source: a local path or `s3://bucket/key`.
    #[arg(long, value_name = "SOURCE")]
    csv: String,
}

/// Arguments for `install-procedure`.
#[derive(Args, Debug)]
struct InstallCommand {
    /// Procedure script: a local path or `s3://bucket/key`.
    #[arg(long, value_name = "SOURCE")]
    script: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for operator-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// Wraps any displayable error.
fn cli_error(err: impl Display) -> CliError {
    CliError::new(err.to_string())
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli.global)?;
    match cli.command {
        Commands::Run => command_run(&config),
        Commands::Validate(command) => command_validate(&config, &command),
        Commands::Render(command) => command_render(&config, &command),
        Commands::Ingest(command) => command_ingest(&config, &command),
        Commands::InstallProcedure(command) => command_install(&config, &command),
    }
}

/// Loads the config file and applies command-line overrides.
fn load_config(global: &GlobalArgs) -> CliResult<LifecycleConfig> {
    let mut config = LifecycleConfig::load(global.config.as_deref()).map_err(cli_error)?;
    config.apply_overrides(&global.overrides());
    config.logging.validate().map_err(cli_error)?;
    Ok(config)
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(config: &LifecycleConfig) -> CliResult<ExitCode> {
    config.validate().map_err(cli_error)?;
    let options = config.run_options().map_err(cli_error)?;
    let sink = build_sink(config)?;
    let mut executor = connect_warehouse(config)?;
    let store = open_store(config)?;
    let summary = run_job(&store, &mut executor, &options, &sink).map_err(cli_error)?;
    if let Err(err) = executor.close() {
        write_stderr_line(&format!("ERROR: {err}")).map_err(|err| output_error("stderr", &err))?;
    }
    write_stdout_line(&summary_line(&summary, config.logging.format)?)
        .map_err(|err| output_error("stdout", &err))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the stderr sink plus the optional audit file sink.
fn build_sink(config: &LifecycleConfig) -> CliResult<CompositeRunLogSink> {
    let stderr: Arc<dyn RunLogSink> = Arc::new(StderrRunLogSink::new(config.logging.format));
    let mut sink = CompositeRunLogSink::new(vec![stderr]);
    if let Some(path) = &config.logging.audit_path {
        let file = FileRunLogSink::new(path).map_err(|err| {
            CliError::new(format!("failed to open audit log {}: {err}", path.display()))
        })?;
        sink.push(Arc::new(file));
    }
    Ok(sink)
}

/// Renders the run summary in the configured log format.
fn summary_line(summary: &RunSummary, format: LogFormat) -> CliResult<String> {
    match format {
        LogFormat::Text => Ok(summary.render()),
        LogFormat::Json => serde_json::to_string(summary).map_err(cli_error),
    }
}

/// Resolves credentials and opens the warehouse connection.
fn connect_warehouse(config: &LifecycleConfig) -> CliResult<RedshiftExecutor> {
    let secret = config.secret().map_err(cli_error)?;
    let source =
        SecretsManagerCredentialSource::new(config.job.region_name.as_deref()).map_err(cli_error)?;
    let credentials = source.fetch(secret).map_err(cli_error)?;
    RedshiftExecutor::connect(&credentials, &session_config(config)).map_err(cli_error)
}

/// Returns warehouse session settings.
fn session_config(config: &LifecycleConfig) -> RedshiftSessionConfig {
    RedshiftSessionConfig {
        statement_timeout_ms: config.warehouse.statement_timeout_ms,
        connect_timeout_ms: config.warehouse.connect_timeout_ms,
        application_name: config.warehouse.application_name.clone(),
        ssl_mode: ssl_mode(config.warehouse.ssl_mode),
    }
}

/// Maps the configured transport security onto the executor setting.
const fn ssl_mode(mode: WarehouseSslMode) -> SslMode {
    match mode {
        WarehouseSslMode::Disable => SslMode::Disable,
        WarehouseSslMode::Prefer => SslMode::Prefer,
        WarehouseSslMode::Require => SslMode::Require,
    }
}

/// Maps config store settings onto the DynamoDB store configuration.
fn store_config(config: &LifecycleConfig) -> CliResult<DynamoDbConfigStoreConfig> {
    config.config_store.validate().map_err(cli_error)?;
    let store = &config.config_store;
    Ok(DynamoDbConfigStoreConfig {
        table_name: config.table_name().map_err(cli_error)?.to_string(),
        region: config.store_region().map(str::to_string),
        endpoint: store.endpoint.clone(),
        scan_page_size: store.scan_page_size,
        read_capacity_units: store.read_capacity_units,
        write_capacity_units: store.write_capacity_units,
        table_ready_timeout_ms: store.table_ready_timeout_ms,
        table_poll_interval_ms: store.table_poll_interval_ms,
    })
}

/// Opens the DynamoDB config store.
fn open_store(config: &LifecycleConfig) -> CliResult<DynamoDbConfigStore> {
    DynamoDbConfigStore::new(store_config(config)?).map_err(cli_error)
}

// ============================================================================
// SECTION: Inspect Commands
// ============================================================================

/// Executes the `validate` command.
fn command_validate(config: &LifecycleConfig, command: &InspectCommand) -> CliResult<ExitCode> {
    let items = load_items(config, command)?;
    let (lines, invalid) = validation_report(&items);
    for line in &lines {
        write_stdout_line(line).map_err(|err| output_error("stdout", &err))?;
    }
    write_stdout_line(&format!("{} row(s) checked, {invalid} invalid", items.len()))
        .map_err(|err| output_error("stdout", &err))?;
    Ok(if invalid == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Executes the `render` command.
fn command_render(config: &LifecycleConfig, command: &InspectCommand) -> CliResult<ExitCode> {
    config.job.validate().map_err(cli_error)?;
    let context = config.command_context().map_err(cli_error)?;
    let items = load_items(config, command)?;
    let planned = plan_rows(items, &context);
    let (statements, skipped) = render_report(&planned);
    for line in &skipped {
        write_stderr_line(line).map_err(|err| output_error("stderr", &err))?;
    }
    for statement in &statements {
        write_stdout_line(statement).map_err(|err| output_error("stdout", &err))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Loads items from `--input` or by scanning the config table.
fn load_items(config: &LifecycleConfig, command: &InspectCommand) -> CliResult<Vec<RawItem>> {
    if let Some(path) = &command.input {
        let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES).map_err(cli_error)?;
        return parse_json_items(decode_text(&bytes).map_err(cli_error)?).map_err(cli_error);
    }
    let store = open_store(config)?;
    scan_all(&store).map_err(cli_error)
}

/// Labels a row by its table key or its position.
fn row_label(index: usize, key: Option<&TableKey>) -> String {
    key.map_or_else(|| format!("row {}", index + 1), ToString::to_string)
}

/// Validates each item; returns report lines and the invalid count.
fn validation_report(items: &[RawItem]) -> (Vec<String>, usize) {
    let mut invalid = 0;
    let lines = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let label = row_label(index, TableKey::from_raw(item).as_ref());
            match ConfigRecord::from_raw(item) {
                Ok(_) => format!("VALID: {label}"),
                Err(err) => {
                    invalid += 1;
                    format!("INVALID: {label}: {err}")
                }
            }
        })
        .collect();
    (lines, invalid)
}

/// Splits planned rows into statements and skip notices.
fn render_report(planned: &[PlannedRow]) -> (Vec<String>, Vec<String>) {
    let mut statements = Vec::new();
    let mut skipped = Vec::new();
    for (index, row) in planned.iter().enumerate() {
        match &row.result {
            Ok((_, statement)) => statements.push(statement.clone()),
            Err(err) => skipped
                .push(format!("ERROR: skipping {}: {err}", row_label(index, row.key.as_ref()))),
        }
    }
    (statements, skipped)
}

// ============================================================================
// SECTION: Ingest Command
// ============================================================================

/// Executes the `ingest` command.
fn command_ingest(config: &LifecycleConfig, command: &IngestCommand) -> CliResult<ExitCode> {
    let store_config = store_config(config)?;
    let location = InputLocation::parse(&command.csv).map_err(cli_error)?;
    let bytes = location.read(config.store_region()).map_err(cli_error)?;
    let rows = parse_csv_items(decode_text(&bytes).map_err(cli_error)?).map_err(cli_error)?;
    let (items, rejected) = validated_items(rows);
    for line in &rejected {
        write_stderr_line(line).map_err(|err| output_error("stderr", &err))?;
    }
    let store = DynamoDbConfigStore::new(store_config).map_err(cli_error)?;
    if store.ensure_table().map_err(cli_error)? == TableReadiness::Created {
        write_stderr_line(&format!("INFO: Created config table {}", store.table_name()))
            .map_err(|err| output_error("stderr", &err))?;
    }
    let report = store.put_items(&items).map_err(cli_error)?;
    write_stdout_line(&format!(
        "Wrote {} item(s) to {} in {} request(s); {} row(s) rejected",
        report.written,
        store.table_name(),
        report.requests,
        rejected.len()
    ))
    .map_err(|err| output_error("stdout", &err))?;
    Ok(ExitCode::SUCCESS)
}

/// Validates CSV rows; returns normalized items and rejection notices.
fn validated_items(rows: Vec<CsvRow>) -> (Vec<RawItem>, Vec<String>) {
    let mut items = Vec::new();
    let mut rejected = Vec::new();
    for row in rows {
        let outcome = row
            .item
            .and_then(|item| ConfigRecord::from_raw(&item).map_err(|err| err.to_string()));
        match outcome {
            Ok(record) => items.push(record.to_raw_item()),
            Err(err) => rejected.push(format!("ERROR: csv row {}: {err}", row.number)),
        }
    }
    (items, rejected)
}

// ============================================================================
// SECTION: Install Command
// ============================================================================

/// Executes the `install-procedure` command.
fn command_install(config: &LifecycleConfig, command: &InstallCommand) -> CliResult<ExitCode> {
    let schema = config.target_schema().map_err(cli_error)?;
    config.warehouse.validate().map_err(cli_error)?;
    let location = InputLocation::parse(&command.script).map_err(cli_error)?;
    let bytes = location.read(config.job.region_name.as_deref()).map_err(cli_error)?;
    let script = decode_text(&bytes).map_err(cli_error)?;
    let mut executor = connect_warehouse(config)?;
    install_procedure(&mut executor, script, schema).map_err(cli_error)?;
    executor.close().map_err(cli_error)?;
    write_stdout_line(&format!("Lifecycle procedure installed in schema {schema}"))
        .map_err(|err| output_error("stdout", &err))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> CliError {
    CliError::new(format!("failed to write to {stream}: {error}"))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
