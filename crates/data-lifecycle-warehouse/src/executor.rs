// crates/data-lifecycle-warehouse/src/executor.rs
// ============================================================================
// Module: Redshift Executor
// Description: Warehouse executor over the Postgres wire protocol.
// Purpose: Run lifecycle procedure calls and table maintenance statements.
// Dependencies: postgres, rustls, tokio-postgres-rustls, data-lifecycle-core
// ============================================================================

//! ## Overview
//! One connection is opened per run. Procedure calls go through the simple
//! query protocol so every result column arrives as text; the first row is
//! read positionally as `(units_processed, row_count, new_checkpoint)`.
//! `VACUUM` cannot run inside a transaction block, so maintenance commits
//! before and after it.
//!
//! Unless TLS is disabled the connection negotiates it through rustls,
//! verifying the server against the bundled web PKI roots.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use data_lifecycle_core::ExecutorError;
use data_lifecycle_core::ProcedureOutcome;
use data_lifecycle_core::TableKey;
use data_lifecycle_core::WarehouseExecutor;
use postgres::Client;
use postgres::NoTls;
use postgres::SimpleQueryMessage;
use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls::crypto::aws_lc_rs;
use tokio_postgres_rustls::MakeRustlsConnect;

use crate::credentials::WarehouseCredentials;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Result columns the lifecycle procedure must return.
pub const PROCEDURE_RESULT_COLUMNS: usize = 3;
/// Text used for a NULL count column.
const NULL_TEXT: &str = "NULL";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Transport security for the warehouse connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    /// Plaintext only.
    Disable,
    /// TLS when the server offers it, plaintext otherwise.
    #[default]
    Prefer,
    /// TLS or fail.
    Require,
}

impl SslMode {
    /// Returns the driver's negotiation mode.
    #[must_use]
    pub const fn negotiation(self) -> postgres::config::SslMode {
        match self {
            Self::Disable => postgres::config::SslMode::Disable,
            Self::Prefer => postgres::config::SslMode::Prefer,
            Self::Require => postgres::config::SslMode::Require,
        }
    }
}

/// Session settings for the warehouse connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedshiftSessionConfig {
    /// Statement timeout applied right after connecting.
    pub statement_timeout_ms: u64,
    /// Connect timeout.
    pub connect_timeout_ms: u64,
    /// Application name reported to the warehouse.
    pub application_name: String,
    /// Transport security.
    pub ssl_mode: SslMode,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Warehouse executor backed by a single blocking Postgres client.
pub struct RedshiftExecutor {
    /// Open warehouse connection.
    client: Client,
}

impl RedshiftExecutor {
    /// Connects and applies the session statement timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Connection`] when the connection or the
    /// timeout statement fails.
    pub fn connect(
        credentials: &WarehouseCredentials,
        session: &RedshiftSessionConfig,
    ) -> Result<Self, ExecutorError> {
        let mut pg_config = postgres::Config::new();
        pg_config
            .host(&credentials.host)
            .port(credentials.port)
            .dbname(&credentials.database)
            .user(&credentials.username)
            .password(&credentials.password)
            .application_name(&session.application_name)
            .connect_timeout(Duration::from_millis(session.connect_timeout_ms))
            .ssl_mode(session.ssl_mode.negotiation());
        let connected = match session.ssl_mode {
            SslMode::Disable => pg_config.connect(NoTls),
            SslMode::Prefer | SslMode::Require => pg_config.connect(tls_connector()?),
        };
        let mut client = connected.map_err(|err| ExecutorError::Connection(err.to_string()))?;
        client
            .batch_execute(&statement_timeout_statement(session.statement_timeout_ms))
            .map_err(|err| ExecutorError::Connection(err.to_string()))?;
        Ok(Self { client })
    }

    /// Runs a script inside one transaction; rolls back on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Statement`] when any statement fails or the
    /// commit is rejected.
    pub fn execute_in_transaction(&mut self, script: &str) -> Result<(), ExecutorError> {
        let mut transaction =
            self.client.transaction().map_err(|err| ExecutorError::Statement(err.to_string()))?;
        transaction.batch_execute(script).map_err(|err| ExecutorError::Statement(err.to_string()))?;
        transaction.commit().map_err(|err| ExecutorError::Statement(err.to_string()))
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::Connection`] when the terminate message fails.
    pub fn close(self) -> Result<(), ExecutorError> {
        self.client.close().map_err(|err| ExecutorError::Connection(err.to_string()))
    }

    /// Runs one statement, discarding any result.
    fn execute(&mut self, statement: &str) -> Result<(), ExecutorError> {
        self.client.batch_execute(statement).map_err(|err| ExecutorError::Statement(err.to_string()))
    }
}

impl WarehouseExecutor for RedshiftExecutor {
    fn call_procedure(&mut self, statement: &str) -> Result<ProcedureOutcome, ExecutorError> {
        let messages = self
            .client
            .simple_query(statement)
            .map_err(|err| ExecutorError::Statement(err.to_string()))?;
        let row = messages
            .iter()
            .find_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(row),
                _ => None,
            })
            .ok_or_else(|| ExecutorError::Result("procedure returned no row".to_string()))?;
        let mut columns = Vec::with_capacity(row.len());
        for index in 0 .. row.len() {
            columns.push(row.try_get(index).map_err(|err| ExecutorError::Result(err.to_string()))?);
        }
        outcome_from_columns(&columns)
    }

    fn settle(&mut self) -> Result<(), ExecutorError> {
        self.execute("COMMIT")
    }

    fn vacuum(&mut self, table: &TableKey) -> Result<(), ExecutorError> {
        self.execute("COMMIT")?;
        self.execute(&vacuum_statement(table))?;
        self.execute("COMMIT")
    }

    fn analyze(&mut self, table: &TableKey) -> Result<(), ExecutorError> {
        self.execute(&analyze_statement(table))
    }
}

// ============================================================================
// SECTION: TLS
// ============================================================================

/// Builds a rustls connector trusting the bundled web PKI roots.
///
/// # Errors
///
/// Returns [`ExecutorError::Connection`] when the crypto provider rejects
/// the default protocol versions.
pub fn tls_connector() -> Result<MakeRustlsConnect, ExecutorError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|err| ExecutorError::Connection(format!("tls setup failed: {err}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(MakeRustlsConnect::new(config))
}

// ============================================================================
// SECTION: Statements
// ============================================================================

/// Session statement bounding every later statement.
#[must_use]
pub fn statement_timeout_statement(timeout_ms: u64) -> String {
    format!("set statement_timeout = {timeout_ms}")
}

/// Storage reclaim statement for a table.
#[must_use]
pub fn vacuum_statement(table: &TableKey) -> String {
    format!("VACUUM {}.{}", table.schema_name, table.table_name)
}

/// Statistics refresh statement for a table.
#[must_use]
pub fn analyze_statement(table: &TableKey) -> String {
    format!("ANALYZE {}.{}", table.schema_name, table.table_name)
}

/// Reads the procedure result columns positionally.
///
/// # Errors
///
/// Returns [`ExecutorError::Result`] when fewer than three columns arrived.
pub fn outcome_from_columns(columns: &[Option<&str>]) -> Result<ProcedureOutcome, ExecutorError> {
    let [units, rows, checkpoint, ..] = columns else {
        return Err(ExecutorError::Result(format!(
            "procedure returned {} column(s), expected {PROCEDURE_RESULT_COLUMNS}",
            columns.len()
        )));
    };
    Ok(ProcedureOutcome::from_columns(
        units.unwrap_or(NULL_TEXT),
        rows.unwrap_or(NULL_TEXT),
        *checkpoint,
    ))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
