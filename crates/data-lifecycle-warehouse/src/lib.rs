// crates/data-lifecycle-warehouse/src/lib.rs
// ============================================================================
// Module: Data Lifecycle Warehouse
// Description: Redshift access for the data lifecycle job.
// Purpose: Resolve credentials, execute procedure calls, install procedures.
// Dependencies: aws-sdk-secretsmanager, postgres, rustls, data-lifecycle-core
// ============================================================================

//! ## Overview
//! [`RedshiftExecutor`] implements the core
//! [`data_lifecycle_core::WarehouseExecutor`] contract over a blocking
//! Postgres connection. Credentials come from
//! [`SecretsManagerCredentialSource`]; [`install_procedure`] loads the
//! lifecycle procedure into a schema.

pub mod credentials;
pub mod error;
pub mod executor;
pub mod install;

pub use credentials::SecretsManagerCredentialSource;
pub use credentials::WarehouseCredentials;
pub use error::WarehouseError;
pub use executor::PROCEDURE_RESULT_COLUMNS;
pub use executor::RedshiftExecutor;
pub use executor::RedshiftSessionConfig;
pub use executor::SslMode;
pub use executor::analyze_statement;
pub use executor::outcome_from_columns;
pub use executor::tls_connector;
pub use executor::vacuum_statement;
pub use install::SCHEMA_PLACEHOLDER;
pub use install::install_procedure;
pub use install::render_install_script;
