// crates/data-lifecycle-warehouse/src/credentials.rs
// ============================================================================
// Module: Warehouse Credentials
// Description: Connection credentials resolved from Secrets Manager.
// Purpose: Turn a secret reference into validated connection parameters.
// Dependencies: aws-config, aws-sdk-secretsmanager, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! The secret string is a JSON object carrying `host`, `port`, `database`,
//! `username`, and `password`. Secrets written by provisioning tools store
//! the port either as a number or as a string; both are accepted.
//! Credentials never render their password through `Debug`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::thread;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde::Deserialize;
use serde::Deserializer;
use tokio::runtime::Runtime;

use crate::error::WarehouseError;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Warehouse connection credentials.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct WarehouseCredentials {
    /// Cluster endpoint host.
    pub host: String,
    /// Cluster port.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl fmt::Debug for WarehouseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarehouseCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl WarehouseCredentials {
    /// Parses credentials from a secret string.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Credentials`] when the secret is not the
    /// expected JSON object or a required value is empty.
    pub fn from_secret_string(secret: &str) -> Result<Self, WarehouseError> {
        let credentials: Self = serde_json::from_str(secret)
            .map_err(|err| WarehouseError::Credentials(format!("invalid secret: {err}")))?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Rejects credentials with empty connection values.
    fn validate(&self) -> Result<(), WarehouseError> {
        for (name, value) in [
            ("host", &self.host),
            ("database", &self.database),
            ("username", &self.username),
        ] {
            if value.trim().is_empty() {
                return Err(WarehouseError::Credentials(format!("secret {name} is empty")));
            }
        }
        if self.port == 0 {
            return Err(WarehouseError::Credentials("secret port must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Port spelled as a JSON number or a JSON string.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    /// Numeric port.
    Number(u64),
    /// Textual port.
    Text(String),
}

/// Deserializes a port from a number or a numeric string.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let value = PortValue::deserialize(deserializer)?;
    let port = match value {
        PortValue::Number(number) => u16::try_from(number).ok(),
        PortValue::Text(text) => text.trim().parse::<u16>().ok(),
    };
    port.ok_or_else(|| serde::de::Error::custom("port must be an integer between 0 and 65535"))
}

// ============================================================================
// SECTION: Secrets Manager Source
// ============================================================================

/// Resolves credentials from AWS Secrets Manager.
pub struct SecretsManagerCredentialSource {
    /// Secrets Manager client handle.
    client: Client,
    /// Tokio runtime for blocking SDK calls.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for SecretsManagerCredentialSource {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = thread::spawn(move || drop(runtime));
        }
    }
}

impl SecretsManagerCredentialSource {
    /// Creates a source for the given region (environment default when unset).
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::Io`] when the runtime cannot be built.
    pub fn new(region: Option<&str>) -> Result<Self, WarehouseError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| WarehouseError::Io(err.to_string()))?;
        let shared_config = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = region {
                loader = loader.region(Region::new(region.to_string()));
            }
            loader.load().await
        });
        Ok(Self {
            client: Client::new(&shared_config),
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Fetches and parses the credentials stored under `secret_id`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] when the secret cannot be read, has no
    /// string value, or does not parse.
    pub fn fetch(&self, secret_id: &str) -> Result<WarehouseCredentials, WarehouseError> {
        let runtime = self
            .runtime
            .as_deref()
            .ok_or_else(|| WarehouseError::Io("credential source closed".to_string()))?;
        let client = self.client.clone();
        let secret_id = secret_id.to_string();
        let output = runtime.block_on(async move {
            client.get_secret_value().secret_id(secret_id).send().await.map_err(|err| {
                WarehouseError::Secrets(format!("{}", DisplayErrorContext(&err)))
            })
        })?;
        let secret = output.secret_string().ok_or_else(|| {
            WarehouseError::Credentials("secret has no string value".to_string())
        })?;
        WarehouseCredentials::from_secret_string(secret)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
