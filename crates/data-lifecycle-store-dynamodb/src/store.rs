// crates/data-lifecycle-store-dynamodb/src/store.rs
// ============================================================================
// Module: DynamoDB Config Store
// Description: Paged scans, checkpoint updates, table provisioning, ingest.
// Purpose: Back the config store contract with a DynamoDB table.
// Dependencies: aws-config, aws-sdk-dynamodb, data-lifecycle-core, tokio
// ============================================================================

//! ## Overview
//! The table is keyed by `schema_name` (partition) and `table_name` (sort).
//! Scans follow `LastEvaluatedKey` continuation; checkpoint updates touch a
//! single attribute of a single item. [`DynamoDbConfigStore::ensure_table`]
//! creates the table when missing and waits for it to become active, and
//! [`DynamoDbConfigStore::put_items`] loads validated items in batches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeDefinition;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::types::KeySchemaElement;
use aws_sdk_dynamodb::types::KeyType;
use aws_sdk_dynamodb::types::ProvisionedThroughput;
use aws_sdk_dynamodb::types::PutRequest;
use aws_sdk_dynamodb::types::ScalarAttributeType;
use aws_sdk_dynamodb::types::TableStatus;
use aws_sdk_dynamodb::types::WriteRequest;
use data_lifecycle_core::ConfigStore;
use data_lifecycle_core::ConfigStoreError;
use data_lifecycle_core::RawItem;
use data_lifecycle_core::ScanPage;
use data_lifecycle_core::TableKey;
use serde::Deserialize;
use serde::Serialize;
use tokio::runtime::Runtime;

use crate::attribute::attributes_from_item;
use crate::attribute::item_from_attributes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum put requests per batch write call.
pub const BATCH_WRITE_LIMIT: usize = 25;
/// Maximum resubmissions of unprocessed batch items.
const MAX_BATCH_RETRIES: u32 = 5;
/// Base delay between resubmissions of unprocessed items.
const BATCH_RETRY_BASE_DELAY: Duration = Duration::from_millis(100);
/// Partition key attribute.
const PARTITION_KEY: &str = "schema_name";
/// Sort key attribute.
const SORT_KEY: &str = "table_name";
/// Checkpoint update expression.
const CHECKPOINT_UPDATE: &str = "SET checkpoint = :var1";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the DynamoDB config store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamoDbConfigStoreConfig {
    /// Table name.
    pub table_name: String,
    /// AWS region (optional; falls back to environment configuration).
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint URL (for local emulators).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Items per scan page (service default when unset).
    #[serde(default)]
    pub scan_page_size: Option<u32>,
    /// Read capacity for a newly created table.
    pub read_capacity_units: i64,
    /// Write capacity for a newly created table.
    pub write_capacity_units: i64,
    /// Wait for a new table to become active, in milliseconds.
    pub table_ready_timeout_ms: u64,
    /// Poll interval while waiting, in milliseconds.
    pub table_poll_interval_ms: u64,
}

/// Outcome of [`DynamoDbConfigStore::ensure_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableReadiness {
    /// Table already existed.
    Existing,
    /// Table was created and is now active.
    Created,
}

/// Outcome of [`DynamoDbConfigStore::put_items`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Items accepted by the service.
    pub written: usize,
    /// Batch write calls issued, including retries.
    pub requests: usize,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// DynamoDB-backed config store.
pub struct DynamoDbConfigStore {
    /// DynamoDB client handle.
    client: Client,
    /// Store configuration.
    config: DynamoDbConfigStoreConfig,
    /// Tokio runtime for blocking SDK calls.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for DynamoDbConfigStore {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = thread::spawn(move || drop(runtime));
        }
    }
}

impl DynamoDbConfigStore {
    /// Creates a new DynamoDB config store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when initialization fails.
    pub fn new(config: DynamoDbConfigStoreConfig) -> Result<Self, ConfigStoreError> {
        if config.table_name.trim().is_empty() {
            return Err(ConfigStoreError::Invalid("table_name must be set".to_string()));
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| ConfigStoreError::Io(err.to_string()))?;
        let shared_config = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = &config.region {
                loader = loader.region(Region::new(region.clone()));
            }
            if let Some(endpoint) = &config.endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            loader.load().await
        });
        let client = Client::new(&shared_config);
        Ok(Self {
            client,
            config,
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Returns the configured table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Returns the runtime used for blocking calls.
    fn runtime(&self) -> Result<&Runtime, ConfigStoreError> {
        self.runtime
            .as_deref()
            .ok_or_else(|| ConfigStoreError::Store("config store closed".to_string()))
    }

    /// Creates the table when it does not exist and waits until it is active.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when the table cannot be described,
    /// created, or does not become active within the configured timeout.
    pub fn ensure_table(&self) -> Result<TableReadiness, ConfigStoreError> {
        let runtime = self.runtime()?;
        let client = self.client.clone();
        let table_name = self.config.table_name.clone();
        let exists = runtime.block_on(async {
            match client.describe_table().table_name(table_name).send().await {
                Ok(_) => Ok(true),
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|service| service.is_resource_not_found_exception()) =>
                {
                    Ok(false)
                }
                Err(err) => Err(sdk_error(&err)),
            }
        })?;
        if exists {
            return Ok(TableReadiness::Existing);
        }
        self.create_table()?;
        self.wait_for_active()?;
        Ok(TableReadiness::Created)
    }

    /// Issues the create call; a concurrent creation counts as success.
    fn create_table(&self) -> Result<(), ConfigStoreError> {
        let key_schema = vec![
            KeySchemaElement::builder()
                .attribute_name(PARTITION_KEY)
                .key_type(KeyType::Hash)
                .build()
                .map_err(|err| ConfigStoreError::Invalid(err.to_string()))?,
            KeySchemaElement::builder()
                .attribute_name(SORT_KEY)
                .key_type(KeyType::Range)
                .build()
                .map_err(|err| ConfigStoreError::Invalid(err.to_string()))?,
        ];
        let definitions = vec![
            AttributeDefinition::builder()
                .attribute_name(PARTITION_KEY)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|err| ConfigStoreError::Invalid(err.to_string()))?,
            AttributeDefinition::builder()
                .attribute_name(SORT_KEY)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|err| ConfigStoreError::Invalid(err.to_string()))?,
        ];
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(self.config.read_capacity_units)
            .write_capacity_units(self.config.write_capacity_units)
            .build()
            .map_err(|err| ConfigStoreError::Invalid(err.to_string()))?;
        let client = self.client.clone();
        let table_name = self.config.table_name.clone();
        self.runtime()?.block_on(async {
            let result = client
                .create_table()
                .table_name(table_name)
                .set_key_schema(Some(key_schema))
                .set_attribute_definitions(Some(definitions))
                .provisioned_throughput(throughput)
                .send()
                .await;
            match result {
                Ok(_) => Ok(()),
                Err(err)
                    if err
                        .as_service_error()
                        .is_some_and(|service| service.is_resource_in_use_exception()) =>
                {
                    Ok(())
                }
                Err(err) => Err(sdk_error(&err)),
            }
        })
    }

    /// Polls the table status until it is active or the timeout elapses.
    fn wait_for_active(&self) -> Result<(), ConfigStoreError> {
        let timeout = Duration::from_millis(self.config.table_ready_timeout_ms);
        let interval = Duration::from_millis(self.config.table_poll_interval_ms);
        let started = Instant::now();
        loop {
            thread::sleep(interval);
            let client = self.client.clone();
            let table_name = self.config.table_name.clone();
            let active = self.runtime()?.block_on(async {
                let output = client
                    .describe_table()
                    .table_name(table_name)
                    .send()
                    .await
                    .map_err(|err| sdk_error(&err))?;
                let status = output.table().and_then(|table| table.table_status());
                Ok::<bool, ConfigStoreError>(status == Some(&TableStatus::Active))
            })?;
            if active {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(ConfigStoreError::Store(format!(
                    "table {} not active after {} ms",
                    self.config.table_name, self.config.table_ready_timeout_ms
                )));
            }
        }
    }

    /// Writes items in batches, resubmitting unprocessed items with backoff.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError`] when a batch call fails or items remain
    /// unprocessed after the retry budget.
    pub fn put_items(&self, items: &[RawItem]) -> Result<IngestReport, ConfigStoreError> {
        let mut report = IngestReport::default();
        for chunk in items.chunks(BATCH_WRITE_LIMIT) {
            let mut pending = chunk
                .iter()
                .map(|item| {
                    PutRequest::builder()
                        .set_item(Some(attributes_from_item(item)))
                        .build()
                        .map(|put| WriteRequest::builder().put_request(put).build())
                        .map_err(|err| ConfigStoreError::Invalid(err.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let mut attempt = 0_u32;
            while !pending.is_empty() {
                if attempt > MAX_BATCH_RETRIES {
                    return Err(ConfigStoreError::Store(format!(
                        "{} item(s) unprocessed after {MAX_BATCH_RETRIES} retries",
                        pending.len()
                    )));
                }
                if attempt > 0 {
                    thread::sleep(BATCH_RETRY_BASE_DELAY.saturating_mul(1_u32 << attempt.min(6)));
                }
                let submitted = pending.len();
                let unprocessed = self.batch_write(pending)?;
                report.requests += 1;
                report.written += submitted.saturating_sub(unprocessed.len());
                pending = unprocessed;
                attempt += 1;
            }
        }
        Ok(report)
    }

    /// Submits one batch and returns the unprocessed requests.
    fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<Vec<WriteRequest>, ConfigStoreError> {
        let client = self.client.clone();
        let table_name = self.config.table_name.clone();
        self.runtime()?.block_on(async {
            let output = client
                .batch_write_item()
                .request_items(table_name.clone(), requests)
                .send()
                .await
                .map_err(|err| sdk_error(&err))?;
            Ok(output
                .unprocessed_items()
                .and_then(|unprocessed| unprocessed.get(&table_name))
                .cloned()
                .unwrap_or_default())
        })
    }
}

impl ConfigStore for DynamoDbConfigStore {
    type Cursor = HashMap<String, AttributeValue>;

    fn scan_page(
        &self,
        cursor: Option<Self::Cursor>,
    ) -> Result<ScanPage<Self::Cursor>, ConfigStoreError> {
        let limit = self
            .config
            .scan_page_size
            .map(i32::try_from)
            .transpose()
            .map_err(|_| ConfigStoreError::Invalid("scan_page_size out of range".to_string()))?;
        let client = self.client.clone();
        let table_name = self.config.table_name.clone();
        self.runtime()?.block_on(async {
            let output = client
                .scan()
                .table_name(table_name)
                .set_exclusive_start_key(cursor)
                .set_limit(limit)
                .send()
                .await
                .map_err(|err| sdk_error(&err))?;
            Ok(ScanPage {
                items: output.items().iter().map(item_from_attributes).collect(),
                next: output.last_evaluated_key().filter(|key| !key.is_empty()).cloned(),
            })
        })
    }

    fn update_checkpoint(&self, key: &TableKey, checkpoint: &str) -> Result<(), ConfigStoreError> {
        let client = self.client.clone();
        let table_name = self.config.table_name.clone();
        let schema_name = key.schema_name.clone();
        let table = key.table_name.clone();
        let checkpoint = checkpoint.to_string();
        self.runtime()?.block_on(async {
            client
                .update_item()
                .table_name(table_name)
                .key(PARTITION_KEY, AttributeValue::S(schema_name))
                .key(SORT_KEY, AttributeValue::S(table))
                .update_expression(CHECKPOINT_UPDATE)
                .expression_attribute_values(":var1", AttributeValue::S(checkpoint))
                .send()
                .await
                .map_err(|err| sdk_error(&err))?;
            Ok(())
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders an SDK error with its full source chain.
fn sdk_error<E>(err: &E) -> ConfigStoreError
where
    E: std::error::Error,
{
    ConfigStoreError::Io(DisplayErrorContext(err).to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config(table_name: &str) -> DynamoDbConfigStoreConfig {
        DynamoDbConfigStoreConfig {
            table_name: table_name.to_string(),
            region: Some("us-east-1".to_string()),
            endpoint: None,
            scan_page_size: None,
            read_capacity_units: 5,
            write_capacity_units: 5,
            table_ready_timeout_ms: 1_000,
            table_poll_interval_ms: 100,
        }
    }

    #[test]
    fn new_rejects_blank_table_name() {
        let result = DynamoDbConfigStore::new(config("  "));
        assert!(matches!(result, Err(ConfigStoreError::Invalid(_))));
    }

    #[test]
    fn put_items_with_no_items_issues_no_requests() {
        let Ok(store) = DynamoDbConfigStore::new(config("lifecycle_config")) else {
            return;
        };
        let report = store.put_items(&[]);
        assert!(matches!(report, Ok(IngestReport { written: 0, requests: 0 })));
    }
}
