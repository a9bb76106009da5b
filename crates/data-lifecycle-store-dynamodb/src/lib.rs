// crates/data-lifecycle-store-dynamodb/src/lib.rs
// ============================================================================
// Module: Data Lifecycle DynamoDB Store
// Description: DynamoDB implementation of the config store.
// Purpose: Scan config items, write checkpoints, and provision the table.
// Dependencies: aws-config, aws-sdk-dynamodb, data-lifecycle-core, tokio
// ============================================================================

//! ## Overview
//! [`DynamoDbConfigStore`] drives the AWS SDK from a private Tokio runtime so
//! the synchronous row loop can use it directly. [`attribute`] converts
//! between DynamoDB attribute values and the core [`RawValue`] model.
//!
//! [`RawValue`]: data_lifecycle_core::RawValue

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod attribute;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use attribute::attributes_from_item;
pub use attribute::item_from_attributes;
pub use store::BATCH_WRITE_LIMIT;
pub use store::DynamoDbConfigStore;
pub use store::DynamoDbConfigStoreConfig;
pub use store::IngestReport;
pub use store::TableReadiness;
