// crates/data-lifecycle-core/src/core/mod.rs
// ============================================================================
// Module: Data Lifecycle Core Types
// Description: Raw values, field schema, config records, and log events.
// Purpose: Group the data model shared by the runtime and the adapters.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types describe what the lifecycle job reads (raw config items), what
//! it validates them into ([`ConfigRecord`]), and what it reports
//! ([`RunLogEvent`]).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod event;
pub mod record;
pub mod schema;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use event::LogLevel;
pub use event::RunLogEvent;
pub use event::RunStage;
pub use record::ConfigRecord;
pub use record::NO_CHECKPOINT;
pub use record::TableKey;
pub use record::priority_of;
pub use record::sort_by_priority;
pub use schema::CONFIG_FIELDS;
pub use schema::FieldDescriptor;
pub use schema::FieldError;
pub use schema::FieldRule;
pub use schema::FieldSlots;
pub use schema::FieldValue;
pub use schema::Flag;
pub use schema::ValidationError;
pub use value::RawItem;
pub use value::RawValue;
