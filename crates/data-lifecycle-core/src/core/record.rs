// crates/data-lifecycle-core/src/core/record.rs
// ============================================================================
// Module: Config Record
// Description: Validated, immutable per-table lifecycle policy.
// Purpose: Build records from raw store items in one validating pass.
// Dependencies: crate::core::{schema, value}, serde
// ============================================================================

//! ## Overview
//! A [`ConfigRecord`] is created exactly once from a raw config item by
//! [`ConfigRecord::from_raw`]. Construction either fills every field or fails
//! with a [`ValidationError`] listing every offending field; no partially
//! validated record exists. Records expose read-only accessors only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::schema::CONFIG_FIELDS;
use crate::core::schema::FieldError;
use crate::core::schema::FieldSlots;
use crate::core::schema::Flag;
use crate::core::schema::ValidationError;
use crate::core::schema::descriptor;
use crate::core::value::RawItem;
use crate::core::value::RawValue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Checkpoint sentinel meaning "no prior checkpoint".
pub const NO_CHECKPOINT: &str = "None";

// ============================================================================
// SECTION: Table Key
// ============================================================================

/// Config store key identifying one warehouse table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableKey {
    /// Warehouse schema name.
    pub schema_name: String,
    /// Warehouse table name.
    pub table_name: String,
}

impl TableKey {
    /// Creates a table key.
    #[must_use]
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
        }
    }

    /// Best-effort key from an unvalidated item, used to label log lines.
    #[must_use]
    pub fn from_raw(item: &RawItem) -> Option<Self> {
        let schema_name = item.get("schema_name")?;
        let table_name = item.get("table_name")?;
        Some(Self::new(schema_name.to_string(), table_name.to_string()))
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.table_name)
    }
}

// ============================================================================
// SECTION: Config Record
// ============================================================================

/// Validated lifecycle policy for one table.
///
/// # Invariants
/// - Flags hold exactly `0` or `1`.
/// - `file_format` and `compression` are members of their allow-lists.
/// - `checkpoint` is never empty; [`NO_CHECKPOINT`] marks "no checkpoint".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigRecord {
    /// Warehouse schema and table.
    key: TableKey,
    /// Time column driving retention.
    column_name: String,
    /// Granularity label (`daily`, `monthly`, or other).
    granularity_level: String,
    /// Retention length in granularity units, unparsed.
    retention_period: String,
    /// Last processed watermark.
    checkpoint: String,
    /// Optional unload partition column.
    partition_column: String,
    /// Export destination.
    s3_path: String,
    /// Export format.
    file_format: String,
    /// Emit a header row.
    header: Flag,
    /// Quote exported fields.
    add_quotes: Flag,
    /// Escape special characters.
    escape: Flag,
    /// Parallel unload.
    parallel: Flag,
    /// Field delimiter.
    delimiter: String,
    /// Null representation.
    null_as: String,
    /// Compression token.
    compression: String,
    /// Region override for the unload.
    unload_region: String,
    /// Action selector, unparsed (`0`, `1`, `2`).
    update_delete_flag: String,
    /// Maximum exported file size.
    max_filesize: String,
    /// Processing priority, unparsed.
    priority: String,
}

impl ConfigRecord {
    /// Validates a raw item and builds a record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] listing every field that failed validation,
    /// including attributes that are not part of the schema.
    pub fn from_raw(item: &RawItem) -> Result<Self, ValidationError> {
        let mut errors: Vec<FieldError> = item
            .keys()
            .filter(|name| descriptor(name).is_none())
            .map(|name| FieldError::UnknownField {
                field: name.clone(),
            })
            .collect();
        let mut slots = FieldSlots::new();
        for field in &CONFIG_FIELDS {
            if let Err(err) = slots.set(field, item.get(field.name)) {
                errors.push(err);
            }
        }
        if !errors.is_empty() {
            return Err(ValidationError {
                errors,
            });
        }
        Self::from_slots(&slots).map_err(ValidationError::from)
    }

    /// Builds a record from fully populated slots.
    fn from_slots(slots: &FieldSlots) -> Result<Self, FieldError> {
        let checkpoint = slots.text("checkpoint")?;
        Ok(Self {
            key: TableKey::new(slots.text("schema_name")?, slots.text("table_name")?),
            column_name: slots.text("column_name")?,
            granularity_level: slots.text("granularity_level")?,
            retention_period: slots.text("retention_period")?,
            checkpoint: if checkpoint.is_empty() { NO_CHECKPOINT.to_string() } else { checkpoint },
            partition_column: slots.text("partition_column")?,
            s3_path: slots.text("s3_path")?,
            file_format: slots.text("file_format")?,
            header: slots.flag("header")?,
            add_quotes: slots.flag("add_quotes")?,
            escape: slots.flag("escape")?,
            parallel: slots.flag("parallel")?,
            delimiter: slots.text("delimiter")?,
            null_as: slots.text("null_as")?,
            compression: slots.text("compression")?,
            unload_region: slots.text("unload_region")?,
            update_delete_flag: slots.text("update_delete_flag")?,
            max_filesize: slots.text("max_filesize")?,
            priority: slots.text("priority")?,
        })
    }

    /// Converts the record back into a raw item for writing to the store.
    ///
    /// Flags are written as the numbers `0` and `1`; every other field as text.
    #[must_use]
    pub fn to_raw_item(&self) -> RawItem {
        let flag = |flag: Flag| RawValue::Number(flag.to_string());
        let text = |value: &str| RawValue::text(value);
        RawItem::from([
            ("schema_name".to_string(), text(&self.key.schema_name)),
            ("table_name".to_string(), text(&self.key.table_name)),
            ("column_name".to_string(), text(&self.column_name)),
            ("granularity_level".to_string(), text(&self.granularity_level)),
            ("retention_period".to_string(), text(&self.retention_period)),
            ("checkpoint".to_string(), text(&self.checkpoint)),
            ("partition_column".to_string(), text(&self.partition_column)),
            ("s3_path".to_string(), text(&self.s3_path)),
            ("file_format".to_string(), text(&self.file_format)),
            ("header".to_string(), flag(self.header)),
            ("add_quotes".to_string(), flag(self.add_quotes)),
            ("escape".to_string(), flag(self.escape)),
            ("parallel".to_string(), flag(self.parallel)),
            ("delimiter".to_string(), text(&self.delimiter)),
            ("null_as".to_string(), text(&self.null_as)),
            ("compression".to_string(), text(&self.compression)),
            ("unload_region".to_string(), text(&self.unload_region)),
            ("update_delete_flag".to_string(), text(&self.update_delete_flag)),
            ("max_filesize".to_string(), text(&self.max_filesize)),
            ("priority".to_string(), text(&self.priority)),
        ])
    }

    /// Returns the table key.
    #[must_use]
    pub const fn key(&self) -> &TableKey {
        &self.key
    }

    /// Returns the warehouse schema name.
    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.key.schema_name
    }

    /// Returns the warehouse table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.key.table_name
    }

    /// Returns the retention time column.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Returns the granularity label.
    #[must_use]
    pub fn granularity_level(&self) -> &str {
        &self.granularity_level
    }

    /// Returns the retention period text.
    #[must_use]
    pub fn retention_period(&self) -> &str {
        &self.retention_period
    }

    /// Returns the checkpoint, or [`NO_CHECKPOINT`].
    #[must_use]
    pub fn checkpoint(&self) -> &str {
        &self.checkpoint
    }

    /// Returns the partition column (empty when none).
    #[must_use]
    pub fn partition_column(&self) -> &str {
        &self.partition_column
    }

    /// Returns the export destination.
    #[must_use]
    pub fn s3_path(&self) -> &str {
        &self.s3_path
    }

    /// Returns the export format as configured.
    #[must_use]
    pub fn file_format(&self) -> &str {
        &self.file_format
    }

    /// Returns the header flag.
    #[must_use]
    pub const fn header(&self) -> Flag {
        self.header
    }

    /// Returns the add-quotes flag.
    #[must_use]
    pub const fn add_quotes(&self) -> Flag {
        self.add_quotes
    }

    /// Returns the escape flag.
    #[must_use]
    pub const fn escape(&self) -> Flag {
        self.escape
    }

    /// Returns the parallel flag.
    #[must_use]
    pub const fn parallel(&self) -> Flag {
        self.parallel
    }

    /// Returns the delimiter.
    #[must_use]
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Returns the null representation.
    #[must_use]
    pub fn null_as(&self) -> &str {
        &self.null_as
    }

    /// Returns the compression token.
    #[must_use]
    pub fn compression(&self) -> &str {
        &self.compression
    }

    /// Returns the unload region override (empty when none).
    #[must_use]
    pub fn unload_region(&self) -> &str {
        &self.unload_region
    }

    /// Returns the update/delete flag text.
    #[must_use]
    pub fn update_delete_flag(&self) -> &str {
        &self.update_delete_flag
    }

    /// Returns the maximum exported file size.
    #[must_use]
    pub fn max_filesize(&self) -> &str {
        &self.max_filesize
    }

    /// Returns the priority text.
    #[must_use]
    pub fn priority(&self) -> &str {
        &self.priority
    }
}

// ============================================================================
// SECTION: Priority
// ============================================================================

/// Returns the processing priority of a raw item.
///
/// Missing, null, or non-integer priorities rank as `0`.
#[must_use]
pub fn priority_of(item: &RawItem) -> i64 {
    match item.get("priority") {
        Some(RawValue::Text(text) | RawValue::Number(text)) => text.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Sorts raw items by ascending priority, keeping scan order among ties.
pub fn sort_by_priority(items: &mut [RawItem]) {
    items.sort_by_key(priority_of);
}
