// crates/data-lifecycle-core/src/core/value.rs
// ============================================================================
// Module: Raw Config Values
// Description: Untyped values scanned from the config store.
// Purpose: Carry heterogeneous store attributes into the validator unchanged.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Config store items arrive as loosely typed attribute maps: strings,
//! numbers, booleans, nulls, and occasionally container types the schema does
//! not understand. [`RawValue`] preserves each attribute as scanned so the
//! validator can apply field rules without the store guessing at types.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One raw config item keyed by attribute name.
pub type RawItem = BTreeMap<String, RawValue>;

/// Untyped attribute value as read from the config store.
///
/// # Invariants
/// - `Number` holds the decimal text reported by the store, unparsed.
/// - `Other` describes an attribute type the schema does not accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    /// Explicit null.
    Null,
    /// Boolean attribute.
    Bool(bool),
    /// Numeric attribute in decimal text form.
    Number(String),
    /// String attribute.
    Text(String),
    /// Unsupported attribute type (list, map, set, binary).
    Other(String),
}

impl RawValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates a numeric value from an integer.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Number(value.to_string())
    }

    /// Returns true when the value counts as unset for default substitution.
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns a short label for the value kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Other(kind) => kind,
        }
    }

    /// Converts a JSON value into a raw value.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => Self::Number(number.to_string()),
            Value::String(text) => Self::Text(text.clone()),
            Value::Array(_) => Self::Other("list".to_string()),
            Value::Object(_) => Self::Other("map".to_string()),
        }
    }

    /// Converts a JSON object into a raw item.
    ///
    /// Returns `None` when the value is not an object.
    #[must_use]
    pub fn item_from_json(value: &Value) -> Option<RawItem> {
        let object = value.as_object()?;
        Some(object.iter().map(|(key, value)| (key.clone(), Self::from_json(value))).collect())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(flag) => flag.fmt(f),
            Self::Number(number) | Self::Text(number) => f.write_str(number),
            Self::Other(kind) => write!(f, "<{kind}>"),
        }
    }
}
