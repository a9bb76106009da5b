// crates/data-lifecycle-core/src/core/schema.rs
// ============================================================================
// Module: Config Field Schema
// Description: Declarative field descriptors and the validation pass over them.
// Purpose: Coerce stringly-typed config attributes into strict field values.
// Dependencies: crate::core::value, serde, thiserror
// ============================================================================

//! ## Overview
//! Every config field is described by a [`FieldDescriptor`] in the
//! [`CONFIG_FIELDS`] table. A descriptor carries its default and either an
//! allow-list (enumerated-string fields) or a closed set of boolean spellings
//! (boolean-like fields). Validation stages values in [`FieldSlots`]; a record
//! is only built once every slot has been filled without error.
//!
//! Invariants:
//! - Boolean-like fields store [`Flag::Off`] or [`Flag::On`], nothing else.
//! - Allow-listed fields hold a member of their allow-list (compared
//!   lower-cased) or no value at all.
//! - Defaults are substituted only for unset input (absent or null). An empty
//!   string is an explicit value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::value::RawValue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Text spellings accepted as boolean false.
pub const FALSE_SPELLINGS: &[&str] = &["", "0", "f", "false", "False"];
/// Text spellings accepted as boolean true.
pub const TRUE_SPELLINGS: &[&str] = &["1", "t", "true", "True"];
/// Allowed `file_format` values (compared lower-cased).
pub const FILE_FORMAT_OPTIONS: &[&str] = &["", "parquet", "csv"];
/// Allowed `compression` values (compared lower-cased).
pub const COMPRESSION_OPTIONS: &[&str] = &["", "gzip", "zstd", "bzip2"];
/// Default export format when none is configured.
pub const DEFAULT_FILE_FORMAT: &str = "parquet";

/// Descriptor table for every config record field.
pub static CONFIG_FIELDS: [FieldDescriptor; 20] = [
    FieldDescriptor::enumerated("schema_name", None, None),
    FieldDescriptor::enumerated("table_name", None, None),
    FieldDescriptor::enumerated("column_name", None, None),
    FieldDescriptor::enumerated("granularity_level", None, None),
    FieldDescriptor::enumerated("retention_period", None, None),
    FieldDescriptor::enumerated("checkpoint", None, None),
    FieldDescriptor::enumerated("partition_column", None, None),
    FieldDescriptor::enumerated("s3_path", None, None),
    FieldDescriptor::enumerated(
        "file_format",
        Some(DEFAULT_FILE_FORMAT),
        Some(FILE_FORMAT_OPTIONS),
    ),
    FieldDescriptor::bool_like("header", Some(Flag::Off)),
    FieldDescriptor::bool_like("add_quotes", Some(Flag::Off)),
    FieldDescriptor::bool_like("escape", Some(Flag::Off)),
    FieldDescriptor::bool_like("parallel", None),
    FieldDescriptor::enumerated("delimiter", None, None),
    FieldDescriptor::enumerated("null_as", None, None),
    FieldDescriptor::enumerated("compression", None, Some(COMPRESSION_OPTIONS)),
    FieldDescriptor::enumerated("unload_region", None, None),
    FieldDescriptor::enumerated("update_delete_flag", None, None),
    FieldDescriptor::enumerated("max_filesize", None, None),
    FieldDescriptor::enumerated("priority", None, None),
];

/// Looks up the descriptor for a field name.
#[must_use]
pub fn descriptor(name: &str) -> Option<&'static FieldDescriptor> {
    CONFIG_FIELDS.iter().find(|descriptor| descriptor.name == name)
}

// ============================================================================
// SECTION: Flag
// ============================================================================

/// Boolean-like config value normalized to the integers `0` and `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    /// Integer `0`.
    Off,
    /// Integer `1`.
    On,
}

impl Flag {
    /// Returns the integer form of the flag.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    /// Returns true for [`Flag::On`].
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// Parses a text spelling from the closed boolean set.
    #[must_use]
    pub fn from_spelling(text: &str) -> Option<Self> {
        if FALSE_SPELLINGS.contains(&text) {
            Some(Self::Off)
        } else if TRUE_SPELLINGS.contains(&text) {
            Some(Self::On)
        } else {
            None
        }
    }

    /// Parses a numeric value equal to zero or one.
    #[must_use]
    pub fn from_number(number: &str) -> Option<Self> {
        let value = number.trim().parse::<f64>().ok()?;
        if value.abs() < f64::EPSILON {
            Some(Self::Off)
        } else if (value - 1.0).abs() < f64::EPSILON {
            Some(Self::On)
        } else {
            None
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_u8().fmt(f)
    }
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Validation rule attached to a config field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// String field with an optional default and optional allow-list.
    Enumerated {
        /// Value substituted when the input is unset.
        default: Option<&'static str>,
        /// Lower-cased values the field may take.
        allowed: Option<&'static [&'static str]>,
    },
    /// Boolean-like field coerced to [`Flag`].
    BoolLike {
        /// Flag substituted when the input is unset.
        default: Option<Flag>,
    },
}

/// Declarative descriptor for one config field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as stored in the config store.
    pub name: &'static str,
    /// Validation rule for the field.
    pub rule: FieldRule,
}

impl FieldDescriptor {
    /// Declares an enumerated-string field.
    #[must_use]
    pub const fn enumerated(
        name: &'static str,
        default: Option<&'static str>,
        allowed: Option<&'static [&'static str]>,
    ) -> Self {
        Self {
            name,
            rule: FieldRule::Enumerated {
                default,
                allowed,
            },
        }
    }

    /// Declares a boolean-like field.
    #[must_use]
    pub const fn bool_like(name: &'static str, default: Option<Flag>) -> Self {
        Self {
            name,
            rule: FieldRule::BoolLike {
                default,
            },
        }
    }

    /// Validates and coerces a raw input value for this field.
    ///
    /// `None` means the attribute was absent from the item.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the value violates the field rule.
    pub fn apply(&self, raw: Option<&RawValue>) -> Result<FieldValue, FieldError> {
        match self.rule {
            FieldRule::Enumerated {
                default,
                allowed,
            } => self.apply_enumerated(raw, default, allowed),
            FieldRule::BoolLike {
                default,
            } => self.apply_bool_like(raw, default),
        }
    }

    /// Applies the enumerated-string rule.
    fn apply_enumerated(
        &self,
        raw: Option<&RawValue>,
        default: Option<&'static str>,
        allowed: Option<&'static [&'static str]>,
    ) -> Result<FieldValue, FieldError> {
        let value = match raw.filter(|value| !value.is_unset()) {
            None => default.map(str::to_string),
            Some(RawValue::Text(text)) => Some(text.clone()),
            Some(RawValue::Number(number)) if allowed.is_none() => Some(number.clone()),
            Some(RawValue::Bool(flag)) if allowed.is_none() => {
                Some(bool_text(*flag).to_string())
            }
            Some(other) => {
                return Err(FieldError::NotText {
                    field: self.name.to_string(),
                    kind: other.kind().to_string(),
                });
            }
        };
        if let (Some(options), Some(text)) = (allowed, value.as_deref()) {
            let lowered = text.to_lowercase();
            if !options.contains(&lowered.as_str()) {
                return Err(FieldError::NotAllowed {
                    field: self.name.to_string(),
                    allowed: render_text_options(options),
                });
            }
        }
        Ok(FieldValue::Text(value))
    }

    /// Applies the boolean-like rule.
    fn apply_bool_like(
        &self,
        raw: Option<&RawValue>,
        default: Option<Flag>,
    ) -> Result<FieldValue, FieldError> {
        let flag = match raw.filter(|value| !value.is_unset()) {
            None => default,
            Some(RawValue::Bool(flag)) => Some(Flag::from(*flag)),
            Some(RawValue::Text(text)) => Flag::from_spelling(text),
            Some(RawValue::Number(number)) => Flag::from_number(number),
            Some(RawValue::Null | RawValue::Other(_)) => None,
        };
        flag.map(FieldValue::Flag).ok_or_else(|| FieldError::NotAllowed {
            field: self.name.to_string(),
            allowed: render_bool_options(),
        })
    }
}

/// Text form of a native boolean stored in a free-text field.
const fn bool_text(flag: bool) -> &'static str {
    if flag { "True" } else { "False" }
}

/// Renders a text allow-list for error messages.
fn render_text_options(options: &[&str]) -> String {
    options.iter().map(|option| format!("\"{option}\"")).collect::<Vec<_>>().join(", ")
}

/// Renders the accepted boolean spellings for error messages.
fn render_bool_options() -> String {
    let mut rendered = render_text_options(FALSE_SPELLINGS);
    rendered.push_str(", ");
    rendered.push_str(&render_text_options(TRUE_SPELLINGS));
    rendered.push_str(", 0, 1, false, true");
    rendered
}

// ============================================================================
// SECTION: Field Values
// ============================================================================

/// Validated value held in a field slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// String value; `None` when unset with no default.
    Text(Option<String>),
    /// Boolean-like value.
    Flag(Flag),
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Field-level validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Value is outside the allow-list or boolean spelling set.
    #[error("{field} must be one of [{allowed}]")]
    NotAllowed {
        /// Field name.
        field: String,
        /// Rendered allow-list.
        allowed: String,
    },
    /// Value type cannot be held by a text field.
    #[error("{field} must be a text value, got {kind}")]
    NotText {
        /// Field name.
        field: String,
        /// Raw value kind.
        kind: String,
    },
    /// Attribute name is not part of the config schema.
    #[error("{field} is not a recognized config field")]
    UnknownField {
        /// Attribute name.
        field: String,
    },
    /// Slot was read before being set.
    #[error("{field} has not been set")]
    Unset {
        /// Field name.
        field: String,
    },
    /// Slot holds a value of the other kind.
    #[error("{field} does not hold a {expected} value")]
    WrongKind {
        /// Field name.
        field: String,
        /// Expected kind label.
        expected: &'static str,
    },
}

impl FieldError {
    /// Returns the field name the error refers to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::NotAllowed {
                field, ..
            }
            | Self::NotText {
                field, ..
            }
            | Self::UnknownField {
                field,
            }
            | Self::Unset {
                field,
            }
            | Self::WrongKind {
                field, ..
            } => field,
        }
    }
}

/// Record-level validation failure listing every offending field.
///
/// # Invariants
/// - `errors` is never empty when produced by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field errors in descriptor order.
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered =
            self.errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        write!(f, "invalid config record: {rendered}")
    }
}

impl std::error::Error for ValidationError {}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

// ============================================================================
// SECTION: Field Slots
// ============================================================================

/// Staging area for validated field values.
///
/// Reads of a slot that was never set fail with [`FieldError::Unset`] rather
/// than yielding a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSlots {
    /// Validated values keyed by field name.
    values: BTreeMap<&'static str, FieldValue>,
}

impl FieldSlots {
    /// Creates an empty slot set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `raw` against `descriptor` and stores the result.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when validation fails; the slot is left untouched.
    pub fn set(
        &mut self,
        descriptor: &'static FieldDescriptor,
        raw: Option<&RawValue>,
    ) -> Result<(), FieldError> {
        let value = descriptor.apply(raw)?;
        self.values.insert(descriptor.name, value);
        Ok(())
    }

    /// Returns the stored value for a field.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Unset`] when the slot is empty.
    pub fn get(&self, field: &str) -> Result<&FieldValue, FieldError> {
        self.values.get(field).ok_or_else(|| FieldError::Unset {
            field: field.to_string(),
        })
    }

    /// Removes and returns the stored value for a field.
    pub fn delete(&mut self, field: &str) -> Option<FieldValue> {
        self.values.remove(field)
    }

    /// Returns a text slot, rendering an unset value as the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the slot is empty or holds a flag.
    pub fn text(&self, field: &str) -> Result<String, FieldError> {
        match self.get(field)? {
            FieldValue::Text(value) => Ok(value.clone().unwrap_or_default()),
            FieldValue::Flag(_) => Err(FieldError::WrongKind {
                field: field.to_string(),
                expected: "text",
            }),
        }
    }

    /// Returns a flag slot.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] when the slot is empty or holds text.
    pub fn flag(&self, field: &str) -> Result<Flag, FieldError> {
        match self.get(field)? {
            FieldValue::Flag(flag) => Ok(*flag),
            FieldValue::Text(_) => Err(FieldError::WrongKind {
                field: field.to_string(),
                expected: "flag",
            }),
        }
    }
}
