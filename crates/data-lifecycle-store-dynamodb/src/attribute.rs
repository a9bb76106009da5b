// crates/data-lifecycle-store-dynamodb/src/attribute.rs
// ============================================================================
// Module: Attribute Conversion
// Description: DynamoDB attribute values to and from raw config values.
// Purpose: Keep SDK types out of the core validation model.
// Dependencies: aws-sdk-dynamodb, data-lifecycle-core
// ============================================================================

//! ## Overview
//! Scalars map one-to-one: `S` to text, `N` to number, `BOOL` to bool, and
//! `NULL` to null. Sets, lists, maps, and binary values become
//! [`RawValue::Other`] tagged with their kind so validation can reject them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use data_lifecycle_core::RawItem;
use data_lifecycle_core::RawValue;

// ============================================================================
// SECTION: Conversion
// ============================================================================

/// Converts one attribute value.
#[must_use]
pub fn raw_from_attribute(value: &AttributeValue) -> RawValue {
    match value {
        AttributeValue::S(text) => RawValue::Text(text.clone()),
        AttributeValue::N(number) => RawValue::Number(number.clone()),
        AttributeValue::Bool(flag) => RawValue::Bool(*flag),
        AttributeValue::Null(_) => RawValue::Null,
        AttributeValue::L(_) => RawValue::Other("list".to_string()),
        AttributeValue::M(_) => RawValue::Other("map".to_string()),
        AttributeValue::Ss(_) | AttributeValue::Ns(_) | AttributeValue::Bs(_) => {
            RawValue::Other("set".to_string())
        }
        AttributeValue::B(_) => RawValue::Other("binary".to_string()),
        _ => RawValue::Other("unknown".to_string()),
    }
}

/// Converts one raw value; unsupported kinds are written as null.
#[must_use]
pub fn attribute_from_raw(value: &RawValue) -> AttributeValue {
    match value {
        RawValue::Text(text) => AttributeValue::S(text.clone()),
        RawValue::Number(number) => AttributeValue::N(number.clone()),
        RawValue::Bool(flag) => AttributeValue::Bool(*flag),
        RawValue::Null | RawValue::Other(_) => AttributeValue::Null(true),
    }
}

/// Converts a DynamoDB item into a raw config item.
#[must_use]
pub fn item_from_attributes(item: &HashMap<String, AttributeValue>) -> RawItem {
    item.iter().map(|(name, value)| (name.clone(), raw_from_attribute(value))).collect()
}

/// Converts a raw config item into a DynamoDB item.
#[must_use]
pub fn attributes_from_item(item: &RawItem) -> HashMap<String, AttributeValue> {
    item.iter().map(|(name, value)| (name.clone(), attribute_from_raw(value))).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
