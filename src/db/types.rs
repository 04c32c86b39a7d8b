//! Column type mappings and result materialization.
//!
//! # Architecture
//!
//! Decoding uses a two-phase approach:
//! 1. `TypeCategory` classifies the declared SQL type name of each column
//! 2. `decode_column` pulls the value through the matching typed cursor getter
//!
//! Rows are keyed by lower-cased column name and keep column order.

use crate::db::driver::{ColumnDescriptor, Cursor};
use crate::error::DriverResult;
use crate::models::{ResultSet, Row};
use serde_json::Value as JsonValue;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for Firebird column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    /// INTEGER, SMALLINT
    Integer,
    /// BIGINT
    BigInt,
    /// DECIMAL
    Decimal,
    /// BLOB SUB_TYPE 1 (text blob)
    TextBlob,
    /// Rendered as text, not as a numeric epoch
    Timestamp,
    /// Everything else uses the driver's string rendering
    Other,
}

/// Classify a declared SQL type name (case-insensitive).
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.trim().to_ascii_uppercase();
    match upper.as_str() {
        "INTEGER" | "SMALLINT" => TypeCategory::Integer,
        "BIGINT" => TypeCategory::BigInt,
        "DECIMAL" => TypeCategory::Decimal,
        "BLOB SUB_TYPE 1" | "BLOB SUB_TYPE TEXT" => TypeCategory::TextBlob,
        "TIMESTAMP" => TypeCategory::Timestamp,
        _ => TypeCategory::Other,
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode text blob bytes as UTF-8; invalid UTF-8 falls back to base64.
pub fn decode_text_blob(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => {
            tracing::debug!(len = bytes.len(), "Text blob is not valid UTF-8, encoding as base64");
            JsonValue::String(STANDARD.encode(bytes))
        }
    }
}

// =============================================================================
// Cursor Decoding
// =============================================================================

/// Decode one column of the current row. `index` is 1-based.
pub fn decode_column(
    cursor: &mut dyn Cursor,
    index: usize,
    category: TypeCategory,
) -> DriverResult<JsonValue> {
    let value = match category {
        TypeCategory::Integer => cursor.get_int(index)?.map(JsonValue::from),
        TypeCategory::BigInt => cursor.get_long(index)?.map(JsonValue::from),
        TypeCategory::Decimal => cursor.get_double(index)?.map(JsonValue::from),
        TypeCategory::TextBlob => cursor.get_blob(index)?.map(|b| decode_text_blob(&b)),
        TypeCategory::Timestamp | TypeCategory::Other => {
            cursor.get_string(index)?.map(JsonValue::String)
        }
    };
    Ok(value.unwrap_or(JsonValue::Null))
}

/// Drain a cursor into rows, in cursor order.
pub fn materialize(cursor: &mut dyn Cursor) -> DriverResult<ResultSet> {
    let columns: Vec<(String, TypeCategory)> = cursor
        .columns()?
        .iter()
        .map(|ColumnDescriptor { name, type_name }| {
            (name.to_lowercase(), categorize_type(type_name))
        })
        .collect();

    let mut rows = ResultSet::new();
    while cursor.advance()? {
        let mut row = Row::with_capacity(columns.len());
        for (idx, (name, category)) in columns.iter().enumerate() {
            let value = decode_column(cursor, idx + 1, *category)?;
            row.insert(name.clone(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}
