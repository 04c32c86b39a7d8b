//! Query-related data models.
//!
//! This module defines typed parameter values and the generic row shape
//! query results are materialized into.

use crate::error::{FbError, FbResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A decoded result row: lower-cased column name to scalar, in column order.
pub type Row = serde_json::Map<String, JsonValue>;

/// Rows in cursor order.
pub type ResultSet = Vec<Row>;

/// A parameter value for parameterized statements and procedure calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// NULL value
    Null,
    Int(i32),
    Long(i64),
    Bool(bool),
    Double(f64),
    /// Bound as an epoch-millisecond timestamp
    Timestamp(DateTime<Utc>),
    /// Long text is streamed as a blob
    Text(String),
}

impl ParamValue {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Bool(_) => "bool",
            Self::Double(_) => "double",
            Self::Timestamp(_) => "timestamp",
            Self::Text(_) => "string",
        }
    }

    /// Convert an untyped JSON value.
    ///
    /// Integers that fit in 32 bits become [`ParamValue::Int`], wider ones
    /// [`ParamValue::Long`]. Arrays, objects and integers beyond the i64 range
    /// have no binding and fail with `UnsupportedParameterType`.
    pub fn from_json(name: &str, value: &JsonValue) -> FbResult<Self> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(b) => Ok(Self::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(i32::try_from(v).map_or(Self::Long(v), Self::Int))
                } else if n.is_u64() {
                    Err(FbError::unsupported_parameter(name, "u64"))
                } else {
                    n.as_f64()
                        .map(Self::Double)
                        .ok_or_else(|| FbError::unsupported_parameter(name, "number"))
                }
            }
            JsonValue::String(s) => Ok(Self::Text(s.clone())),
            JsonValue::Array(_) => Err(FbError::unsupported_parameter(name, "array")),
            JsonValue::Object(_) => Err(FbError::unsupported_parameter(name, "object")),
        }
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

/// Short integers go through the 64-bit path.
impl From<i16> for ParamValue {
    fn from(v: i16) -> Self {
        Self::Long(v.into())
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v.and_utc())
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A named parameter. The name is informational; binding is positional.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParamValue,
}

/// Ordered parameter list; position `i` binds placeholder `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterList {
    params: Vec<Parameter>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to this list.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.push(Parameter {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    /// Build a list from a JSON object, keeping its key order.
    pub fn from_json(map: &serde_json::Map<String, JsonValue>) -> FbResult<Self> {
        let params = map
            .iter()
            .map(|(name, value)| {
                Ok(Parameter {
                    name: name.clone(),
                    value: ParamValue::from_json(name, value)?,
                })
            })
            .collect::<FbResult<Vec<_>>>()?;
        Ok(Self { params })
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (k, v) in iter {
            list.push(k, v);
        }
        list
    }
}
