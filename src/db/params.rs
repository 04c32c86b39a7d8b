//! Parameter binding utilities for statements.
//!
//! This module maps `ParamValue` entries onto the driver's typed bind calls.
//! Used by every parameterized execution path.

use crate::db::driver::{Binding, Statement};
use crate::error::DriverResult;
use crate::models::{ParamValue, ParameterList};

/// Strings longer than this many UTF-16 code units are streamed as a blob.
///
/// Characters outside the Basic Multilingual Plane count as two units.
pub const BLOB_STRING_THRESHOLD: usize = 4000;

/// Select the bind call for a value.
pub(crate) fn binding_for(value: &ParamValue) -> Binding<'_> {
    match value {
        ParamValue::Null => Binding::Null,
        ParamValue::Int(v) => Binding::Int(*v),
        ParamValue::Long(v) => Binding::Long(*v),
        ParamValue::Bool(v) => Binding::Bool(*v),
        ParamValue::Double(v) => Binding::Double(*v),
        ParamValue::Timestamp(v) => Binding::Timestamp(v.timestamp_millis()),
        ParamValue::Text(v) if v.encode_utf16().count() > BLOB_STRING_THRESHOLD => {
            Binding::BinaryStream(v.as_bytes())
        }
        ParamValue::Text(v) => Binding::Text(v.as_str()),
    }
}

/// Bind values positionally, starting at placeholder 1.
pub(crate) fn bind_values<'v>(
    statement: &mut dyn Statement,
    values: impl IntoIterator<Item = &'v ParamValue>,
) -> DriverResult<()> {
    for (idx, value) in values.into_iter().enumerate() {
        statement.bind(idx + 1, binding_for(value))?;
    }
    Ok(())
}

/// Bind a parameter list in order, ignoring names.
pub(crate) fn bind_parameters(
    statement: &mut dyn Statement,
    params: &ParameterList,
) -> DriverResult<()> {
    bind_values(statement, params.iter().map(|p| &p.value))
}
