//! Polars AnyValue utility functions.

use em_model::format_numeric;
use polars::prelude::{AnyValue, DataFrame};

use crate::error::{IngestError, Result};

/// Converts a Polars AnyValue to a String representation.
/// Returns empty string for Null, formats floats without a trailing `.0`.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Converts AnyValue to String, `None` for nulls.
pub fn any_to_optional_string(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        other => Some(any_to_string(other)),
    }
}

/// Every value of a column rendered as text, nulls kept as `None`.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name).map_err(|_| IngestError::MissingColumn {
        column: name.to_string(),
    })?;
    Ok((0..df.height())
        .map(|idx| any_to_optional_string(column.get(idx).unwrap_or(AnyValue::Null)))
        .collect())
}
