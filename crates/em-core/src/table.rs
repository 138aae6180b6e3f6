//! Reading field values out of a polars record table.

use em_model::{FieldColumn, FieldValue, MatchError, Result};
use polars::prelude::{AnyValue, DataFrame, PolarsError};

/// Wrap a polars failure.
pub fn frame_error(err: PolarsError) -> MatchError {
    MatchError::DataFrame {
        message: err.to_string(),
    }
}

/// Fail on the first field that is not a column of `df`.
pub fn require_columns<'a, I>(df: &DataFrame, fields: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    for field in fields {
        if df.get_column_index(field).is_none() {
            return Err(MatchError::MissingColumn {
                column: field.to_string(),
            });
        }
    }
    Ok(())
}

/// Every value of column `name`, indexed by row.
pub fn field_column(df: &DataFrame, name: &str) -> Result<FieldColumn> {
    let column = df.column(name).map_err(|_| MatchError::MissingColumn {
        column: name.to_string(),
    })?;
    Ok((0..df.height())
        .map(|idx| any_to_field_value(column.get(idx).unwrap_or(AnyValue::Null)))
        .collect())
}

/// Numbers become [`FieldValue::Number`] (NaN reads as missing), strings stay
/// text, anything else is rendered as text.
pub fn any_to_field_value(value: AnyValue<'_>) -> Option<FieldValue> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => FieldValue::number(f64::from(v)),
        AnyValue::Int16(v) => FieldValue::number(f64::from(v)),
        AnyValue::Int32(v) => FieldValue::number(f64::from(v)),
        AnyValue::Int64(v) => FieldValue::number(v as f64),
        AnyValue::UInt8(v) => FieldValue::number(f64::from(v)),
        AnyValue::UInt16(v) => FieldValue::number(f64::from(v)),
        AnyValue::UInt32(v) => FieldValue::number(f64::from(v)),
        AnyValue::UInt64(v) => FieldValue::number(v as f64),
        AnyValue::Float32(v) => FieldValue::number(f64::from(v)),
        AnyValue::Float64(v) => FieldValue::number(v),
        AnyValue::String(s) => Some(FieldValue::text(s)),
        AnyValue::StringOwned(s) => Some(FieldValue::text(s.as_str())),
        other => Some(FieldValue::text(other.to_string())),
    }
}
