//! Column normalization applied before matching.

use polars::prelude::{DataFrame, NamedFrom, Series};
use tracing::debug;

use crate::error::Result;
use crate::polars_utils::string_values;

/// Lowercase, turn every character outside `[a-z0-9]` into a space, collapse
/// runs of spaces and trim.
pub fn normalize_text(value: &str) -> String {
    let lowered = value.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Keep digits only and drop leading zeros. `None` when no digit remains.
pub fn normalize_number_text(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        Some("0".to_string())
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalize `text_columns` with [`normalize_text`] and `numeric_columns`
/// with [`normalize_number_text`]. Columns are replaced by string columns;
/// nulls stay null.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumn`](crate::IngestError::MissingColumn)
/// when a listed column is absent. The frame is left untouched in that case.
pub fn preprocess_columns(
    df: &mut DataFrame,
    text_columns: &[&str],
    numeric_columns: &[&str],
) -> Result<()> {
    let mut replacements = Vec::with_capacity(text_columns.len() + numeric_columns.len());
    for &name in text_columns {
        let values: Vec<Option<String>> = string_values(df, name)?
            .into_iter()
            .map(|value| value.map(|text| normalize_text(&text)))
            .collect();
        replacements.push(Series::new(name.into(), values));
    }
    for &name in numeric_columns {
        let values: Vec<Option<String>> = string_values(df, name)?
            .into_iter()
            .map(|value| value.and_then(|text| normalize_number_text(&text)))
            .collect();
        replacements.push(Series::new(name.into(), values));
    }
    for series in replacements {
        df.with_column(series)?;
    }
    debug!(
        text_columns = text_columns.len(),
        numeric_columns = numeric_columns.len(),
        "preprocessed columns"
    );
    Ok(())
}
