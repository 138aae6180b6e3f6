//! Field values read out of a record table.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A non-null cell value. Absence is modelled as `Option::None` around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

/// One column of a record table, indexed by record position.
pub type FieldColumn = Vec<Option<FieldValue>>;

impl FieldValue {
    /// Wrap a number, treating NaN as absent.
    pub fn number(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else {
            Some(Self::Number(value))
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Text form used for tokenizing, n-gram vectors and block keys.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(value) => Cow::Borrowed(value.as_str()),
            Self::Number(value) => Cow::Owned(format_numeric(*value)),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Total order for sorting: numbers before text, numbers by value.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Formats a number without a trailing `.0` for integral values.
pub fn format_numeric(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Compare two optional values, sorting absent values last.
pub fn compare_nulls_last(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.sort_cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_is_absent() {
        assert_eq!(FieldValue::number(f64::NAN), None);
        assert_eq!(FieldValue::number(2.5), Some(FieldValue::Number(2.5)));
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(FieldValue::Number(3.0).as_text(), "3");
        assert_eq!(FieldValue::Number(100.0).as_text(), "100");
        assert_eq!(FieldValue::Number(2.5).as_text(), "2.5");
    }

    #[test]
    fn text_and_number_never_equal() {
        assert_ne!(FieldValue::text("1"), FieldValue::Number(1.0));
    }

    #[test]
    fn nulls_sort_last() {
        let a = FieldValue::text("a");
        assert_eq!(compare_nulls_last(Some(&a), None), Ordering::Less);
        assert_eq!(compare_nulls_last(None, None), Ordering::Equal);
        assert_eq!(
            FieldValue::Number(9.0).sort_cmp(&FieldValue::text("0")),
            Ordering::Less
        );
    }
}
