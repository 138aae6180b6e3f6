//! Exact equality.

use em_model::FieldValue;

use crate::registry::Similarity;

/// 1 when both values are present and equal, 0 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl Similarity for ExactMatch {
    fn score(&self, left: &[Option<&FieldValue>], right: &[Option<&FieldValue>]) -> Vec<f64> {
        left.iter()
            .zip(right)
            .map(|pair| match pair {
                (Some(a), Some(b)) if a == b => 1.0,
                _ => 0.0,
            })
            .collect()
    }
}
