//! Indel-normalized edit similarity, batched per left value.

use std::borrow::Cow;
use std::collections::BTreeMap;

use em_model::FieldValue;
use rapidfuzz::distance::indel;
use tracing::debug;

use crate::clamp_score;
use crate::registry::Similarity;

/// Normalized indel similarity of the two rendered values.
///
/// Pairs sharing a left value are scored by one prepared comparator. Missing
/// or empty values score 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl Similarity for IndelRatio {
    fn score(&self, left: &[Option<&FieldValue>], right: &[Option<&FieldValue>]) -> Vec<f64> {
        let mut groups: BTreeMap<Cow<'_, str>, Vec<usize>> = BTreeMap::new();
        for (idx, value) in left.iter().enumerate() {
            if let Some(value) = value {
                groups.entry(value.as_text()).or_default().push(idx);
            }
        }

        let mut scores = vec![0.0; left.len().min(right.len())];
        for (left_text, indices) in &groups {
            if left_text.is_empty() {
                continue;
            }
            let comparator = indel::BatchComparator::new(left_text.chars());
            for &idx in indices {
                let Some(Some(right_value)) = right.get(idx) else {
                    continue;
                };
                let right_text = right_value.as_text();
                if right_text.is_empty() {
                    continue;
                }
                if let Some(slot) = scores.get_mut(idx) {
                    *slot = clamp_score(comparator.normalized_similarity(right_text.chars()));
                }
            }
        }
        debug!(
            pairs = scores.len(),
            comparators = groups.len(),
            "indel ratios computed"
        );
        scores
    }
}
