//! Per-field score aggregation and the match decision.

use std::collections::BTreeMap;

use em_model::Pair;
use serde::Serialize;
use tracing::debug;

/// Scores of one field over a set of pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldScores {
    field: String,
    entries: Vec<(Pair, f64)>,
}

impl FieldScores {
    /// Pair `pairs[i]` with `scores[i]`.
    ///
    /// Both sides come from the same scoring call and have equal length;
    /// surplus entries on either side are ignored.
    pub fn new(field: impl Into<String>, pairs: &[Pair], scores: Vec<f64>) -> Self {
        debug_assert_eq!(pairs.len(), scores.len());
        Self {
            field: field.into(),
            entries: pairs.iter().copied().zip(scores).collect(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn entries(&self) -> &[(Pair, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One joined row: a pair, its per-field scores and their mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPair {
    pub pair: Pair,
    /// Aligned with the fields passed to [`aggregate`]; `None` when the
    /// field never scored this pair.
    pub field_scores: Vec<Option<f64>>,
    pub aggregate: f64,
}

impl ScoredPair {
    fn new(pair: Pair, field_scores: Vec<Option<f64>>) -> Self {
        let present: Vec<f64> = field_scores.iter().flatten().copied().collect();
        let aggregate = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };
        Self {
            pair,
            field_scores,
            aggregate,
        }
    }
}

/// Outer-join per-field scores on the pair.
///
/// A single field keeps its own pair order. With several fields the rows
/// are ordered by pair. Missing scores stay absent and do not count toward
/// the mean.
pub fn aggregate(field_scores: &[FieldScores]) -> Vec<ScoredPair> {
    if let [single] = field_scores {
        return single
            .entries
            .iter()
            .map(|&(pair, score)| ScoredPair::new(pair, vec![Some(score)]))
            .collect();
    }

    let width = field_scores.len();
    let mut joined: BTreeMap<Pair, Vec<Option<f64>>> = BTreeMap::new();
    for (column, scores) in field_scores.iter().enumerate() {
        for &(pair, score) in &scores.entries {
            joined.entry(pair).or_insert_with(|| vec![None; width])[column] = Some(score);
        }
    }
    debug!(fields = width, rows = joined.len(), "joined field scores");
    joined
        .into_iter()
        .map(|(pair, scores)| ScoredPair::new(pair, scores))
        .collect()
}

/// Rows whose aggregate score is strictly above a threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchTable {
    threshold: f64,
    rows: Vec<ScoredPair>,
}

impl MatchTable {
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn rows(&self) -> &[ScoredPair] {
        &self.rows
    }

    /// Matched pairs in row order.
    pub fn pairs(&self) -> Vec<Pair> {
        self.rows.iter().map(|row| row.pair).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep rows with `aggregate > threshold`, preserving order.
pub fn decide(rows: Vec<ScoredPair>, threshold: f64) -> MatchTable {
    let candidates = rows.len();
    let rows: Vec<ScoredPair> = rows
        .into_iter()
        .filter(|row| row.aggregate > threshold)
        .collect();
    debug!(threshold, candidates, matches = rows.len(), "applied threshold");
    MatchTable { threshold, rows }
}

/// Decide over scores aligned with `candidates`, one vector per field.
///
/// Gives the same table as [`decide`] over [`aggregate`] of the same scores,
/// but only rows above `threshold` are materialized. Rows keep candidate
/// order for a single field and are ordered by pair otherwise.
pub fn decide_aligned(candidates: &[Pair], field_scores: &[Vec<f64>], threshold: f64) -> MatchTable {
    let mut rows = Vec::new();
    if field_scores.is_empty() {
        return MatchTable { threshold, rows };
    }
    for (index, &pair) in candidates.iter().enumerate() {
        let mut total = 0.0;
        let mut present = 0usize;
        for score in field_scores.iter().filter_map(|scores| scores.get(index)) {
            total += score;
            present += 1;
        }
        if present == 0 || total / present as f64 <= threshold {
            continue;
        }
        let scores = field_scores
            .iter()
            .map(|scores| scores.get(index).copied())
            .collect();
        rows.push(ScoredPair::new(pair, scores));
    }
    if field_scores.len() > 1 {
        rows.sort_by_key(|row| row.pair);
        rows.dedup_by_key(|row| row.pair);
    }
    debug!(
        threshold,
        candidates = candidates.len(),
        matches = rows.len(),
        "applied threshold"
    );
    MatchTable { threshold, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_field_keeps_pair_order() {
        let pairs = [Pair::new(3, 4), Pair::new(0, 1)];
        let scores = FieldScores::new("title", &pairs, vec![0.9, 0.2]);
        let rows = aggregate(&[scores]);
        assert_eq!(rows[0].pair, Pair::new(3, 4));
        assert_eq!(rows[1].aggregate, 0.2);
    }

    #[test]
    fn missing_field_scores_are_absent_not_zero() {
        let title = FieldScores::new("title", &[Pair::new(1, 2), Pair::new(0, 1)], vec![0.8, 0.6]);
        let artist = FieldScores::new("artist", &[Pair::new(0, 1)], vec![1.0]);
        let rows = aggregate(&[title, artist]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pair, Pair::new(0, 1));
        assert_eq!(rows[0].field_scores, vec![Some(0.6), Some(1.0)]);
        assert!((rows[0].aggregate - 0.8).abs() < 1e-12);
        assert_eq!(rows[1].field_scores, vec![Some(0.8), None]);
        assert!((rows[1].aggregate - 0.8).abs() < 1e-12);
    }

    #[test]
    fn threshold_is_strict() {
        let scores = FieldScores::new(
            "title",
            &[Pair::new(0, 1), Pair::new(0, 2), Pair::new(1, 2)],
            vec![0.7, 0.71, 0.2],
        );
        let table = decide(aggregate(&[scores]), 0.7);
        assert_eq!(table.pairs(), vec![Pair::new(0, 2)]);
        assert_eq!(table.threshold(), 0.7);
    }

    #[test]
    fn aligned_decision_matches_joined_decision() {
        let candidates = [Pair::new(2, 3), Pair::new(0, 1), Pair::new(0, 2)];
        let title = vec![0.9, 0.64, 0.2];
        let artist = vec![0.3, 1.0, 0.1];
        let joined = decide(
            aggregate(&[
                FieldScores::new("title", &candidates, title.clone()),
                FieldScores::new("artist", &candidates, artist.clone()),
            ]),
            0.7,
        );
        let aligned = decide_aligned(&candidates, &[title, artist], 0.7);
        assert_eq!(aligned, joined);
        assert_eq!(aligned.pairs(), vec![Pair::new(0, 1)]);
    }

    #[test]
    fn aligned_single_field_keeps_candidate_order() {
        let candidates = [Pair::new(3, 4), Pair::new(0, 1)];
        let table = decide_aligned(&candidates, &[vec![0.8, 0.9]], 0.7);
        assert_eq!(table.pairs(), vec![Pair::new(3, 4), Pair::new(0, 1)]);
        assert!(decide_aligned(&candidates, &[], 0.0).is_empty());
    }

    #[test]
    fn no_scores_no_rows() {
        assert!(aggregate(&[]).is_empty());
        assert!(decide(Vec::new(), 0.5).is_empty());
    }
}
