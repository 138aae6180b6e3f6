// Property tests for aggregation, decision and clustering.

use std::collections::BTreeSet;

use em_core::{FieldScores, aggregate, cluster, decide, decide_aligned};
use em_model::Pair;
use proptest::prelude::*;

const RECORDS: usize = 12;

fn arb_pairs() -> impl Strategy<Value = Vec<Pair>> {
    prop::collection::vec((0..RECORDS, 0..RECORDS), 0..40).prop_map(|raw| {
        let mut seen = BTreeSet::new();
        raw.into_iter()
            .filter(|(a, b)| a != b)
            .map(Pair::from)
            .filter(|pair| seen.insert(*pair))
            .collect()
    })
}

fn arb_field_scores() -> impl Strategy<Value = Vec<FieldScores>> {
    prop::collection::vec(
        arb_pairs().prop_flat_map(|pairs| {
            let len = pairs.len();
            (Just(pairs), prop::collection::vec(0.0f64..=1.0, len))
        }),
        1..4,
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .enumerate()
            .map(|(idx, (pairs, scores))| FieldScores::new(format!("field_{idx}"), &pairs, scores))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn aggregate_is_mean_of_present_scores(fields in arb_field_scores()) {
        for row in aggregate(&fields) {
            let present: Vec<f64> = row.field_scores.iter().flatten().copied().collect();
            prop_assert!(!present.is_empty());
            let low = present.iter().copied().fold(f64::INFINITY, f64::min);
            let high = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(row.aggregate >= low - 1e-12);
            prop_assert!(row.aggregate <= high + 1e-12);
        }
    }

    #[test]
    fn decision_is_strict(fields in arb_field_scores(), threshold in 0.0f64..1.0) {
        let rows = aggregate(&fields);
        let expected = rows.iter().filter(|row| row.aggregate > threshold).count();
        let table = decide(rows, threshold);
        prop_assert_eq!(table.len(), expected);
        for row in table.rows() {
            prop_assert!(row.aggregate > threshold);
        }
    }

    #[test]
    fn aligned_decision_equals_joined_decision(
        (candidates, scores) in arb_pairs().prop_flat_map(|pairs| {
            let len = pairs.len();
            (Just(pairs), prop::collection::vec(prop::collection::vec(0.0f64..=1.0, len), 1..4))
        }),
        threshold in 0.0f64..1.0,
    ) {
        let fields: Vec<FieldScores> = scores
            .iter()
            .enumerate()
            .map(|(idx, field)| FieldScores::new(format!("field_{idx}"), &candidates, field.clone()))
            .collect();
        prop_assert_eq!(
            decide_aligned(&candidates, &scores, threshold),
            decide(aggregate(&fields), threshold)
        );
    }

    #[test]
    fn clustering_labels_every_left_member(matches in arb_pairs()) {
        let labels = cluster(&matches, RECORDS);
        prop_assert_eq!(labels.len(), RECORDS);
        for pair in &matches {
            prop_assert!(labels.get(pair.left()).is_some());
        }
        let touched: BTreeSet<usize> = matches
            .iter()
            .flat_map(|pair| [pair.left(), pair.right()])
            .collect();
        for position in 0..RECORDS {
            if !touched.contains(&position) {
                prop_assert_eq!(labels.get(position), None);
            }
        }
    }

    #[test]
    fn clustering_is_deterministic(matches in arb_pairs()) {
        prop_assert_eq!(cluster(&matches, RECORDS), cluster(&matches, RECORDS));
    }
}
