//! Anchor clustering of matched pairs.

use std::collections::BTreeMap;

use em_model::Pair;
use tracing::debug;

use crate::labels::GroupLabels;

/// Assign group labels by sweeping matched pairs in order.
///
/// For a row `(a, b)` whose `a` is still unlabeled, `a` becomes an anchor:
/// it and the second member of every row starting with `a` are labeled `a`,
/// replacing any earlier label. Rows whose `a` already carries a label are
/// skipped. Positions at or beyond `record_count` are ignored.
pub fn cluster(matches: &[Pair], record_count: usize) -> GroupLabels {
    let mut partners: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for pair in matches {
        partners.entry(pair.left()).or_default().push(pair.right());
    }

    let mut labels = GroupLabels::unlabeled(record_count);
    let mut anchors = 0usize;
    for pair in matches {
        let anchor = pair.left();
        if anchor >= record_count || labels.get(anchor).is_some() {
            continue;
        }
        anchors += 1;
        labels.assign(anchor, anchor);
        for &member in partners.get(&anchor).into_iter().flatten() {
            labels.assign(member, anchor);
        }
    }
    debug!(
        matches = matches.len(),
        anchors,
        labeled = labels.labeled_count(),
        "clustered matches"
    );
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(usize, usize)]) -> Vec<Pair> {
        raw.iter().copied().map(Pair::from).collect()
    }

    #[test]
    fn empty_matches_leave_everything_unlabeled() {
        let labels = cluster(&[], 3);
        assert_eq!(labels.as_slice(), &[None, None, None]);
    }

    #[test]
    fn anchor_claims_all_of_its_partners() {
        let labels = cluster(&pairs(&[(0, 2), (0, 4), (1, 3)]), 5);
        assert_eq!(labels.as_slice(), &[Some(0), Some(1), Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn later_anchor_overwrites_earlier_label() {
        // 2 is claimed by 0, then re-claimed by 1
        let labels = cluster(&pairs(&[(0, 2), (1, 2)]), 3);
        assert_eq!(labels.as_slice(), &[Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn labeled_first_member_is_skipped() {
        // 1 is labeled through (0, 1), so (1, 2) starts no sweep
        let labels = cluster(&pairs(&[(0, 1), (1, 2)]), 3);
        assert_eq!(labels.as_slice(), &[Some(0), Some(0), None]);
    }

    #[test]
    fn clustering_is_deterministic() {
        let matches = pairs(&[(3, 5), (0, 1), (1, 4), (0, 5), (2, 6)]);
        assert_eq!(cluster(&matches, 7), cluster(&matches, 7));
    }
}
