//! Candidate pairs of record positions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An unordered pair of distinct record positions, stored as `left < right`.
///
/// The derived ordering is row-major: by `left`, then by `right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pair {
    left: usize,
    right: usize,
}

impl Pair {
    /// Build a pair from two positions in either order.
    pub fn new(a: usize, b: usize) -> Self {
        debug_assert_ne!(a, b, "a pair needs two distinct positions");
        if a <= b {
            Self { left: a, right: b }
        } else {
            Self { left: b, right: a }
        }
    }

    pub fn left(self) -> usize {
        self.left
    }

    pub fn right(self) -> usize {
        self.right
    }

    pub fn contains(self, position: usize) -> bool {
        self.left == position || self.right == position
    }
}

impl From<(usize, usize)> for Pair {
    fn from((a, b): (usize, usize)) -> Self {
        Self::new(a, b)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.left, self.right)
    }
}

/// Every pair `(i, j)` with `i < j` over `record_count` positions, row-major.
pub fn all_pairs(record_count: usize) -> Vec<Pair> {
    let total = record_count * record_count.saturating_sub(1) / 2;
    let mut pairs = Vec::with_capacity(total);
    for left in 0..record_count {
        for right in (left + 1)..record_count {
            pairs.push(Pair { left, right });
        }
    }
    pairs
}
