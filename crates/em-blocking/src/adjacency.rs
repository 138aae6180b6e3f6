//! Sparse co-occurrence graph over record positions.
//!
//! Each stored cell `(i, j)` with `i < j` counts how often the two records
//! were placed together. Meta-blocking prunes cells below a weight threshold.

use std::collections::BTreeMap;

use em_model::Pair;
use tracing::debug;

use crate::blocker::Blocks;
use crate::process::pairs_from_blocks;

/// Upper-triangular sparse matrix of pair weights, iterated row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    record_count: usize,
    weights: BTreeMap<Pair, u32>,
}

impl AdjacencyMatrix {
    pub fn new(record_count: usize) -> Self {
        Self {
            record_count,
            weights: BTreeMap::new(),
        }
    }

    /// Accumulate one unit of weight per pair occurrence.
    pub fn from_pairs(pairs: &[Pair], record_count: usize) -> Self {
        let mut matrix = Self::new(record_count);
        for &pair in pairs {
            matrix.add(pair, 1);
        }
        matrix
    }

    pub fn add(&mut self, pair: Pair, weight: u32) {
        debug_assert!(
            pair.right() < self.record_count,
            "pair {pair} outside a {}-record matrix",
            self.record_count
        );
        if weight == 0 {
            return;
        }
        let cell = self.weights.entry(pair).or_insert(0);
        *cell = cell.saturating_add(weight);
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Weight of a cell; 0 when the pair was never co-placed.
    pub fn weight(&self, pair: Pair) -> u32 {
        self.weights.get(&pair).copied().unwrap_or(0)
    }

    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Keep only cells whose weight is at least `threshold`.
    #[must_use]
    pub fn prune(mut self, threshold: u32) -> Self {
        let before = self.weights.len();
        self.weights.retain(|_, weight| *weight >= threshold);
        debug!(
            threshold,
            kept = self.weights.len(),
            pruned = before - self.weights.len(),
            "pruned adjacency"
        );
        self
    }

    /// Non-zero cells in row-major order.
    pub fn pairs(&self) -> Vec<Pair> {
        self.weights.keys().copied().collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = (Pair, u32)> + '_ {
        self.weights.iter().map(|(&pair, &weight)| (pair, weight))
    }

    /// Elementwise sum. The result spans the largest input record count.
    pub fn union<I>(matrices: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut total = Self::default();
        for matrix in matrices {
            total.record_count = total.record_count.max(matrix.record_count);
            for (pair, weight) in matrix.weights {
                total.add(pair, weight);
            }
        }
        total
    }
}

/// Pairs that co-occur in at least `weight_threshold` blocks.
pub fn meta_blocks(blocks: &Blocks, record_count: usize, weight_threshold: u32) -> Vec<Pair> {
    AdjacencyMatrix::from_pairs(&pairs_from_blocks(blocks), record_count)
        .prune(weight_threshold)
        .pairs()
}

/// Distinct pairs produced by any of the block sets, row-major.
pub fn union_of_blocks(block_sets: &[Blocks], record_count: usize) -> Vec<Pair> {
    AdjacencyMatrix::union(
        block_sets
            .iter()
            .map(|blocks| AdjacencyMatrix::from_pairs(&pairs_from_blocks(blocks), record_count)),
    )
    .pairs()
}
