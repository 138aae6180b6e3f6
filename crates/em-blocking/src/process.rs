//! Bucket post-processing: purging and pair expansion.

use em_model::Pair;
use tracing::debug;

use crate::blocker::Blocks;

/// Keep only buckets with more than one member and fewer than
/// `purging_threshold` members.
///
/// Applying the same threshold twice yields the same blocks.
pub fn purge_blocks(mut blocks: Blocks, purging_threshold: usize) -> Blocks {
    let before = blocks.len();
    blocks.retain(|_, members| members.len() > 1 && members.len() < purging_threshold);
    debug!(
        purging_threshold,
        kept = blocks.len(),
        dropped = before - blocks.len(),
        "purged blocks"
    );
    blocks
}

/// Every 2-combination of each bucket's members.
///
/// A pair placed together by `k` buckets is emitted `k` times so that the
/// adjacency weight reflects co-occurrence. Repeated positions inside one
/// bucket never produce a self pair.
pub fn pairs_from_blocks(blocks: &Blocks) -> Vec<Pair> {
    let mut pairs = Vec::new();
    for members in blocks.values() {
        for (idx, &a) in members.iter().enumerate() {
            for &b in &members[idx + 1..] {
                if a != b {
                    pairs.push(Pair::new(a, b));
                }
            }
        }
    }
    pairs
}
