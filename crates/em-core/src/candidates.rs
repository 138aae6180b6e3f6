//! Candidate pair generation for a blocking configuration.

use em_blocking::{
    AdjacencyMatrix, english_stop_words, meta_blocks, pairs_from_blocks, purge_blocks,
    sorted_neighborhood, standard_blocking, token_blocking,
};
use em_model::{BlockingConfig, BlockingOperation, BlockingProcess, FieldValue, Pair, all_pairs};
use tracing::debug;

/// Pairs to score for `record_count` records.
///
/// `columns` holds the scored fields in configuration order. Without
/// blocking every pair is a candidate.
pub fn generate_candidates(
    blocking: Option<&BlockingConfig>,
    columns: &[&[Option<FieldValue>]],
    record_count: usize,
) -> Vec<Pair> {
    let Some(blocking) = blocking else {
        return all_pairs(record_count);
    };
    let purge = blocking.process.map(|process| match process {
        BlockingProcess::Purge {
            purging_threshold,
            edge_weight_threshold,
        } => (purging_threshold, edge_weight_threshold),
    });

    let pairs = match blocking.operation {
        BlockingOperation::Standard => {
            let per_field = columns.iter().map(|column| {
                let mut blocks = standard_blocking(column);
                if let Some((purging_threshold, _)) = purge {
                    blocks = purge_blocks(blocks, purging_threshold);
                }
                AdjacencyMatrix::from_pairs(&pairs_from_blocks(&blocks), record_count)
            });
            let mut graph = AdjacencyMatrix::union(per_field);
            if let Some((_, edge_weight_threshold)) = purge {
                graph = graph.prune(edge_weight_threshold);
            }
            graph.pairs()
        }
        BlockingOperation::Token => {
            let blocks = token_blocking(columns, english_stop_words());
            match purge {
                Some((purging_threshold, edge_weight_threshold)) => meta_blocks(
                    &purge_blocks(blocks, purging_threshold),
                    record_count,
                    edge_weight_threshold,
                ),
                None => AdjacencyMatrix::from_pairs(&pairs_from_blocks(&blocks), record_count)
                    .pairs(),
            }
        }
        BlockingOperation::SortedNeighborhood { window_size } => {
            sorted_neighborhood(columns, window_size)
        }
    };
    debug!(
        blocking = %blocking,
        records = record_count,
        candidates = pairs.len(),
        "generated candidate pairs"
    );
    pairs
}
