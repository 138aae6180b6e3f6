//! Candidate-pair generation for entity matching.
//!
//! Blocking groups record positions into buckets that share a cheap key so
//! that only records in a common bucket are compared. Block processing then
//! turns buckets into a weighted pair graph and prunes edges that are not
//! corroborated by enough buckets (meta-blocking).

pub mod adjacency;
pub mod blocker;
pub mod process;
pub mod stopwords;

pub use adjacency::{AdjacencyMatrix, meta_blocks, union_of_blocks};
pub use blocker::{Blocks, sorted_neighborhood, standard_blocking, token_blocking, tokenize};
pub use process::{pairs_from_blocks, purge_blocks};
pub use stopwords::english_stop_words;
