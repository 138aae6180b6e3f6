//! Similarity scoring for candidate pairs.
//!
//! Every method implements [`Similarity`]: given the left and right values of
//! a batch of pairs it returns one score in `[0, 1]` per pair, in input order.
//! [`score_pairs`] selects the implementation for a configured
//! [`SimilarityMethod`](em_model::SimilarityMethod).

pub mod cosine;
pub mod embedding;
pub mod exact;
pub mod levenshtein;
pub mod registry;

pub use cosine::{NgramCosine, NgramVectorizer, SparseVector};
pub use embedding::{EmbeddingProvider, EmbeddingSimilarity, cosine_similarity};
pub use exact::ExactMatch;
pub use levenshtein::IndelRatio;
pub use registry::{ScorerRegistry, Similarity, score_pairs};

/// Clamp a raw score into `[0, 1]`; NaN scores as 0.
pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
