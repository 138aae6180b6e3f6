//! Method dispatch.

use std::fmt;
use std::sync::Arc;

use em_model::{FieldValue, MatchError, Pair, Result, SimilarityMethod};
use tracing::debug;

use crate::cosine::NgramCosine;
use crate::embedding::{EmbeddingProvider, EmbeddingSimilarity};
use crate::exact::ExactMatch;
use crate::levenshtein::IndelRatio;

/// A pairwise similarity function.
///
/// `left[i]` and `right[i]` are the two values of the i-th pair; the result
/// holds one score in `[0, 1]` per pair, in the same order.
pub trait Similarity {
    fn score(&self, left: &[Option<&FieldValue>], right: &[Option<&FieldValue>]) -> Vec<f64>;
}

/// Resolves a [`SimilarityMethod`] to its implementation.
///
/// Only embedding similarity needs outside state: a provider registered
/// with [`ScorerRegistry::with_embedding_provider`].
#[derive(Clone, Default)]
pub struct ScorerRegistry {
    embedding: Option<Arc<dyn EmbeddingProvider>>,
}

impl ScorerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding = Some(provider);
        self
    }

    pub fn has_embedding_provider(&self) -> bool {
        self.embedding.is_some()
    }

    /// Whether `method` can be scored with what is registered.
    pub fn supports(&self, method: SimilarityMethod) -> bool {
        !matches!(method, SimilarityMethod::Embedding) || self.has_embedding_provider()
    }

    /// The implementation for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Config`] for embedding similarity when no
    /// provider is registered.
    pub fn scorer(&self, method: SimilarityMethod) -> Result<Box<dyn Similarity + '_>> {
        match method {
            SimilarityMethod::Exact => Ok(Box::new(ExactMatch)),
            SimilarityMethod::Fuzzy { ngram_size } => Ok(Box::new(NgramCosine { ngram_size })),
            SimilarityMethod::Levenshtein => Ok(Box::new(IndelRatio)),
            SimilarityMethod::Embedding => match &self.embedding {
                Some(provider) => Ok(Box::new(EmbeddingSimilarity::new(provider.as_ref()))),
                None => Err(MatchError::config(
                    "embedding similarity requires an embedding provider",
                )),
            },
        }
    }
}

impl fmt::Debug for ScorerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScorerRegistry")
            .field("embedding", &self.embedding.as_ref().map(|p| p.name()))
            .finish()
    }
}

/// Score every pair of `column` with `method`, one score per pair in order.
///
/// Positions outside the column read as missing values.
pub fn score_pairs(
    method: SimilarityMethod,
    column: &[Option<FieldValue>],
    pairs: &[Pair],
    registry: &ScorerRegistry,
) -> Result<Vec<f64>> {
    let scorer = registry.scorer(method)?;
    let value_at = |position: usize| column.get(position).and_then(Option::as_ref);
    let left: Vec<Option<&FieldValue>> = pairs.iter().map(|pair| value_at(pair.left())).collect();
    let right: Vec<Option<&FieldValue>> =
        pairs.iter().map(|pair| value_at(pair.right())).collect();
    let scores = scorer.score(&left, &right);
    debug!(method = method.name(), pairs = pairs.len(), "scored pairs");
    Ok(scores)
}
