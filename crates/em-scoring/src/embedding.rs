//! Embedding similarity over a caller-supplied provider.
//!
//! No provider ships with the matcher; callers that want learned similarity
//! implement [`EmbeddingProvider`] and register it on the matcher.

use std::collections::HashMap;
use std::fmt;

use em_model::FieldValue;

use crate::clamp_score;
use crate::registry::Similarity;

/// Maps text to a dense vector.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Cosine of two dense vectors; 0 when either is zero or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    clamp_score(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Scores pairs by the cosine of their embeddings. Each distinct value is
/// embedded once.
pub struct EmbeddingSimilarity<'a> {
    provider: &'a dyn EmbeddingProvider,
}

impl<'a> EmbeddingSimilarity<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider) -> Self {
        Self { provider }
    }
}

impl fmt::Debug for EmbeddingSimilarity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingSimilarity")
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl Similarity for EmbeddingSimilarity<'_> {
    fn score(&self, left: &[Option<&FieldValue>], right: &[Option<&FieldValue>]) -> Vec<f64> {
        let mut cache: HashMap<String, Vec<f32>> = HashMap::new();
        let mut embed = |value: &FieldValue| {
            let text = value.as_text().into_owned();
            cache
                .entry(text)
                .or_insert_with_key(|text| self.provider.embed(text))
                .clone()
        };
        left.iter()
            .zip(right)
            .map(|pair| match pair {
                (Some(a), Some(b)) => {
                    let a = embed(*a);
                    let b = embed(*b);
                    cosine_similarity(&a, &b)
                }
                _ => 0.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Letter-frequency vectors over a..z.
    struct LetterCounts;

    impl EmbeddingProvider for LetterCounts {
        fn embed(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0; 26];
            for ch in text.chars().filter(char::is_ascii_lowercase) {
                vector[(ch as u8 - b'a') as usize] += 1.0;
            }
            vector
        }
    }

    #[test]
    fn cosine_bounds() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[1.0, -1.0], &[-1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn anagrams_embed_identically() {
        let provider = LetterCounts;
        let similarity = EmbeddingSimilarity::new(&provider);
        let (a, b) = (FieldValue::text("listen"), FieldValue::text("silent"));
        let scores = similarity.score(&[Some(&a), Some(&a)], &[Some(&b), None]);
        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert_eq!(scores[1], 0.0);
    }
}
