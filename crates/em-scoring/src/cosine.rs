//! Character n-gram cosine similarity.
//!
//! Values are lowercased, runs of whitespace collapse to a single space, and
//! the text is cut into overlapping character n-grams. Each value becomes an
//! L2-normalized count vector over a vocabulary fitted once per batch, so the
//! cosine of two values is the dot product of their vectors.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use em_model::{DEFAULT_NGRAM_SIZE, FieldValue};
use tracing::debug;

use crate::clamp_score;
use crate::registry::Similarity;

/// Sparse vector as `(feature index, weight)` sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn dot(&self, other: &Self) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut total = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_idx, a_weight) = self.entries[i];
            let (b_idx, b_weight) = other.entries[j];
            match a_idx.cmp(&b_idx) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    total += a_weight * b_weight;
                    i += 1;
                    j += 1;
                }
            }
        }
        total
    }

    fn normalized(mut self) -> Self {
        let norm = self
            .entries
            .iter()
            .map(|(_, weight)| weight * weight)
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut self.entries {
                *weight /= norm;
            }
        }
        self
    }
}

/// Character n-gram count vectorizer with a fitted vocabulary.
#[derive(Debug, Clone)]
pub struct NgramVectorizer {
    ngram_size: usize,
    vocabulary: BTreeMap<String, usize>,
}

impl NgramVectorizer {
    /// Fit a vocabulary over every n-gram found in `texts`.
    ///
    /// Feature indices follow the lexicographic order of the n-grams.
    pub fn fit<'a, I>(ngram_size: usize, texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ngram_size = ngram_size.max(1);
        let mut vocabulary = BTreeMap::new();
        for text in texts {
            for gram in char_ngrams(text, ngram_size) {
                vocabulary.entry(gram).or_insert(0);
            }
        }
        for (index, slot) in vocabulary.values_mut().enumerate() {
            *slot = index;
        }
        Self {
            ngram_size,
            vocabulary,
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// L2-normalized count vector; n-grams outside the vocabulary are ignored.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for gram in char_ngrams(text, self.ngram_size) {
            if let Some(&index) = self.vocabulary.get(&gram) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        SparseVector {
            entries: counts.into_iter().collect(),
        }
        .normalized()
    }
}

/// Lowercase the text, collapse whitespace runs and cut it into n-grams.
/// Text shorter than `ngram_size` characters yields nothing.
fn char_ngrams(text: &str, ngram_size: usize) -> Vec<String> {
    let chars: Vec<char> = collapse_whitespace(&text.to_lowercase()).chars().collect();
    if chars.len() < ngram_size {
        return Vec::new();
    }
    chars
        .windows(ngram_size)
        .map(|window| window.iter().collect())
        .collect()
}

fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut changed = false;
    while let Some(ch) = chars.next() {
        if ch.is_whitespace() && chars.peek().is_some_and(|next| next.is_whitespace()) {
            while chars.peek().is_some_and(|next| next.is_whitespace()) {
                chars.next();
            }
            out.push(' ');
            changed = true;
        } else {
            out.push(ch);
        }
    }
    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Cosine similarity of character n-gram count vectors.
#[derive(Debug, Clone, Copy)]
pub struct NgramCosine {
    pub ngram_size: usize,
}

impl Default for NgramCosine {
    fn default() -> Self {
        Self {
            ngram_size: DEFAULT_NGRAM_SIZE,
        }
    }
}

impl Similarity for NgramCosine {
    fn score(&self, left: &[Option<&FieldValue>], right: &[Option<&FieldValue>]) -> Vec<f64> {
        let left_texts: Vec<Cow<'_, str>> = left.iter().map(render).collect();
        let right_texts: Vec<Cow<'_, str>> = right.iter().map(render).collect();

        let vectorizer = NgramVectorizer::fit(
            self.ngram_size,
            left_texts.iter().chain(&right_texts).map(Cow::as_ref),
        );
        let mut cache: HashMap<&str, SparseVector> = HashMap::new();
        for text in left_texts.iter().chain(&right_texts) {
            cache
                .entry(text.as_ref())
                .or_insert_with(|| vectorizer.transform(text));
        }
        debug!(
            pairs = left.len(),
            vocabulary = vectorizer.vocabulary_len(),
            distinct_values = cache.len(),
            "n-gram vectors built"
        );

        left_texts
            .iter()
            .zip(&right_texts)
            .map(|(a, b)| match (cache.get::<str>(a), cache.get::<str>(b)) {
                (Some(a), Some(b)) => clamp_score(a.dot(b)),
                _ => 0.0,
            })
            .collect()
    }
}

fn render<'a>(value: &Option<&'a FieldValue>) -> Cow<'a, str> {
    value.map(FieldValue::as_text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(a: &str, b: &str) -> f64 {
        let (a, b) = (FieldValue::text(a), FieldValue::text(b));
        NgramCosine::default().score(&[Some(&a)], &[Some(&b)])[0]
    }

    #[test]
    fn ngrams_are_lowercased_and_collapsed() {
        assert_eq!(char_ngrams("AbC", 3), vec!["abc"]);
        assert_eq!(char_ngrams("a  b", 3), vec!["a b"]);
        assert!(char_ngrams("ab", 3).is_empty());
    }

    #[test]
    fn identical_values_score_one() {
        assert!((score("hey jude", "hey jude") - 1.0).abs() < 1e-9);
        assert!((score("Hey Jude", "hey  jude") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_trigrams_score_zero() {
        assert_eq!(score("abcdef", "uvwxyz"), 0.0);
    }

    #[test]
    fn short_and_missing_values_score_zero() {
        assert_eq!(score("ab", "ab"), 0.0);
        let a = FieldValue::text("yesterday");
        let scores = NgramCosine::default().score(&[Some(&a), None], &[None, None]);
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn partial_overlap_matches_hand_computed_cosine() {
        // "abcd" -> {abc, bcd}; "abce" -> {abc, bce}; one shared of two each
        assert!((score("abcd", "abce") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn repeated_ngrams_are_counted() {
        let vectorizer = NgramVectorizer::fit(3, ["aaaa"]);
        let vector = vectorizer.transform("aaaa");
        assert_eq!(vector.entries(), &[(0, 1.0)]);
        assert!(vectorizer.transform("xyz").is_zero());
    }
}
