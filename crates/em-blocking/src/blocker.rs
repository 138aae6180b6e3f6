//! Blocking strategies.
//!
//! - [`standard_blocking`]: one bucket per exact field value.
//! - [`token_blocking`]: one bucket per token shared across a record's fields.
//! - [`sorted_neighborhood`]: pairs within a sliding window over sorted records.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use em_model::{FieldValue, Pair, compare_nulls_last};
use tracing::debug;

/// Block key to the positions that share it, positions in insertion order.
pub type Blocks = BTreeMap<String, Vec<usize>>;

/// Bucket every non-null value by its exact text. Nulls are never bucketed.
pub fn standard_blocking(values: &[Option<FieldValue>]) -> Blocks {
    let mut blocks = Blocks::new();
    for (position, value) in values.iter().enumerate() {
        if let Some(value) = value {
            blocks
                .entry(value.as_text().into_owned())
                .or_default()
                .push(position);
        }
    }
    debug!(
        records = values.len(),
        blocks = blocks.len(),
        "standard blocking complete"
    );
    blocks
}

/// Bucket each record under every distinct token of its concatenated fields.
///
/// `columns` are the fields to tokenize, each indexed by record position.
/// Tokens found in `stop_words` are skipped.
pub fn token_blocking(
    columns: &[&[Option<FieldValue>]],
    stop_words: &HashSet<&str>,
) -> Blocks {
    let record_count = columns.iter().map(|column| column.len()).max().unwrap_or(0);
    let mut blocks = Blocks::new();
    for position in 0..record_count {
        let joined = columns
            .iter()
            .filter_map(|column| column.get(position).and_then(Option::as_ref))
            .map(|value| value.as_text().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        let tokens: BTreeSet<&str> = tokenize(&joined)
            .into_iter()
            .filter(|token| !stop_words.contains(token))
            .collect();
        for token in tokens {
            blocks.entry(token.to_string()).or_default().push(position);
        }
    }
    debug!(
        records = record_count,
        blocks = blocks.len(),
        "token blocking complete"
    );
    blocks
}

/// Split text into word tokens. Runs of alphanumeric characters form words;
/// every other non-whitespace character is a token of its own.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() || ch == '_' {
            if word_start.is_none() {
                word_start = Some(idx);
            }
            continue;
        }
        if let Some(start) = word_start.take() {
            tokens.push(&text[start..idx]);
        }
        if !ch.is_whitespace() {
            tokens.push(&text[idx..idx + ch.len_utf8()]);
        }
    }
    if let Some(start) = word_start {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Pair every record with the `window_size` records sorted just before it.
///
/// Records whose key fields are all null are skipped. Sorting is stable and
/// lexicographic over `keys`, with nulls last inside each key.
pub fn sorted_neighborhood(keys: &[&[Option<FieldValue>]], window_size: usize) -> Vec<Pair> {
    let record_count = keys.iter().map(|column| column.len()).max().unwrap_or(0);
    let mut sorted: Vec<usize> = (0..record_count)
        .filter(|&position| keys.iter().any(|column| key_at(column, position).is_some()))
        .collect();
    sorted.sort_by(|&a, &b| {
        for column in keys {
            let ordering = compare_nulls_last(key_at(column, a), key_at(column, b));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    let mut pairs = Vec::new();
    for window_end in 1..sorted.len() {
        let window_start = window_end.saturating_sub(window_size);
        for &earlier in &sorted[window_start..window_end] {
            pairs.push(Pair::new(earlier, sorted[window_end]));
        }
    }
    debug!(
        records = sorted.len(),
        window_size,
        pairs = pairs.len(),
        "sorted neighborhood complete"
    );
    pairs
}

fn key_at(column: &[Option<FieldValue>], position: usize) -> Option<&FieldValue> {
    column.get(position).and_then(Option::as_ref)
}
