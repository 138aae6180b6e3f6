//! Inspection helpers over a labeled table.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, bail};
use em_core::GroupLabels;
use em_ingest::string_values;
use polars::prelude::DataFrame;

/// Positions whose `column` contains `text` (case-insensitive), followed by
/// every other position sharing a group with one of them.
///
/// # Errors
///
/// Fails when `column` is missing, when `labels` does not cover the table,
/// or when no record contains `text`.
pub fn similar_records(
    df: &DataFrame,
    labels: &GroupLabels,
    column: &str,
    text: &str,
) -> Result<Vec<usize>> {
    if labels.len() != df.height() {
        bail!(
            "{} labels for a table of {} records",
            labels.len(),
            df.height()
        );
    }
    let needle = text.to_lowercase();
    let values = string_values(df, column)?;
    let hits: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, value)| {
            value
                .as_deref()
                .is_some_and(|value| value.to_lowercase().contains(&needle))
        })
        .map(|(position, _)| position)
        .collect();
    if hits.is_empty() {
        bail!("no record in column '{column}' contains '{text}'");
    }

    let groups: BTreeSet<usize> = hits.iter().filter_map(|&position| labels.get(position)).collect();
    let hit_set: BTreeSet<usize> = hits.iter().copied().collect();
    let members = (0..labels.len()).filter(|position| {
        !hit_set.contains(position)
            && labels
                .get(*position)
                .is_some_and(|label| groups.contains(&label))
    });
    Ok(hits.iter().copied().chain(members).collect())
}

/// Non-null counts for one value of the grouping column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityRow {
    /// Grouping value; `None` collects records where it is null.
    pub key: Option<String>,
    pub total: usize,
    /// Non-null count per requested column, in request order.
    pub non_null: Vec<usize>,
}

/// Count the non-null values of `columns` for each distinct value of `by`.
///
/// Rows are ordered by ascending key; the null key, if any, comes last.
pub fn sparsity_summary(df: &DataFrame, by: &str, columns: &[&str]) -> Result<Vec<SparsityRow>> {
    let keys = string_values(df, by)?;
    let values: Vec<Vec<Option<String>>> = columns
        .iter()
        .map(|&name| string_values(df, name))
        .collect::<em_ingest::Result<_>>()?;

    let mut rows: BTreeMap<String, SparsityRow> = BTreeMap::new();
    let mut null_row: Option<SparsityRow> = None;
    for (position, key) in keys.into_iter().enumerate() {
        let row = match key {
            Some(key) => rows.entry(key.clone()).or_insert_with(|| empty_row(Some(key), columns.len())),
            None => null_row.get_or_insert_with(|| empty_row(None, columns.len())),
        };
        row.total += 1;
        for (count, column) in row.non_null.iter_mut().zip(&values) {
            if column[position].is_some() {
                *count += 1;
            }
        }
    }
    Ok(rows.into_values().chain(null_row).collect())
}

fn empty_row(key: Option<String>, width: usize) -> SparsityRow {
    SparsityRow {
        key,
        total: 0,
        non_null: vec![0; width],
    }
}
