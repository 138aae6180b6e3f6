use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use em_core::{EntityMatcher, MatchConfig, MemoryBudget, Resolution};
use em_ingest::{preprocess_columns, read_csv_frame, string_values, write_csv_frame};
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};

use crate::cli::{MatchArgs, MatchInput, ReviewArgs, SparsityArgs};
use crate::review::{SparsityRow, similar_records, sparsity_summary};

const MIB: u64 = 1024 * 1024;

/// A matched group with the first scored field's value for each member.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub label: usize,
    pub positions: Vec<usize>,
    pub values: Vec<String>,
}

#[derive(Debug)]
pub struct MatchReport {
    pub input: PathBuf,
    pub records: usize,
    pub resolution: Resolution,
    /// Field shown next to each group member.
    pub display_field: String,
    pub groups: Vec<GroupSummary>,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ReviewReport {
    pub column: String,
    pub text: String,
    pub header: Vec<String>,
    /// Position, group label and rendered cells per record.
    pub rows: Vec<(usize, Option<usize>, Vec<String>)>,
}

#[derive(Debug)]
pub struct SparsityReport {
    pub by: String,
    pub columns: Vec<String>,
    pub rows: Vec<SparsityRow>,
}

pub fn load_config(path: &Path) -> Result<MatchConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("read match config {}", path.display()))?;
    MatchConfig::from_json_str(&json)
        .with_context(|| format!("parse match config {}", path.display()))
}

/// Load the input table and normalize the scored columns. Numeric columns
/// are reduced to digits, every other scored field is normalized as text.
pub fn load_table(input: &MatchInput, config: &MatchConfig) -> Result<DataFrame> {
    let mut df = read_csv_frame(&input.input)
        .with_context(|| format!("load {}", input.input.display()))?;
    if input.no_preprocess {
        debug!("preprocessing disabled");
        return Ok(df);
    }
    let numeric: Vec<&str> = input.numeric_columns.iter().map(String::as_str).collect();
    let text: Vec<&str> = config
        .fields()
        .filter(|field| !numeric.contains(field))
        .collect();
    preprocess_columns(&mut df, &text, &numeric).context("preprocess columns")?;
    Ok(df)
}

pub fn build_matcher(input: &MatchInput, config: MatchConfig) -> EntityMatcher {
    let mut matcher = EntityMatcher::new(config);
    if let Some(threshold) = input.threshold {
        matcher = matcher.with_threshold(threshold);
    }
    if let Some(budget_mb) = input.memory_budget_mb {
        matcher = matcher.with_resource_policy(MemoryBudget::new(budget_mb.saturating_mul(MIB)));
    }
    matcher
}

pub fn run_match(args: &MatchArgs) -> Result<MatchReport> {
    let span = info_span!("match", input = %args.input.input.display());
    let _guard = span.enter();

    let config = load_config(&args.input.config)?;
    let display_field = config
        .fields()
        .next()
        .map(str::to_string)
        .unwrap_or_default();
    let df = load_table(&args.input, &config)?;
    let matcher = build_matcher(&args.input, config);
    let resolution = matcher.resolve(&df).context("resolve duplicates")?;

    let display_values = string_values(&df, &display_field)?;
    let groups = resolution
        .labels
        .groups()
        .into_iter()
        .map(|(label, positions)| GroupSummary {
            label,
            values: positions
                .iter()
                .map(|&position| display_values[position].clone().unwrap_or_default())
                .collect(),
            positions,
        })
        .collect();

    if let Some(output) = &args.output {
        let labeled = resolution
            .labels
            .attach(&df, &args.group_column)
            .context("attach group labels")?;
        write_csv_frame(&labeled, output)
            .with_context(|| format!("write {}", output.display()))?;
        info!(path = %output.display(), "wrote labeled table");
    }

    Ok(MatchReport {
        input: args.input.input.clone(),
        records: df.height(),
        resolution,
        display_field,
        groups,
        output: args.output.clone(),
    })
}

pub fn run_review(args: &ReviewArgs) -> Result<ReviewReport> {
    let span = info_span!("review", input = %args.input.input.display());
    let _guard = span.enter();

    let config = load_config(&args.input.config)?;
    let df = load_table(&args.input, &config)?;
    let labels = build_matcher(&args.input, config)
        .get_matches(&df)
        .context("resolve duplicates")?;
    let positions = similar_records(&df, &labels, &args.column, &args.text)?;

    let header: Vec<String> = df
        .get_column_names()
        .iter()
        .map(ToString::to_string)
        .collect();
    let columns: Vec<Vec<Option<String>>> = header
        .iter()
        .map(|name| string_values(&df, name))
        .collect::<em_ingest::Result<_>>()?;
    let rows = positions
        .into_iter()
        .map(|position| {
            let cells = columns
                .iter()
                .map(|column| column[position].clone().unwrap_or_default())
                .collect();
            (position, labels.get(position), cells)
        })
        .collect();
    Ok(ReviewReport {
        column: args.column.clone(),
        text: args.text.clone(),
        header,
        rows,
    })
}

pub fn run_sparsity(args: &SparsityArgs) -> Result<SparsityReport> {
    let df = read_csv_frame(&args.input)
        .with_context(|| format!("load {}", args.input.display()))?;
    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();
    let rows = sparsity_summary(&df, &args.by, &columns)
        .with_context(|| format!("summarize sparsity by '{}'", args.by))?;
    Ok(SparsityReport {
        by: args.by.clone(),
        columns: args.columns.clone(),
        rows,
    })
}
