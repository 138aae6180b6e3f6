//! CLI argument definitions for the entity matcher.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "entity-matcher",
    version,
    about = "Entity matcher - find records that describe the same real-world entity",
    long_about = "Find duplicate records in a CSV table.\n\n\
                  Candidate pairs come from optional blocking, each configured field is\n\
                  scored with its similarity method, and pairs above the threshold are\n\
                  grouped into labeled clusters."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve duplicates in a CSV file and label each record with its group.
    Match(MatchArgs),

    /// Show the records containing a text together with their group members.
    Review(ReviewArgs),

    /// Count non-null values per column for each value of a grouping column.
    Sparsity(SparsityArgs),
}

/// Options shared by every command that runs the matcher.
#[derive(Parser)]
pub struct MatchInput {
    /// CSV file with one record per row.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// JSON matching configuration (`blocking` and `scoring`).
    #[arg(long = "config", value_name = "JSON")]
    pub config: PathBuf,

    /// Aggregate score a pair must exceed to match (default 0.70).
    #[arg(long = "threshold", value_name = "F", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Compare the raw values instead of lowercased, punctuation-free text.
    #[arg(long = "no-preprocess")]
    pub no_preprocess: bool,

    /// Columns reduced to their digits before matching.
    #[arg(long = "numeric-columns", value_name = "COLUMNS", value_delimiter = ',')]
    pub numeric_columns: Vec<String>,

    /// Memory available for all-pairs comparison, in MiB (default: system memory).
    ///
    /// When comparing every pair would exceed this budget and the
    /// configuration has no blocking, standard blocking with purging is
    /// applied instead.
    #[arg(long = "memory-budget-mb", value_name = "N")]
    pub memory_budget_mb: Option<u64>,
}

#[derive(Parser)]
pub struct MatchArgs {
    #[command(flatten)]
    pub input: MatchInput,

    /// Write the input table with a group column to this CSV file.
    #[arg(long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Name of the group label column in the output.
    #[arg(long = "group-column", value_name = "NAME", default_value = "group")]
    pub group_column: String,
}

#[derive(Parser)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub input: MatchInput,

    /// Column searched for the text.
    #[arg(long = "column", value_name = "COLUMN")]
    pub column: String,

    /// Case-insensitive text to look for.
    #[arg(long = "text", value_name = "TEXT")]
    pub text: String,
}

#[derive(Parser)]
pub struct SparsityArgs {
    /// CSV file with one record per row.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Column whose distinct values form the groups.
    #[arg(long = "by", value_name = "COLUMN")]
    pub by: String,

    /// Columns whose non-null values are counted.
    #[arg(
        long = "columns",
        value_name = "COLUMNS",
        value_delimiter = ',',
        required = true
    )]
    pub columns: Vec<String>,
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let threshold: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(format!("{threshold} is outside [0, 1]"))
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
