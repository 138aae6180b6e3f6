//! Matching configuration.
//!
//! A configuration names the blocking strategy (optional) and one similarity
//! method per scored field. The JSON shape mirrors [`RawMatchConfig`]; parsing
//! validates every method tag up front so no unknown name survives to the
//! scoring or blocking stages.
//!
//! ```
//! use em_model::MatchConfig;
//!
//! let config = MatchConfig::from_json_str(
//!     r#"{"blocking": {"operation": "standard", "process": "purge"},
//!         "scoring": {"title": "fuzzy"}}"#,
//! )
//! .unwrap();
//! assert!(config.blocking().is_some());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MethodKind, Result};

/// Default decision threshold on the aggregate score (strictly greater).
pub const DEFAULT_THRESHOLD: f64 = 0.70;
/// Blocks at or above this size are dropped as unselective.
pub const DEFAULT_PURGING_THRESHOLD: usize = 1000;
/// Minimum co-occurrence weight an edge needs to survive meta-blocking.
pub const DEFAULT_EDGE_WEIGHT_THRESHOLD: u32 = 1;
/// Sorted-neighborhood window.
pub const DEFAULT_WINDOW_SIZE: usize = 3;
/// Character n-gram length for fuzzy scoring.
pub const DEFAULT_NGRAM_SIZE: usize = 3;

/// How candidate pairs are grouped before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingOperation {
    /// Exact key equality, one pass per scored field.
    Standard,
    /// Shared normalized tokens across all scored fields.
    Token,
    /// Sliding window over records sorted by the scored fields.
    SortedNeighborhood { window_size: usize },
}

impl BlockingOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Token => "token",
            Self::SortedNeighborhood { .. } => "sorted_neighborhood",
        }
    }

    fn parse(name: &str, window_size: usize) -> Result<Self> {
        match name {
            "standard" => Ok(Self::Standard),
            "token" => Ok(Self::Token),
            "sorted_neighborhood" => Ok(Self::SortedNeighborhood { window_size }),
            other => Err(MatchError::unknown(MethodKind::BlockingOperation, other)),
        }
    }
}

/// Post-blocking processing applied to buckets and the pair graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingProcess {
    /// Drop degenerate buckets, then prune weak edges (meta-blocking).
    Purge {
        purging_threshold: usize,
        edge_weight_threshold: u32,
    },
}

impl BlockingProcess {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Purge { .. } => "purge",
        }
    }

    fn parse(name: &str, purging_threshold: usize, edge_weight_threshold: u32) -> Result<Self> {
        match name {
            "purge" => Ok(Self::Purge {
                purging_threshold,
                edge_weight_threshold,
            }),
            other => Err(MatchError::unknown(MethodKind::BlockingProcess, other)),
        }
    }
}

impl Default for BlockingProcess {
    fn default() -> Self {
        Self::Purge {
            purging_threshold: DEFAULT_PURGING_THRESHOLD,
            edge_weight_threshold: DEFAULT_EDGE_WEIGHT_THRESHOLD,
        }
    }
}

/// Blocking strategy. The default is standard blocking followed by purging,
/// which is also what the matcher falls back to under memory pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingConfig {
    pub operation: BlockingOperation,
    pub process: Option<BlockingProcess>,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            operation: BlockingOperation::Standard,
            process: Some(BlockingProcess::default()),
        }
    }
}

impl fmt::Display for BlockingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.process {
            Some(process) => write!(f, "{}+{}", self.operation.name(), process.name()),
            None => f.write_str(self.operation.name()),
        }
    }
}

/// Per-field similarity method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMethod {
    Exact,
    Fuzzy { ngram_size: usize },
    Levenshtein,
    Embedding,
}

impl SimilarityMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy { .. } => "fuzzy",
            Self::Levenshtein => "levenshtein",
            Self::Embedding => "embedding",
        }
    }

    pub fn fuzzy() -> Self {
        Self::Fuzzy {
            ngram_size: DEFAULT_NGRAM_SIZE,
        }
    }
}

impl FromStr for SimilarityMethod {
    type Err = MatchError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "exact" => Ok(Self::Exact),
            "fuzzy" => Ok(Self::fuzzy()),
            "levenshtein" => Ok(Self::Levenshtein),
            "embedding" => Ok(Self::Embedding),
            other => Err(MatchError::unknown(MethodKind::Scoring, other)),
        }
    }
}

/// A scored field and its similarity method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldScoring {
    pub field: String,
    pub method: SimilarityMethod,
}

impl FieldScoring {
    pub fn new(field: impl Into<String>, method: SimilarityMethod) -> Self {
        Self {
            field: field.into(),
            method,
        }
    }
}

/// Validated, immutable matching configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatchConfig", into = "RawMatchConfig")]
pub struct MatchConfig {
    blocking: Option<BlockingConfig>,
    scoring: Vec<FieldScoring>,
}

impl MatchConfig {
    /// Build a configuration without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Config`] when `scoring` is empty or names a
    /// field twice.
    pub fn new(scoring: Vec<FieldScoring>) -> Result<Self> {
        if scoring.is_empty() {
            return Err(MatchError::config("scoring must name at least one field"));
        }
        for (idx, entry) in scoring.iter().enumerate() {
            if entry.field.trim().is_empty() {
                return Err(MatchError::config("scoring field names must not be empty"));
            }
            if scoring[..idx].iter().any(|prev| prev.field == entry.field) {
                return Err(MatchError::config(format!(
                    "field '{}' is scored more than once",
                    entry.field
                )));
            }
        }
        Ok(Self {
            blocking: None,
            scoring,
        })
    }

    #[must_use]
    pub fn with_blocking(mut self, blocking: BlockingConfig) -> Self {
        self.blocking = Some(blocking);
        self
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawMatchConfig = serde_json::from_str(json)
            .map_err(|err| MatchError::config(format!("malformed configuration: {err}")))?;
        Self::try_from(raw)
    }

    pub fn blocking(&self) -> Option<&BlockingConfig> {
        self.blocking.as_ref()
    }

    pub fn scoring(&self) -> &[FieldScoring] {
        &self.scoring
    }

    /// Scored field names in configuration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.scoring.iter().map(|entry| entry.field.as_str())
    }

    pub fn uses_method(&self, name: &str) -> bool {
        self.scoring.iter().any(|entry| entry.method.name() == name)
    }
}

/// Blocking section exactly as written in the JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBlockingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purging_threshold: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_weight_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<usize>,
}

impl RawBlockingConfig {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration document before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMatchConfig {
    #[serde(default)]
    pub blocking: RawBlockingConfig,
    pub scoring: BTreeMap<String, String>,
}

impl TryFrom<RawMatchConfig> for MatchConfig {
    type Error = MatchError;

    fn try_from(raw: RawMatchConfig) -> Result<Self> {
        let scoring = raw
            .scoring
            .iter()
            .map(|(field, method)| Ok(FieldScoring::new(field.clone(), method.parse()?)))
            .collect::<Result<Vec<_>>>()?;
        let config = Self::new(scoring)?;
        match parse_blocking(&raw.blocking)? {
            Some(blocking) => Ok(config.with_blocking(blocking)),
            None => Ok(config),
        }
    }
}

fn parse_blocking(raw: &RawBlockingConfig) -> Result<Option<BlockingConfig>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let Some(operation) = raw.operation.as_deref() else {
        return Err(MatchError::config(
            "blocking.operation is required when blocking is configured",
        ));
    };
    let window_size = raw.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
    if window_size == 0 {
        return Err(MatchError::config("blocking.window_size must be at least 1"));
    }
    let edge_weight_threshold = raw
        .edge_weight_threshold
        .unwrap_or(DEFAULT_EDGE_WEIGHT_THRESHOLD);
    if edge_weight_threshold == 0 {
        return Err(MatchError::config(
            "blocking.edge_weight_threshold must be at least 1",
        ));
    }
    let purging_threshold = raw.purging_threshold.unwrap_or(DEFAULT_PURGING_THRESHOLD);
    let operation = BlockingOperation::parse(operation, window_size)?;
    let process = raw
        .process
        .as_deref()
        .map(|name| BlockingProcess::parse(name, purging_threshold, edge_weight_threshold))
        .transpose()?;
    Ok(Some(BlockingConfig { operation, process }))
}

impl From<MatchConfig> for RawMatchConfig {
    fn from(config: MatchConfig) -> Self {
        let scoring = config
            .scoring
            .iter()
            .map(|entry| (entry.field.clone(), entry.method.name().to_string()))
            .collect();
        let blocking = match config.blocking {
            None => RawBlockingConfig::default(),
            Some(blocking) => {
                let mut raw = RawBlockingConfig {
                    operation: Some(blocking.operation.name().to_string()),
                    ..RawBlockingConfig::default()
                };
                if let BlockingOperation::SortedNeighborhood { window_size } = blocking.operation {
                    raw.window_size = Some(window_size);
                }
                if let Some(process) = blocking.process {
                    raw.process = Some(process.name().to_string());
                    let BlockingProcess::Purge {
                        purging_threshold,
                        edge_weight_threshold,
                    } = process;
                    raw.purging_threshold = Some(purging_threshold);
                    raw.edge_weight_threshold = Some(edge_weight_threshold);
                }
                raw
            }
        };
        Self { blocking, scoring }
    }
}
