//! Error types for entity matching.

use std::fmt;

use thiserror::Error;

/// Which registry an unknown method name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    BlockingOperation,
    BlockingProcess,
    Scoring,
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockingOperation => write!(f, "blocking operation"),
            Self::BlockingProcess => write!(f, "blocking process"),
            Self::Scoring => write!(f, "scoring method"),
        }
    }
}

/// Errors raised before or during a resolution run.
///
/// Every variant is fatal to the call; no partial results are produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MatchError {
    // === Configuration Errors ===
    /// The configuration is malformed or incomplete.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// A blocking or scoring method name is not supported.
    #[error("unknown {kind} '{name}'")]
    UnknownMethod { kind: MethodKind, name: String },

    // === Schema Errors ===
    /// A configured field is absent from the record table.
    #[error("column '{column}' not found in record table")]
    MissingColumn { column: String },

    // === DataFrame Errors ===
    /// A polars operation on the record table failed.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl MatchError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn unknown(kind: MethodKind, name: impl Into<String>) -> Self {
        Self::UnknownMethod {
            kind,
            name: name.into(),
        }
    }

    /// True for errors caused by the configuration rather than the data.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::UnknownMethod { .. })
    }

    /// Get the column name associated with this error, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::MissingColumn { column } => Some(column.as_str()),
            _ => None,
        }
    }
}

/// Result type for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;
