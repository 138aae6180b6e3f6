//! Shared data model for the entity matcher: field values, candidate pairs,
//! the validated matching configuration and the error taxonomy.

pub mod config;
pub mod error;
pub mod pair;
pub mod value;

pub use config::{
    BlockingConfig, BlockingOperation, BlockingProcess, DEFAULT_EDGE_WEIGHT_THRESHOLD,
    DEFAULT_NGRAM_SIZE, DEFAULT_PURGING_THRESHOLD, DEFAULT_THRESHOLD, DEFAULT_WINDOW_SIZE,
    FieldScoring, MatchConfig, RawBlockingConfig, RawMatchConfig, SimilarityMethod,
};
pub use error::{MatchError, MethodKind, Result};
pub use pair::{Pair, all_pairs};
pub use value::{FieldColumn, FieldValue, compare_nulls_last, format_numeric};
