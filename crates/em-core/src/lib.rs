//! Entity resolution over a polars record table.
//!
//! [`EntityMatcher`] runs the whole pipeline: candidate generation through
//! blocking, per-field similarity scoring, threshold decision, and anchor
//! clustering into group labels aligned with the input rows.

pub mod aggregate;
pub mod candidates;
pub mod cluster;
pub mod labels;
pub mod matcher;
pub mod resource;
pub mod table;

pub use aggregate::{FieldScores, MatchTable, ScoredPair, aggregate, decide, decide_aligned};
pub use candidates::generate_candidates;
pub use cluster::cluster;
pub use labels::{DEFAULT_GROUP_COLUMN, GroupLabels};
pub use matcher::{EntityMatcher, Resolution};
pub use resource::{MemoryBudget, ResourcePolicy, SystemMemory, pair_footprint, required_bytes};
pub use table::{any_to_field_value, field_column, frame_error, require_columns};

pub use em_model::{MatchConfig, MatchError, Result};
