//! Record table ingestion for the entity matcher.
//!
//! - **CSV loading**: [`read_csv_frame`] reads every column as nullable text.
//! - **Preprocessing**: [`preprocess_columns`] lowercases and strips text
//!   columns and reduces identifier columns to their digits.
//! - **Output**: [`write_csv_frame`] writes a labeled frame back out.

mod csv_table;
mod error;
mod polars_utils;
mod preprocess;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading and Writing ===
pub use csv_table::{read_csv_frame, write_csv_frame};

// === Preprocessing ===
pub use preprocess::{normalize_number_text, normalize_text, preprocess_columns};

// === Polars Utilities ===
pub use polars_utils::{any_to_optional_string, any_to_string, string_values};
