//! CSV files to and from polars frames.
//!
//! Every column is read as nullable text; the first non-empty row is the
//! header. Numeric interpretation is left to the similarity methods.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use polars::prelude::{AnyValue, Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::polars_utils::any_to_string;

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Blank headers become `column_<n>`; repeated headers get a numeric suffix.
fn unique_headers(raw: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut headers = Vec::with_capacity(raw.len());
    for (idx, header) in raw.iter().enumerate() {
        let base = if header.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            header.clone()
        };
        let mut name = base.clone();
        let mut suffix = 2;
        while !seen.insert(name.clone()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        headers.push(name);
    }
    headers
}

/// Read a CSV file into a frame of nullable string columns.
///
/// Empty cells are null, short rows are padded with nulls, cells beyond the
/// header width are dropped and fully empty rows are skipped.
///
/// # Errors
///
/// Fails when the file cannot be opened, a record is malformed, or the file
/// has no header row.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|err| IngestError::open(path, err))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut headers: Option<Vec<String>> = None;
    let mut columns: Vec<Vec<Option<String>>> = Vec::new();
    let mut truncated_rows = 0usize;
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let cells: Vec<Option<String>> = record.iter().map(normalize_cell).collect();
        if cells.iter().all(Option::is_none) {
            continue;
        }
        if headers.is_none() {
            let raw: Vec<String> = record.iter().map(normalize_header).collect();
            columns = vec![Vec::new(); raw.len()];
            headers = Some(unique_headers(&raw));
            continue;
        }
        if cells.len() > columns.len() {
            truncated_rows += 1;
        }
        let mut cells = cells.into_iter();
        for column in &mut columns {
            column.push(cells.next().flatten());
        }
    }

    let Some(headers) = headers else {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    };
    if truncated_rows > 0 {
        debug!(
            path = %path.display(),
            truncated_rows,
            "dropped cells beyond the header width"
        );
    }
    let height = columns.first().map_or(0, Vec::len);
    let frame_columns: Vec<Column> = headers
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.as_str().into(), values).into_column())
        .collect();
    let df = DataFrame::new(frame_columns)?;
    debug!(
        path = %path.display(),
        rows = height,
        columns = df.width(),
        "loaded CSV"
    );
    Ok(df)
}

/// Write a frame as CSV with a header row. Nulls become empty cells.
pub fn write_csv_frame(df: &DataFrame, path: &Path) -> Result<()> {
    let write_error = |message: String| IngestError::CsvWrite {
        path: path.to_path_buf(),
        message,
    };
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|err| write_error(err.to_string()))?;

    let columns = df.get_columns();
    writer
        .write_record(columns.iter().map(|column| column.name().as_str()))
        .map_err(|err| write_error(err.to_string()))?;
    for idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|column| any_to_string(column.get(idx).unwrap_or(AnyValue::Null)));
        writer
            .write_record(row)
            .map_err(|err| write_error(err.to_string()))?;
    }
    writer.flush().map_err(|err| write_error(err.to_string()))?;
    debug!(path = %path.display(), rows = df.height(), "wrote CSV");
    Ok(())
}
