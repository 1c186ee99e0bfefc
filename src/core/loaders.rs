//! Data loaders for raw and processed profilometer CSV files.
//!
//! This module provides parsers for:
//! - Raw profilometer exports (Latin-1 text, metadata preamble, configurable separator)
//! - Processed `Position,Height` tables written by this crate

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use log::debug;
use thiserror::Error;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no header line after skipping {skip_rows} lines: {path}")]
    MissingHeader { path: PathBuf, skip_rows: usize },

    #[error("missing required columns in '{path}': {detail}")]
    MissingColumns { path: PathBuf, detail: String },

    #[error("parse error in '{path}' at row {row}: {detail}")]
    ParseError {
        path: PathBuf,
        row: usize,
        detail: String,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One data row of a raw profilometer export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Position label, verbatim.
    pub position: String,
    /// Height text, possibly carrying a unit symbol or other noise.
    pub height_raw: String,
}

impl RawRecord {
    pub fn new(position: impl Into<String>, height_raw: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            height_raw: height_raw.into(),
        }
    }
}

/// A row with a numeric height in micrometres.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub position: String,
    pub height: f64,
}

impl CleanRecord {
    pub fn new(position: impl Into<String>, height: f64) -> Self {
        Self {
            position: position.into(),
            height,
        }
    }
}

/// Ordered clean rows. Row `i` of the table is `records[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedTable {
    pub records: Vec<CleanRecord>,
}

impl CleanedTable {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new table with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn from_records(records: Vec<CleanRecord>) -> Self {
        Self { records }
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn push(&mut self, record: CleanRecord) {
        self.records.push(record);
    }

    #[inline]
    pub fn get(&self, row: usize) -> Option<&CleanRecord> {
        self.records.get(row)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleanRecord> {
        self.records.iter()
    }

    /// Position column in row order.
    pub fn positions(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.position.as_str())
    }

    /// Height column in row order.
    pub fn heights(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.height)
    }
}

/// Read a file as Latin-1 text (Windows-1252 superset).
///
/// Every byte maps to a character, so decoding itself cannot fail.
pub fn read_latin1<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let (text, _had_errors) = WINDOWS_1252.decode_without_bom_handling(&bytes);
    Ok(text.into_owned())
}

/// Return the text after the first `n` lines, or `None` if the text has
/// no content left past them.
fn skip_lines(text: &str, n: usize) -> Option<&str> {
    let mut rest = text;
    for _ in 0..n {
        let newline = rest.find('\n')?;
        rest = &rest[newline + 1..];
    }
    if rest.trim().is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Load the data rows of a raw profilometer export.
///
/// The expected layout:
/// - `skip_rows` metadata lines (ignored)
/// - Header line (ignored, but must have at least two fields)
/// - Data rows: Position, Height text, any further fields ignored
///
/// A data row lacking a height field yields an empty `height_raw`.
///
/// # Arguments
///
/// * `path` - Path to the raw CSV file
/// * `delimiter` - Field separator byte
/// * `skip_rows` - Number of metadata lines before the header
///
/// # Errors
///
/// Returns an error if the file cannot be read, has no header line, the
/// header has fewer than two fields, or the CSV is malformed.
pub fn load_raw_records<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
    skip_rows: usize,
) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let text = read_latin1(path)?;

    let body = skip_lines(&text, skip_rows).ok_or_else(|| LoaderError::MissingHeader {
        path: path.to_path_buf(),
        skip_rows,
    })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let csv_err = |e: csv::Error| LoaderError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let header_width = reader.headers().map_err(csv_err)?.len();
    if header_width < 2 {
        return Err(LoaderError::MissingColumns {
            path: path.to_path_buf(),
            detail: format!("header has {} field(s), expected at least 2", header_width),
        });
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        records.push(RawRecord::new(
            record.get(0).unwrap_or_default(),
            record.get(1).unwrap_or_default(),
        ));
    }

    debug!("{}: read {} raw rows", path.display(), records.len());
    Ok(records)
}

/// Load a processed `Position,Height` CSV.
///
/// Columns are located by header name; Position is kept verbatim and
/// Height must parse as a number.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks either column, or a
/// height value is not numeric.
pub fn load_cleaned_csv<P: AsRef<Path>>(path: P) -> Result<CleanedTable> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let csv_err = |e: csv::Error| LoaderError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let col_map: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim(), i))
        .collect();

    let (pos_idx, height_idx) = match (col_map.get("Position"), col_map.get("Height")) {
        (Some(&p), Some(&h)) => (p, h),
        _ => {
            return Err(LoaderError::MissingColumns {
                path: path.to_path_buf(),
                detail: format!("expected Position,Height, found {:?}", headers),
            })
        }
    };

    let mut table = CleanedTable::with_capacity(1024);

    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let position = record.get(pos_idx).unwrap_or_default();
        let height_text = record.get(height_idx).unwrap_or_default();

        let height: f64 = height_text
            .trim()
            .parse()
            .map_err(|_| LoaderError::ParseError {
                path: path.to_path_buf(),
                row,
                detail: format!("height '{}' is not a number", height_text),
            })?;

        table.push(CleanRecord::new(position, height));
    }

    Ok(table)
}
