//! Raw profilometer CSV cleaning.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::config::FileSpec;
use crate::core::loaders::{self, CleanedTable, LoaderError};
use crate::core::transforms::{clean_records, CleaningStats};
use crate::core::writers::{ensure_dir, write_cleaned_csv};

/// Outcome of cleaning one configured file.
#[derive(Debug, Clone)]
pub struct CleanedFile {
    /// Configured file name.
    pub name: &'static str,
    /// Where the processed CSV was written.
    pub output: PathBuf,
    /// Row counts of the cleaning pass.
    pub stats: CleaningStats,
}

/// Load a raw profilometer export and clean it.
///
/// Skips `spec.skip_rows` metadata lines and the header line, reads the
/// Position and Height columns, strips every character other than
/// `0-9`, `.` and `-` from the height, and drops rows that do not parse.
///
/// # Arguments
///
/// * `input` - Path to the raw CSV file
/// * `spec` - Separator and preamble length of this export
///
/// # Returns
///
/// The cleaned table (rows renumbered from 0) and the row counts.
///
/// # Errors
///
/// Returns an error if the file is missing or structurally malformed.
/// Unparseable heights are never an error.
pub fn clean_profilometer_csv(
    input: &Path,
    spec: &FileSpec,
) -> std::result::Result<(CleanedTable, CleaningStats), LoaderError> {
    let raw = loaders::load_raw_records(input, spec.delimiter, spec.skip_rows)?;
    let (table, stats) = clean_records(&raw);

    debug!(
        "{}: kept {} of {} rows ({} dropped)",
        input.display(),
        stats.kept_rows(),
        stats.total_rows,
        stats.dropped_rows
    );

    Ok((table, stats))
}

/// Clean every configured file and write the results.
///
/// The processed directory is created once before any file is written.
/// Files are handled in table order; the first failure aborts the pass.
///
/// # Arguments
///
/// * `raw_dir` - Directory holding the raw exports
/// * `processed_dir` - Directory receiving the cleaned CSVs
/// * `specs` - Files to clean
pub fn clean_all(raw_dir: &Path, processed_dir: &Path, specs: &[FileSpec]) -> Result<Vec<CleanedFile>> {
    ensure_dir(processed_dir)
        .with_context(|| format!("Failed to prepare output directory: {}", processed_dir.display()))?;

    let mut cleaned = Vec::with_capacity(specs.len());

    for spec in specs {
        let input = raw_dir.join(spec.name);
        let output = processed_dir.join(spec.name);

        let (table, stats) = clean_profilometer_csv(&input, spec)
            .with_context(|| format!("Failed to clean {}", input.display()))?;

        write_cleaned_csv(&output, &table)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        info!("Cleaned {}: {} rows -> {}", spec.name, table.len(), output.display());

        cleaned.push(CleanedFile {
            name: spec.name,
            output,
            stats,
        });
    }

    Ok(cleaned)
}
