//! Round-trip validation of processed profilometer files.
//!
//! Each configured raw file is cleaned again in memory and compared with the
//! processed CSV on disk. Three checks run per file and are all reported,
//! whatever the outcome of the others:
//!
//! 1. row counts are equal
//! 2. Position sequences are identical
//! 3. the largest absolute Height difference is within tolerance

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use super::cleaning::clean_profilometer_csv;
use crate::config::FileSpec;
use crate::core::loaders::{load_cleaned_csv, CleanRecord, CleanedTable};

/// The row holding the largest out-of-tolerance Height difference.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMismatch {
    pub row: usize,
    pub diff: f64,
    pub in_memory: CleanRecord,
    pub on_disk: CleanRecord,
}

/// Comparison of one file's in-memory and on-disk tables.
#[derive(Debug, Clone, PartialEq)]
pub struct FileValidation {
    pub name: String,
    pub in_memory_rows: usize,
    pub on_disk_rows: usize,
    pub positions_equal: bool,
    /// Largest absolute Height difference over the shared rows (0 if none).
    pub max_height_diff: f64,
    pub tolerance: f64,
    pub height_mismatch: Option<HeightMismatch>,
}

impl FileValidation {
    #[inline]
    pub fn row_count_ok(&self) -> bool {
        self.in_memory_rows == self.on_disk_rows
    }

    #[inline]
    pub fn positions_ok(&self) -> bool {
        self.positions_equal
    }

    #[inline]
    pub fn heights_ok(&self) -> bool {
        self.height_mismatch.is_none()
    }

    pub fn passed(&self) -> bool {
        self.row_count_ok() && self.positions_ok() && self.heights_ok()
    }

    /// Number of failed checks (0 to 3).
    pub fn failed_checks(&self) -> usize {
        [self.row_count_ok(), self.positions_ok(), self.heights_ok()]
            .iter()
            .filter(|ok| !**ok)
            .count()
    }

    /// Human-readable report, one line per check plus mismatch details.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(5);
        let name = &self.name;

        if self.row_count_ok() {
            lines.push(format!("[PASS] {}: row count {}", name, self.in_memory_rows));
        } else {
            lines.push(format!(
                "[FAIL] {}: row count mismatch in-memory vs on-disk: {} vs {}",
                name, self.in_memory_rows, self.on_disk_rows
            ));
        }

        if self.positions_ok() {
            lines.push(format!("[PASS] {}: Position column identical", name));
        } else {
            lines.push(format!("[FAIL] {}: Position column mismatch", name));
        }

        match &self.height_mismatch {
            None => lines.push(format!(
                "[PASS] {}: Height match within {} µm (max diff {:.2e})",
                name, self.tolerance, self.max_height_diff
            )),
            Some(m) => {
                lines.push(format!(
                    "[FAIL] {}: Height mismatch max diff = {:.2e} µm at row {}",
                    name, m.diff, m.row
                ));
                lines.push(format!("   in-memory: {}", format_record(&m.in_memory)));
                lines.push(format!("     on-disk: {}", format_record(&m.on_disk)));
            }
        }

        lines
    }
}

fn format_record(record: &CleanRecord) -> String {
    format!("{{Position: {:?}, Height: {}}}", record.position, record.height)
}

/// Aggregate result over every configured file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationSummary {
    pub files: Vec<FileValidation>,
}

impl ValidationSummary {
    /// True only if every check of every file passed.
    pub fn passed(&self) -> bool {
        self.files.iter().all(FileValidation::passed)
    }

    pub fn failed_checks(&self) -> usize {
        self.files.iter().map(FileValidation::failed_checks).sum()
    }
}

/// Compare an in-memory table with the one read back from disk.
///
/// Heights are compared element-wise over the rows both tables share. The
/// height check passes iff the largest absolute difference is `<=`
/// `tolerance`; a NaN difference always fails. The reported row is the
/// first one holding the largest difference.
///
/// # Arguments
///
/// * `name` - File name used in the report
/// * `in_memory` - Table freshly cleaned from the raw input
/// * `on_disk` - Table loaded from the processed CSV
/// * `tolerance` - Maximum accepted absolute Height difference
pub fn compare_tables(
    name: &str,
    in_memory: &CleanedTable,
    on_disk: &CleanedTable,
    tolerance: f64,
) -> FileValidation {
    let positions_equal =
        in_memory.len() == on_disk.len() && in_memory.positions().eq(on_disk.positions());

    // (row, diff) of the first maximum; total_cmp ranks NaN above every number
    let mut worst: Option<(usize, f64)> = None;
    for (row, (a, b)) in in_memory.heights().zip(on_disk.heights()).enumerate() {
        // Equal infinities subtract to NaN
        let diff = if a == b { 0.0 } else { (a - b).abs() };
        let is_worse = match worst {
            None => true,
            Some((_, current)) => diff.total_cmp(&current).is_gt(),
        };
        if is_worse {
            worst = Some((row, diff));
        }
    }

    let max_height_diff = worst.map_or(0.0, |(_, diff)| diff);

    let height_mismatch = match worst {
        Some((row, diff)) if !(diff <= tolerance) => Some(HeightMismatch {
            row,
            diff,
            in_memory: in_memory.records[row].clone(),
            on_disk: on_disk.records[row].clone(),
        }),
        _ => None,
    };

    FileValidation {
        name: name.to_string(),
        in_memory_rows: in_memory.len(),
        on_disk_rows: on_disk.len(),
        positions_equal,
        max_height_diff,
        tolerance,
        height_mismatch,
    }
}

/// Validate every configured file against its processed output.
///
/// # Errors
///
/// Returns an error if a raw or processed file cannot be loaded. Check
/// failures are not errors; they are recorded in the summary.
pub fn validate_all(
    raw_dir: &Path,
    processed_dir: &Path,
    specs: &[FileSpec],
    tolerance: f64,
) -> Result<ValidationSummary> {
    let mut summary = ValidationSummary {
        files: Vec::with_capacity(specs.len()),
    };

    for spec in specs {
        let input = raw_dir.join(spec.name);
        let processed = processed_dir.join(spec.name);

        let (in_memory, _) = clean_profilometer_csv(&input, spec)
            .with_context(|| format!("Failed to clean {}", input.display()))?;
        let on_disk = load_cleaned_csv(&processed)
            .with_context(|| format!("Failed to load {}", processed.display()))?;

        debug!(
            "{}: comparing {} in-memory rows with {} on-disk rows",
            spec.name,
            in_memory.len(),
            on_disk.len()
        );

        let result = compare_tables(spec.name, &in_memory, &on_disk, tolerance);
        info!(
            "{}: {} ({} failed checks)",
            spec.name,
            if result.passed() { "passed" } else { "failed" },
            result.failed_checks()
        );
        summary.files.push(result);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::writers::write_cleaned_csv;
    use crate::processors::cleaning::clean_all;
    use crate::processors::cleaning::tests::{create_raw_export, COMMA_SPEC, TAB_SPEC};
    use tempfile::TempDir;

    const TOL: f64 = 1e-6;

    fn table(rows: &[(&str, f64)]) -> CleanedTable {
        CleanedTable::from_records(rows.iter().map(|&(p, h)| CleanRecord::new(p, h)).collect())
    }

    #[test]
    fn test_compare_identical_tables() {
        let a = table(&[("0", 1.0), ("1", 2.0)]);
        let result = compare_tables("7s.csv", &a, &a.clone(), TOL);

        assert!(result.passed());
        assert_eq!(result.failed_checks(), 0);
        assert_eq!(result.max_height_diff, 0.0);
        assert_eq!(result.report_lines().len(), 3);
    }

    #[test]
    fn test_compare_tolerance_boundary_inclusive() {
        let a = table(&[("0", 0.0), ("1", 0.0)]);
        let b = table(&[("0", 0.0), ("1", 1e-6)]);

        let result = compare_tables("7s.csv", &a, &b, TOL);

        assert_eq!(result.max_height_diff, 1e-6);
        assert!(result.heights_ok());
        assert!(result.passed());
    }

    #[test]
    fn test_compare_just_over_tolerance_reports_row() {
        let a = table(&[("0", 0.0), ("1", 0.0), ("2", 0.0)]);
        let b = table(&[("0", 0.0), ("1", 0.0), ("2", 1e-6 + 1e-12)]);

        let result = compare_tables("7s.csv", &a, &b, TOL);

        assert!(!result.heights_ok());
        assert!(result.row_count_ok());
        assert!(result.positions_ok());
        assert_eq!(result.failed_checks(), 1);

        let mismatch = result.height_mismatch.as_ref().unwrap();
        assert_eq!(mismatch.row, 2);
        assert_eq!(mismatch.in_memory, CleanRecord::new("2", 0.0));
        assert_eq!(mismatch.on_disk, CleanRecord::new("2", 1e-6 + 1e-12));

        let lines = result.report_lines();
        assert!(lines.iter().any(|l| l.starts_with("[FAIL]") && l.contains("at row 2")));
    }

    #[test]
    fn test_compare_reports_first_maximum() {
        let a = table(&[("0", 0.0), ("1", 0.0), ("2", 0.0)]);
        let b = table(&[("0", 0.5), ("1", 1.0), ("2", 1.0)]);

        let result = compare_tables("7s.csv", &a, &b, TOL);

        assert_eq!(result.height_mismatch.unwrap().row, 1);
    }

    #[test]
    fn test_compare_nan_fails() {
        let a = table(&[("0", 1.0)]);
        let b = table(&[("0", f64::NAN)]);

        let result = compare_tables("7s.csv", &a, &b, TOL);

        assert!(!result.heights_ok());
    }

    #[test]
    fn test_compare_equal_infinities_pass() {
        let a = table(&[("0", 1.0), ("1", f64::INFINITY), ("2", f64::NEG_INFINITY)]);
        let b = table(&[("0", 1.0), ("1", f64::INFINITY), ("2", f64::NEG_INFINITY)]);

        let result = compare_tables("7s.csv", &a, &b, TOL);

        assert!(result.heights_ok());
        assert_eq!(result.max_height_diff, 0.0);
    }

    #[test]
    fn test_compare_infinity_against_number_fails() {
        let a = table(&[("0", f64::INFINITY)]);
        let b = table(&[("0", 1.0)]);

        let result = compare_tables("7s.csv", &a, &b, TOL);

        assert!(!result.heights_ok());
        assert_eq!(result.height_mismatch.unwrap().row, 0);
    }

    #[test]
    fn test_compare_position_mismatch() {
        let a = table(&[("0", 1.0), ("1", 2.0)]);
        let b = table(&[("0", 1.0), ("1.0", 2.0)]);

        let result = compare_tables("7s.csv", &a, &b, TOL);

        assert!(!result.positions_ok());
        assert!(result.row_count_ok());
        assert!(result.heights_ok());
        assert!(!result.passed());
    }

    #[test]
    fn test_compare_row_count_mismatch_reports_all_checks() {
        let a = table(&[("0", 1.0), ("1", 2.0), ("2", 3.0)]);
        let b = table(&[("0", 1.0), ("1", 2.0)]);

        let result = compare_tables("40s.csv", &a, &b, TOL);

        assert!(!result.row_count_ok());
        assert!(!result.positions_ok());
        // shared rows agree
        assert!(result.heights_ok());
        assert_eq!(result.failed_checks(), 2);

        let lines = result.report_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("3 vs 2"));
    }

    #[test]
    fn test_compare_empty_tables() {
        let result = compare_tables("7s.csv", &CleanedTable::new(), &CleanedTable::new(), TOL);
        assert!(result.passed());
        assert_eq!(result.max_height_diff, 0.0);
    }

    #[test]
    fn test_summary_aggregates() {
        let good = compare_tables("a", &table(&[("0", 1.0)]), &table(&[("0", 1.0)]), TOL);
        let bad = compare_tables("b", &table(&[("0", 1.0)]), &table(&[("1", 9.0)]), TOL);

        let summary = ValidationSummary {
            files: vec![good.clone()],
        };
        assert!(summary.passed());

        let summary = ValidationSummary {
            files: vec![good, bad],
        };
        assert!(!summary.passed());
        assert_eq!(summary.failed_checks(), 2);
    }

    #[test]
    fn test_validate_self_consistent() {
        let temp_dir = TempDir::new().unwrap();
        let raw_dir = temp_dir.path().join("raw");
        let processed_dir = temp_dir.path().join("processed");
        create_raw_export(
            &raw_dir,
            &COMMA_SPEC,
            &[("12.5", " 3.14 Å"), ("7.0", " N/A"), ("13.0", "0.1 Å")],
        );
        create_raw_export(
            &raw_dir,
            &TAB_SPEC,
            &[("0.000", "-1234.5678 Å"), ("0.333", "2/3"), ("0.667", "1e-3")],
        );

        let specs = [COMMA_SPEC, TAB_SPEC];
        clean_all(&raw_dir, &processed_dir, &specs).unwrap();
        let summary = validate_all(&raw_dir, &processed_dir, &specs, TOL).unwrap();

        assert_eq!(summary.files.len(), 2);
        assert!(summary.passed());
        assert_eq!(summary.failed_checks(), 0);
    }

    #[test]
    fn test_validate_self_consistent_with_overflowing_height() {
        let temp_dir = TempDir::new().unwrap();
        let raw_dir = temp_dir.path().join("raw");
        let processed_dir = temp_dir.path().join("processed");
        let huge = "9".repeat(400);
        create_raw_export(&raw_dir, &COMMA_SPEC, &[("1", "1"), ("2", huge.as_str())]);

        let specs = [COMMA_SPEC];
        let cleaned = clean_all(&raw_dir, &processed_dir, &specs).unwrap();
        assert_eq!(cleaned[0].stats.kept_rows(), 2);

        let summary = validate_all(&raw_dir, &processed_dir, &specs, TOL).unwrap();
        assert!(summary.passed());
        assert_eq!(summary.files[0].max_height_diff, 0.0);
    }

    #[test]
    fn test_validate_detects_tampered_output() {
        let temp_dir = TempDir::new().unwrap();
        let raw_dir = temp_dir.path().join("raw");
        let processed_dir = temp_dir.path().join("processed");
        create_raw_export(&raw_dir, &COMMA_SPEC, &[("1", "1"), ("2", "2")]);

        clean_all(&raw_dir, &processed_dir, &[COMMA_SPEC]).unwrap();
        write_cleaned_csv(&processed_dir.join("7s.csv"), &table(&[("1", 1.0), ("2", 2.5)]))
            .unwrap();

        let summary = validate_all(&raw_dir, &processed_dir, &[COMMA_SPEC], TOL).unwrap();

        assert!(!summary.passed());
        assert_eq!(summary.files[0].height_mismatch.as_ref().unwrap().row, 1);
    }

    #[test]
    fn test_validate_missing_processed_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let raw_dir = temp_dir.path().join("raw");
        create_raw_export(&raw_dir, &COMMA_SPEC, &[("1", "1")]);

        let result = validate_all(&raw_dir, &temp_dir.path().join("processed"), &[COMMA_SPEC], TOL);

        assert!(result.is_err());
    }
}
