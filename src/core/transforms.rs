//! Row-level transformations from raw profilometer text to numeric tables.

use super::loaders::{CleanRecord, CleanedTable, RawRecord};

/// Row counts from one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningStats {
    /// Data rows read from the raw file.
    pub total_rows: usize,
    /// Rows whose height did not parse to a number.
    pub dropped_rows: usize,
}

impl CleaningStats {
    #[inline]
    pub fn kept_rows(&self) -> usize {
        self.total_rows - self.dropped_rows
    }
}

/// Keep only the characters that can form a decimal number: `0-9`, `.`, `-`.
///
/// Unit symbols, whitespace, and any other noise are removed.
///
/// # Example
///
/// ```
/// use profilometer_pipeline::core::transforms::sanitize_height;
///
/// assert_eq!(sanitize_height(" 3.14 Å"), "3.14");
/// assert_eq!(sanitize_height("N/A"), "");
/// ```
pub fn sanitize_height(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

/// Parse a height field, returning `None` if nothing numeric remains.
///
/// The field is sanitized first, so `"-12.0 Å"` parses to `-12.0` while
/// `"N/A"`, `"--"` or `"1.2.3"` do not parse.
pub fn parse_height(raw: &str) -> Option<f64> {
    let cleaned = sanitize_height(raw);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Convert raw rows to a clean table, dropping rows without a numeric height.
///
/// Row order and Position text are preserved.
pub fn clean_records(raw: &[RawRecord]) -> (CleanedTable, CleaningStats) {
    let mut table = CleanedTable::with_capacity(raw.len());

    for record in raw {
        if let Some(height) = parse_height(&record.height_raw) {
            table.push(CleanRecord::new(record.position.clone(), height));
        }
    }

    let stats = CleaningStats {
        total_rows: raw.len(),
        dropped_rows: raw.len() - table.len(),
    };

    (table, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_height() {
        assert_eq!(sanitize_height(" 3.14 Å"), "3.14");
        assert_eq!(sanitize_height("-12.5Å"), "-12.5");
        assert_eq!(sanitize_height("1,234.5 nm"), "1234.5");
        assert_eq!(sanitize_height("1e5"), "15");
        assert_eq!(sanitize_height("N/A"), "");
        assert_eq!(sanitize_height(""), "");
    }

    #[test]
    fn test_parse_height() {
        assert_eq!(parse_height(" 3.14 Å"), Some(3.14));
        assert_eq!(parse_height("-0.5"), Some(-0.5));
        assert_eq!(parse_height(".5"), Some(0.5));
        assert_eq!(parse_height("7."), Some(7.0));
        assert_eq!(parse_height("N/A"), None);
        assert_eq!(parse_height(""), None);
        assert_eq!(parse_height("-"), None);
        assert_eq!(parse_height("."), None);
        assert_eq!(parse_height("1-2"), None);
        assert_eq!(parse_height("1.2.3"), None);
    }

    #[test]
    fn test_parse_height_ignores_letters_that_spell_numbers() {
        // "inf"/"nan" are stripped before parsing, never reaching f64::from_str
        assert_eq!(parse_height("inf"), None);
        assert_eq!(parse_height("NaN"), None);
    }

    #[test]
    fn test_clean_records_drops_unparseable() {
        let raw = vec![
            RawRecord::new("12.5", " 3.14 Å"),
            RawRecord::new("7.0", " N/A"),
            RawRecord::new("13.0", "-2 Å"),
            RawRecord::new("14.0", ""),
        ];

        let (table, stats) = clean_records(&raw);

        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0], CleanRecord::new("12.5", 3.14));
        assert_eq!(table.records[1], CleanRecord::new("13.0", -2.0));
        assert_eq!(stats.total_rows, 4);
        assert_eq!(stats.dropped_rows, 2);
        assert_eq!(stats.kept_rows(), table.len());
    }

    #[test]
    fn test_clean_records_preserves_position_text() {
        let raw = vec![RawRecord::new(" 0.100 ", "1"), RawRecord::new("abc", "2")];

        let (table, _) = clean_records(&raw);

        assert_eq!(table.positions().collect::<Vec<_>>(), vec![" 0.100 ", "abc"]);
    }

    #[test]
    fn test_clean_records_empty() {
        let (table, stats) = clean_records(&[]);
        assert!(table.is_empty());
        assert_eq!(stats, CleaningStats::default());
    }
}
