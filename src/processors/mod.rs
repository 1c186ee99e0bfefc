//! Data processing stages.

pub mod cleaning;
pub mod organizing;
pub mod validation;

// Re-export key types for convenience
pub use cleaning::{clean_all, clean_profilometer_csv, CleanedFile};
pub use organizing::{
    create_layout, find_matches, glob_to_regex, organize, MoveRule, OrganizeError,
    OrganizeReport, PlannedMove, MOVE_RULES,
};
pub use validation::{compare_tables, validate_all, FileValidation, HeightMismatch, ValidationSummary};
