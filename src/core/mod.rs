//! Core data types and I/O operations.

pub mod loaders;
pub mod transforms;
pub mod writers;

pub use loaders::{CleanRecord, CleanedTable, LoaderError, RawRecord};
pub use transforms::CleaningStats;
pub use writers::{write_cleaned_csv, WriteError};
