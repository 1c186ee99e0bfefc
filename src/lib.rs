//! Profilometry dataset organizer and CSV cleaning pipeline.
//!
//! This crate provides tools for:
//! - Creating the project directory layout and routing images and raw
//!   profilometer exports into it by filename pattern
//! - Cleaning raw profilometer CSVs into `Position,Height` tables
//! - Re-validating the processed files against a fresh in-memory clean
//!
//! # Example
//!
//! ```no_run
//! use profilometer_pipeline::config::PROFILOMETER_FILES;
//! use profilometer_pipeline::processors::{clean_all, validate_all};
//! use std::path::Path;
//!
//! let raw = Path::new("data/profilometer/raw");
//! let processed = Path::new("data/profilometer/processed");
//! clean_all(raw, processed, PROFILOMETER_FILES).unwrap();
//! let summary = validate_all(raw, processed, PROFILOMETER_FILES, 1e-6).unwrap();
//! assert!(summary.passed());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{FileSpec, LayoutConfig, PipelineConfig, ValidationConfig, PROFILOMETER_FILES};
pub use crate::core::loaders::{CleanRecord, CleanedTable, RawRecord};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
