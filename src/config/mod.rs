//! Configuration types for the profilometer pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Parse parameters for one raw profilometer export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSpec {
    /// File name, shared by the raw input and the processed output.
    pub name: &'static str,
    /// Field separator byte.
    pub delimiter: u8,
    /// Number of metadata lines preceding the header line.
    pub skip_rows: usize,
}

/// The profilometer exports this pipeline knows how to clean.
///
/// Supporting a new export means adding an entry here.
pub const PROFILOMETER_FILES: &[FileSpec] = &[
    FileSpec {
        name: "7s.csv",
        delimiter: b',',
        skip_rows: 12,
    },
    FileSpec {
        name: "40s.csv",
        delimiter: b'\t',
        skip_rows: 12,
    },
];

/// Default maximum absolute height difference (µm) for validation.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Directory layout of the project tree, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Unsorted image drop folder
    #[serde(default = "default_images_source")]
    pub images_source: PathBuf,

    /// Unsorted profilometer export drop folder
    #[serde(default = "default_profilometer_source")]
    pub profilometer_source: PathBuf,

    #[serde(default = "default_calibration_dir")]
    pub calibration_dir: PathBuf,

    #[serde(default = "default_images_3p2x_dir")]
    pub images_3p2x_dir: PathBuf,

    #[serde(default = "default_images_50x_dir")]
    pub images_50x_dir: PathBuf,

    /// Raw profilometer CSVs, input of the cleaning stage
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Cleaned profilometer CSVs, output of the cleaning stage
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Extra empty directories created alongside the data tree
    #[serde(default = "default_extra_dirs")]
    pub extra_dirs: Vec<PathBuf>,
}

fn default_images_source() -> PathBuf {
    PathBuf::from("Images")
}

fn default_profilometer_source() -> PathBuf {
    PathBuf::from("Profilometer_Data")
}

fn default_calibration_dir() -> PathBuf {
    PathBuf::from("data/images/calibration")
}

fn default_images_3p2x_dir() -> PathBuf {
    PathBuf::from("data/images/3p2x")
}

fn default_images_50x_dir() -> PathBuf {
    PathBuf::from("data/images/50x")
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/profilometer/raw")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/profilometer/processed")
}

fn default_extra_dirs() -> Vec<PathBuf> {
    ["notebooks", "scripts", "results/figures", "results/tables"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            images_source: default_images_source(),
            profilometer_source: default_profilometer_source(),
            calibration_dir: default_calibration_dir(),
            images_3p2x_dir: default_images_3p2x_dir(),
            images_50x_dir: default_images_50x_dir(),
            raw_dir: default_raw_dir(),
            processed_dir: default_processed_dir(),
            extra_dirs: default_extra_dirs(),
        }
    }
}

impl LayoutConfig {
    /// Every directory of the organized tree, in creation order.
    pub fn all_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = vec![
            self.calibration_dir.as_path(),
            self.images_3p2x_dir.as_path(),
            self.images_50x_dir.as_path(),
            self.raw_dir.as_path(),
            self.processed_dir.as_path(),
        ];
        dirs.extend(self.extra_dirs.iter().map(PathBuf::as_path));
        dirs
    }
}

/// Configuration for the round-trip validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Maximum absolute height difference (µm) still treated as equal
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Render configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, Box<dyn std::error::Error>> {
        Ok(serde_yaml::to_string(self)?)
    }
}
