//! Command-line interface for the profilometer pipeline.

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PROFILOMETER_FILES;
use crate::processors::ValidationSummary;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "profilometer-pipeline")]
#[command(about = "Profilometry dataset organizer and CSV cleaner", version)]
pub struct Cli {
    /// Project root containing the data tree
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project layout and move images and raw exports into it
    Organize {
        /// Preview changes without creating or moving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Clean every raw profilometer CSV, then validate the written files
    Clean,

    /// Validate existing processed files against their raw inputs
    Validate,

    /// Print the effective configuration as YAML
    ShowConfig,
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            format!("{}...", value.chars().take(35).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    let result = match cli.command {
        Commands::Organize { dry_run } => cmd_organize(&cli.root, dry_run, &config),
        Commands::Clean => cmd_clean(&cli.root, &config),
        Commands::Validate => cmd_validate(&cli.root, &config),
        Commands::ShowConfig => cmd_show_config(&config),
    };

    let code = exit_code(&result);
    if code != 0 {
        std::process::exit(code);
    }
}

/// Map a command outcome to the process exit status.
///
/// Failed checks and fatal errors both exit with 1; errors are logged
/// with their context chain.
fn exit_code(result: &Result<bool>) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

/// Create the layout and route source files into it.
fn cmd_organize(root: &Path, dry_run: bool, config: &PipelineConfig) -> Result<bool> {
    use crate::processors::organizing;

    let start = Instant::now();

    if dry_run {
        println!("DRY RUN: No directories will be created and no files moved");
    }

    let spinner = create_spinner("Organizing dataset...");
    let result = organizing::organize(root, &config.layout, dry_run);
    spinner.finish_and_clear();
    let report = result?;

    let verb = if dry_run { "Would move" } else { "Moved" };
    for planned in &report.moves {
        println!("{} {} -> {}", verb, planned.from.display(), planned.to.display());
    }

    print_summary(
        "Organize Complete",
        &[
            ("Root", root.display().to_string()),
            ("Directories ensured", report.created_dirs.len().to_string()),
            ("Entries moved", report.moves.len().to_string()),
            ("Dry run", dry_run.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    if !dry_run {
        println!("Folder structure created and raw files organized.");
    }
    Ok(true)
}

/// Clean all configured files, then validate them.
///
/// Returns `Ok(false)` when any validation check fails.
fn cmd_clean(root: &Path, config: &PipelineConfig) -> Result<bool> {
    use crate::processors::cleaning;

    let start = Instant::now();
    let raw_dir = root.join(&config.layout.raw_dir);
    let processed_dir = root.join(&config.layout.processed_dir);

    println!("Cleaning {} profilometer files...", PROFILOMETER_FILES.len());
    println!("Input directory: {}", raw_dir.display());
    println!("Output directory: {}", processed_dir.display());

    let spinner = create_spinner("Cleaning raw CSV files...");
    let result = cleaning::clean_all(&raw_dir, &processed_dir, PROFILOMETER_FILES);
    spinner.finish_and_clear();
    let cleaned = result?;

    for file in &cleaned {
        println!(
            "Cleaned {}: {} rows ({} dropped) -> {}",
            file.name,
            file.stats.kept_rows(),
            file.stats.dropped_rows,
            file.output.display()
        );
    }

    let summary = run_validation(&raw_dir, &processed_dir, config)?;
    let passed = summary.passed();

    print_summary(
        "Clean and Validate Complete",
        &[
            ("Files cleaned", cleaned.len().to_string()),
            (
                "Rows kept",
                cleaned.iter().map(|f| f.stats.kept_rows()).sum::<usize>().to_string(),
            ),
            ("Failed checks", summary.failed_checks().to_string()),
            ("Tolerance", config.validation.tolerance.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    print_verdict(&summary);
    Ok(passed)
}

/// Validate existing processed files.
fn cmd_validate(root: &Path, config: &PipelineConfig) -> Result<bool> {
    let start = Instant::now();
    let raw_dir = root.join(&config.layout.raw_dir);
    let processed_dir = root.join(&config.layout.processed_dir);

    let summary = run_validation(&raw_dir, &processed_dir, config)?;

    print_summary(
        "Validation Complete",
        &[
            ("Files checked", summary.files.len().to_string()),
            ("Failed checks", summary.failed_checks().to_string()),
            ("Tolerance", config.validation.tolerance.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    print_verdict(&summary);
    Ok(summary.passed())
}

fn cmd_show_config(config: &PipelineConfig) -> Result<bool> {
    let yaml = config
        .to_yaml_string()
        .map_err(|e| anyhow::anyhow!("Failed to render config: {}", e))?;
    print!("{}", yaml);
    Ok(true)
}

/// Run the validation pass and print the per-check report.
fn run_validation(raw_dir: &Path, processed_dir: &Path, config: &PipelineConfig) -> Result<ValidationSummary> {
    use crate::processors::validation;

    let spinner = create_spinner("Validating processed files...");
    let result = validation::validate_all(
        raw_dir,
        processed_dir,
        PROFILOMETER_FILES,
        config.validation.tolerance,
    );
    spinner.finish_and_clear();
    let summary = result?;

    for file in &summary.files {
        for line in file.report_lines() {
            println!("{}", line);
        }
    }

    Ok(summary)
}

fn print_verdict(summary: &ValidationSummary) {
    if summary.passed() {
        println!("All files cleaned and validated successfully.");
    } else {
        println!(
            "Some validation checks failed ({} failed checks).",
            summary.failed_checks()
        );
    }
}
