//! Project layout creation and pattern-based file routing.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use regex::Regex;
use thiserror::Error;

use crate::config::LayoutConfig;

/// Errors that can occur while organizing the dataset.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Failed to move {from} -> {to}: {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Folder scanned by a move rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTree {
    Images,
    Profilometer,
}

impl SourceTree {
    pub fn dir<'a>(&self, layout: &'a LayoutConfig) -> &'a Path {
        match self {
            SourceTree::Images => &layout.images_source,
            SourceTree::Profilometer => &layout.profilometer_source,
        }
    }
}

/// Folder receiving the entries of a move rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Calibration,
    Images3p2x,
    Images50x,
    ProfilometerRaw,
}

impl Destination {
    pub fn dir<'a>(&self, layout: &'a LayoutConfig) -> &'a Path {
        match self {
            Destination::Calibration => &layout.calibration_dir,
            Destination::Images3p2x => &layout.images_3p2x_dir,
            Destination::Images50x => &layout.images_50x_dir,
            Destination::ProfilometerRaw => &layout.raw_dir,
        }
    }
}

/// Move every entry of `source` whose name matches `pattern` into `dest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRule {
    pub source: SourceTree,
    pub pattern: &'static str,
    pub dest: Destination,
}

/// Routing rules, applied in order.
pub const MOVE_RULES: &[MoveRule] = &[
    // Lp/mm calibration targets
    MoveRule {
        source: SourceTree::Images,
        pattern: "100Lpmm_*.jpg",
        dest: Destination::Calibration,
    },
    MoveRule {
        source: SourceTree::Images,
        pattern: "25Lpmm_*.jpg",
        dest: Destination::Calibration,
    },
    MoveRule {
        source: SourceTree::Images,
        pattern: "*3p2x.*",
        dest: Destination::Images3p2x,
    },
    MoveRule {
        source: SourceTree::Images,
        pattern: "*50x*.jpg",
        dest: Destination::Images50x,
    },
    MoveRule {
        source: SourceTree::Profilometer,
        pattern: "*",
        dest: Destination::ProfilometerRaw,
    },
];

/// A single source -> destination move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// What an organize run did (or would do, for a dry run).
#[derive(Debug, Clone, Default)]
pub struct OrganizeReport {
    pub created_dirs: Vec<PathBuf>,
    pub moves: Vec<PlannedMove>,
    pub dry_run: bool,
}

/// Compile a shell-style file pattern into an anchored regex.
///
/// `*` matches any run of characters, `?` a single character; everything
/// else is literal and case-sensitive.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, OrganizeError> {
    let mut expr = String::with_capacity(pattern.len() * 2 + 2);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    expr.push('$');

    Regex::new(&expr).map_err(|e| OrganizeError::InvalidPattern {
        pattern: pattern.to_string(),
        source: e,
    })
}

/// List entries of `dir` whose names match `pattern`, sorted.
///
/// Hidden entries are not special: `*` matches `.DS_Store` too.
/// A missing or unreadable directory yields no matches.
pub fn find_matches(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, OrganizeError> {
    let regex = glob_to_regex(pattern)?;

    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|name| regex.is_match(name))
                .unwrap_or(false)
        })
        .collect();

    matches.sort();
    Ok(matches)
}

/// Create every directory of the project layout under `root`.
///
/// Existing directories are left untouched.
///
/// # Returns
///
/// The full list of layout directories.
pub fn create_layout(root: &Path, layout: &LayoutConfig) -> Result<Vec<PathBuf>, OrganizeError> {
    let mut created = Vec::new();

    for dir in layout.all_dirs() {
        let path = root.join(dir);
        fs::create_dir_all(&path).map_err(|e| OrganizeError::CreateDirectory {
            path: path.clone(),
            source: e,
        })?;
        created.push(path);
    }

    Ok(created)
}

/// Move an entry. Files that cannot be renamed across filesystems are
/// copied and the source removed; every other rename error is returned.
fn move_entry(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices && from.is_file() => {
            warn!("rename {} crosses filesystems, copying instead", from.display());
            copy_then_remove(from, to)
        }
        Err(e) => Err(e),
    }
}

/// Copy `from` to `to`, then delete `from`.
///
/// If the source cannot be deleted the copy is removed again, so a failed
/// move never leaves the file in both places.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;
    if let Err(e) = fs::remove_file(from) {
        if let Err(cleanup) = fs::remove_file(to) {
            warn!("could not remove partial copy {}: {}", to.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}

/// Create the project layout and route source files into it.
///
/// Rules from [`MOVE_RULES`] are applied in order; an entry claimed by an
/// earlier rule is not considered by later ones. Existing destinations are
/// never overwritten.
///
/// # Arguments
///
/// * `root` - Project root; all layout paths are relative to it
/// * `layout` - Directory names
/// * `dry_run` - If true, only report what would be done
///
/// # Errors
///
/// The first directory, pattern, or move failure aborts the run.
pub fn organize(root: &Path, layout: &LayoutConfig, dry_run: bool) -> Result<OrganizeReport, OrganizeError> {
    let mut report = OrganizeReport {
        dry_run,
        ..Default::default()
    };

    if !dry_run {
        report.created_dirs = create_layout(root, layout)?;
    }

    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for rule in MOVE_RULES {
        let source_dir = root.join(rule.source.dir(layout));
        if !source_dir.is_dir() {
            warn!("Source directory not found: {}", source_dir.display());
            continue;
        }

        let dest_dir = root.join(rule.dest.dir(layout));

        for path in find_matches(&source_dir, rule.pattern)? {
            if claimed.contains(&path) {
                continue;
            }

            let file_name = match path.file_name() {
                Some(name) => name,
                None => continue,
            };
            let dest = dest_dir.join(file_name);

            if dest.exists() {
                return Err(OrganizeError::DestinationExists(dest));
            }

            if !dry_run {
                move_entry(&path, &dest).map_err(|e| OrganizeError::MoveFailed {
                    from: path.clone(),
                    to: dest.clone(),
                    source: e,
                })?;
                info!("Moved {} -> {}", path.display(), dest.display());
            }

            claimed.insert(path.clone());
            report.moves.push(PlannedMove { from: path, to: dest });
        }
    }

    Ok(report)
}
