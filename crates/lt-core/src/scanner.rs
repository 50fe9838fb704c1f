//! Directory scanner for discovering link tables

use crate::error::{Error, Result};
use crate::parser::parse_csv;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extension of table files
pub const TABLE_EXTENSION: &str = "csv";

/// A discovered file and the table decoded from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    /// Full path to the file
    pub path: PathBuf,
    /// Decoded table, empty if decoding failed
    pub table: Table,
}

impl TableEntry {
    /// File name shown in listings (e.g. "sites.csv")
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A problem reported during discovery; none of these abort the scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    /// The root directory is missing (configuration error)
    DirectoryNotFound { path: PathBuf },
    /// One file could not be read at all
    Read { path: PathBuf, message: String },
    /// One file could not be decoded with any candidate encoding
    Decode { path: PathBuf, message: String },
}

impl Issue {
    /// Classify a per-file load failure
    pub fn from_load_error(path: &Path, err: &Error) -> Self {
        let path = path.to_path_buf();
        match err {
            Error::FileRead { source, .. } => Issue::Read {
                path,
                message: source.to_string(),
            },
            other => Issue::Decode {
                path,
                message: other.to_string(),
            },
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::DirectoryNotFound { path } => {
                write!(f, "directory does not exist: {}", path.display())
            }
            Issue::Read { path, message } => {
                write!(f, "could not read {}: {}", path.display(), message)
            }
            Issue::Decode { path, message } => {
                write!(f, "could not decode {}: {}", path.display(), message)
            }
        }
    }
}

/// Result of discovering a directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    /// Directory that was scanned
    pub root: PathBuf,
    /// One entry per matching file, sorted by path
    pub entries: Vec<TableEntry>,
    /// Reported problems
    pub issues: Vec<Issue>,
}

impl Discovery {
    /// Find an entry by file name
    pub fn find(&self, name: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// All file names, in display order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(TableEntry::name).collect()
    }

    /// True when no table files were found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Discover and decode every table file directly under `root`.
///
/// Never fails: a missing directory yields no entries and one
/// `DirectoryNotFound` issue, and a file that cannot be decoded keeps its
/// place in the listing with an empty table.
pub fn discover<P: AsRef<Path>>(root: P) -> Discovery {
    let root = root.as_ref();
    let mut discovery = Discovery {
        root: root.to_path_buf(),
        entries: Vec::new(),
        issues: Vec::new(),
    };

    let paths = match list_table_files(root) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "table directory unavailable");
            discovery.issues.push(Issue::DirectoryNotFound {
                path: root.to_path_buf(),
            });
            return discovery;
        }
    };

    for path in paths {
        let table = match parse_csv(&path) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load table");
                discovery.issues.push(Issue::from_load_error(&path, &e));
                Table::new(path.clone())
            }
        };
        discovery.entries.push(TableEntry { path, table });
    }

    discovery
}

/// List table files directly under `root`, sorted by path
pub fn list_table_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::DirectoryNotFound(root.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_file() && is_table_file(path) {
            paths.push(path.to_path_buf());
        }
    }

    Ok(paths)
}

/// Whether `path` carries the table file extension
pub fn is_table_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TABLE_EXTENSION))
}
