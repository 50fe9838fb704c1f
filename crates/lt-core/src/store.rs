//! Table store bound to a single root directory
//!
//! Every operation goes straight to the file system: nothing is cached
//! between calls, so a fresh `discover` always reflects the directory as it
//! is now.

use crate::error::{Error, Result};
use crate::parser::{parse_csv, parse_csv_bytes};
use crate::scanner::{discover, Discovery, TABLE_EXTENSION};
use crate::table::{create_empty, normalize_schema, Table};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root directory used when none is configured, relative to the working directory
pub const DEFAULT_ROOT_DIR: &str = "user_data";

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the table files
    pub root: PathBuf,
}

impl StoreConfig {
    /// Create a config for the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_DIR)
    }
}

/// What to do when an upload targets a file that already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadPolicy {
    /// Refuse before writing anything
    #[default]
    Reject,
    /// Replace the existing file
    Overwrite,
}

/// Outcome of a save; saving never returns an error to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
}

impl SaveOutcome {
    fn saved(path: &Path) -> Self {
        Self {
            success: true,
            message: format!("saved {}", display_name(path)),
        }
    }

    fn failed(err: &Error) -> Self {
        Self {
            success: false,
            message: format!("failed to save: {}", err),
        }
    }
}

/// Discovers, loads and persists tables under one root directory
#[derive(Debug, Clone)]
pub struct TableStore {
    config: StoreConfig,
}

impl TableStore {
    /// Create a store from a config
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Create a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::new(root))
    }

    /// The configured root directory
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Discover all tables as they are on disk
    pub fn discover(&self) -> Discovery {
        discover(self.root())
    }

    /// Validate a file name and turn it into a path under the root
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let file_name = validate_file_name(name)?;
        Ok(self.root().join(file_name))
    }

    /// Load one table by file name
    pub fn load(&self, name: &str) -> Result<Table> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(Error::TableNotFound(name.to_string()));
        }
        parse_csv(&path)
    }

    /// Save a table back to its own source path
    pub fn save(&self, table: &Table) -> SaveOutcome {
        save(table, &table.source_path)
    }

    /// Create a new, empty table file. Refuses to replace an existing file.
    pub fn create(&self, name: &str) -> Result<Table> {
        let path = self.resolve(name)?;
        if path.exists() {
            return Err(Error::AlreadyExists(path));
        }

        self.ensure_root()?;
        let table = create_empty(&path);
        write_table(&table, &path)?;
        tracing::info!(path = %path.display(), "created table");
        Ok(table)
    }

    /// Store externally supplied CSV bytes under `declared_name`.
    ///
    /// The bytes go through the same encoding fallback as files on disk.
    /// Empty input becomes an empty `name`/`url` table.
    pub fn upload(&self, declared_name: &str, bytes: &[u8], policy: UploadPolicy) -> Result<Table> {
        let path = self.resolve(declared_name)?;
        if path.exists() && policy == UploadPolicy::Reject {
            return Err(Error::AlreadyExists(path));
        }

        let table = if bytes.iter().all(u8::is_ascii_whitespace) {
            create_empty(&path)
        } else {
            normalize_schema(parse_csv_bytes(bytes, &path)?)
        };

        self.ensure_root()?;
        write_table(&table, &path)?;
        tracing::info!(path = %path.display(), rows = table.row_count(), "uploaded table");
        Ok(table)
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(self.root()).map_err(|e| Error::Write {
            path: self.root().to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Write `table` to `path`, reporting the outcome instead of failing
pub fn save<P: AsRef<Path>>(table: &Table, path: P) -> SaveOutcome {
    let path = path.as_ref();
    match write_table(table, path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), rows = table.row_count(), "saved table");
            SaveOutcome::saved(path)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "save failed");
            SaveOutcome::failed(&e)
        }
    }
}

/// Normalize and write a table as UTF-8 CSV, replacing the whole file.
///
/// The data goes to a hidden sibling file first and is renamed over the
/// target, so a failed write leaves the previous file in place.
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let table = normalize_schema(table.clone());
    let tmp = temp_path(path);

    let write_err = |message: String| Error::Write {
        path: path.to_path_buf(),
        message,
    };

    if let Err(e) = write_csv(&table, &tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e.to_string()));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e.to_string()));
    }

    Ok(())
}

fn write_csv(table: &Table, path: &Path) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    let width = table.column_count();

    writer.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
    for row in &table.rows {
        let cells = row
            .cells
            .iter()
            .map(String::as_str)
            .chain(std::iter::repeat(""))
            .take(width);
        writer.write_record(cells)?;
    }

    writer.flush()?;
    Ok(())
}

/// Sibling temp file. Its name does not grow with the target's, so any
/// name the file system accepts can also be saved.
fn temp_path(path: &Path) -> PathBuf {
    path.with_file_name(format!(".lt-save-{}.tmp", std::process::id()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Check a user-supplied file name and append the table extension if missing
pub fn validate_file_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidFileName("file name is empty".to_string()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::InvalidFileName(format!(
            "'{}' must be a plain file name",
            name
        )));
    }

    if Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TABLE_EXTENSION))
    {
        Ok(name.to_string())
    } else {
        Ok(format!("{}.{}", name, TABLE_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Column, Row};
    use tempfile::TempDir;

    fn store() -> (TempDir, TableStore) {
        let dir = TempDir::new().unwrap();
        let store = TableStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn test_validate_file_name() {
        assert_eq!(validate_file_name("sites.csv").unwrap(), "sites.csv");
        assert_eq!(validate_file_name(" news ").unwrap(), "news.csv");
        assert_eq!(validate_file_name("sites.CSV").unwrap(), "sites.CSV");
        assert_eq!(validate_file_name("notes.txt").unwrap(), "notes.txt.csv");
        assert!(matches!(
            validate_file_name("   "),
            Err(Error::InvalidFileName(_))
        ));
        assert!(validate_file_name("../escape.csv").is_err());
        assert!(validate_file_name("a\\b.csv").is_err());
        assert!(validate_file_name("..").is_err());
    }

    #[test]
    fn test_create_writes_name_url_header() {
        let (dir, store) = store();

        let table = store.create("new.csv").unwrap();

        assert_eq!(table.row_count(), 0);
        let content = fs::read_to_string(dir.path().join("new.csv")).unwrap();
        assert_eq!(content, "name,url\n");
    }

    #[test]
    fn test_create_rejects_existing_file() {
        let (dir, store) = store();
        let path = dir.path().join("sites.csv");
        fs::write(&path, "NAME,URL\nExample,https://example.com\n").unwrap();

        let err = store.create("sites.csv").unwrap_err();

        assert!(matches!(err, Error::AlreadyExists(_)));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "NAME,URL\nExample,https://example.com\n");
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let (dir, store) = store();
        assert!(matches!(store.create(""), Err(Error::InvalidFileName(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_makes_missing_root() {
        let dir = TempDir::new().unwrap();
        let store = TableStore::open(dir.path().join("user_data"));

        store.create("first").unwrap();

        assert!(dir.path().join("user_data").join("first.csv").is_file());
    }

    #[test]
    fn test_save_round_trip() {
        let (dir, store) = store();
        let path = dir.path().join("links.csv");
        let table = Table {
            columns: vec![
                Column::new("name".to_string(), 0),
                Column::new("url".to_string(), 1),
            ],
            rows: vec![
                Row::new(vec!["Hello, World".to_string(), "https://a.example/?q=\"x\"".to_string()]),
                Row::new(vec!["".to_string(), "https://b.example".to_string()]),
                Row::new(vec!["日本語".to_string(), "".to_string()]),
            ],
            source_path: path.clone(),
            encoding: None,
        };

        let outcome = store.save(&table);
        assert!(outcome.success, "{}", outcome.message);
        assert!(outcome.message.contains("links.csv"));

        let loaded = store.load("links.csv").unwrap();
        assert_eq!(loaded.columns, table.columns);
        assert_eq!(loaded.rows, table.rows);
        assert_eq!(loaded.encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_save_reinserts_dropped_url_column() {
        let (dir, store) = store();
        let path = dir.path().join("names.csv");
        let table = Table {
            columns: vec![Column::new("name".to_string(), 0)],
            rows: vec![
                Row::new(vec!["a".to_string()]),
                Row::new(vec!["b".to_string()]),
            ],
            source_path: path.clone(),
            encoding: None,
        };

        assert!(store.save(&table).success);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "name,url\na,\nb,\n");
    }

    #[test]
    fn test_save_failure_is_reported_not_raised() {
        let (dir, _store) = store();
        let path = dir.path().join("missing_dir").join("t.csv");

        let outcome = save(&create_empty(&path), &path);

        assert!(!outcome.success);
        assert!(outcome.message.starts_with("failed to save"));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (dir, store) = store();
        store.create("t.csv").unwrap();
        let table = store.load("t.csv").unwrap();

        assert!(store.save(&table).success);

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["t.csv"]);
    }

    #[test]
    fn test_upload_normalizes_and_decodes() {
        let (dir, store) = store();
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("タイトル\nメモ\n");

        let table = store
            .upload("memo.csv", &bytes, UploadPolicy::Reject)
            .unwrap();

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "タイトル", "url"]);
        let content = fs::read_to_string(dir.path().join("memo.csv")).unwrap();
        assert_eq!(content, "name,タイトル,url\n,メモ,\n");
    }

    #[test]
    fn test_upload_empty_bytes_creates_empty_table() {
        let (dir, store) = store();

        store.upload("blank", b"", UploadPolicy::Reject).unwrap();

        let content = fs::read_to_string(dir.path().join("blank.csv")).unwrap();
        assert_eq!(content, "name,url\n");
    }

    #[test]
    fn test_upload_collision_policy() {
        let (dir, store) = store();
        let path = dir.path().join("sites.csv");
        fs::write(&path, "name,url\nOld,https://old\n").unwrap();
        let bytes = b"name,url\nNew,https://new\n";

        let err = store
            .upload("sites.csv", bytes, UploadPolicy::Reject)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert!(fs::read_to_string(&path).unwrap().contains("Old"));

        store
            .upload("sites.csv", bytes, UploadPolicy::Overwrite)
            .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "name,url\nNew,https://new\n"
        );
    }

    #[test]
    fn test_load_missing_table() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load("nope.csv"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_discovered_tables_normalize_to_name_and_url() {
        let (dir, store) = store();
        fs::write(dir.path().join("a.csv"), "name\nA\n").unwrap();
        fs::write(dir.path().join("b.csv"), "URL,tag\nhttps://b,x\n").unwrap();
        fs::write(dir.path().join("c.csv"), "name,url\n").unwrap();

        let discovery = store.discover();

        assert_eq!(discovery.entries.len(), 3);
        for entry in discovery.entries {
            let table = normalize_schema(entry.table);
            assert!(table.find_column("name").is_some());
            assert!(table.has_url_column());
        }
    }

    #[test]
    fn test_shift_jis_table_discovered_saved_and_reloaded() {
        let (dir, store) = store();
        let content = "name,url\nグーグル,https://google.com\nｶﾅ,https://example.jp\n";
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(content);
        let path = dir.path().join("bookmarks.csv");
        fs::write(&path, &bytes).unwrap();

        let discovery = store.discover();
        assert!(discovery.issues.is_empty());
        let entry = discovery.find("bookmarks.csv").unwrap();
        assert_eq!(entry.table.encoding.as_deref(), Some("Shift_JIS"));
        assert_eq!(entry.table.cell(1, "name"), Some("ｶﾅ"));

        assert!(store.save(&entry.table).success);

        assert_eq!(fs::read_to_string(&path).unwrap(), content);
        let reloaded = store.load("bookmarks.csv").unwrap();
        assert_eq!(reloaded.encoding.as_deref(), Some("UTF-8"));
        assert_eq!(reloaded.columns, entry.table.columns);
        assert_eq!(reloaded.rows, entry.table.rows);
    }

    #[test]
    fn test_save_name_at_file_system_limit() {
        let (dir, store) = store();
        let name = format!("{}.csv", "a".repeat(251));
        store.create(&name).unwrap();
        let table = store.load(&name).unwrap();

        let outcome = store.save(&table);

        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_sites_scenario() {
        let (dir, store) = store();
        fs::write(
            dir.path().join("sites.csv"),
            "NAME,URL\nExample,https://example.com\nNoLink,\n",
        )
        .unwrap();

        let discovery = store.discover();
        let entry = discovery.find("sites.csv").unwrap();

        assert_eq!(entry.table.row_count(), 2);
        assert_eq!(entry.table.cell(0, "url"), Some("https://example.com"));
        assert_eq!(entry.table.cell(1, "name"), Some("NoLink"));
    }
}
