//! Core table types for representing link tables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column holding the display label of a record
pub const NAME_COLUMN: &str = "name";
/// Column holding the target address of a record
pub const URL_COLUMN: &str = "url";

/// A table decoded from (or destined to) a single CSV file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions
    pub columns: Vec<Column>,
    /// Row data
    pub rows: Vec<Row>,
    /// Source file path
    pub source_path: PathBuf,
    /// Encoding the file was decoded with, if it came from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl Table {
    /// Create a new table with no columns and no rows
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            source_path,
            encoding: None,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name, ignoring ASCII case and surrounding whitespace
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.matches(name))
    }

    /// Position of a column by name (same matching as `find_column`)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.find_column(name).map(|c| c.index)
    }

    /// Whether the table can be rendered as links
    pub fn has_url_column(&self) -> bool {
        self.find_column(URL_COLUMN).is_some()
    }

    /// Get a cell by row position and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Iterate over all rows as records
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|r| Record {
            columns: &self.columns,
            row: r,
        })
    }

    /// Insert a column at `position`, filling existing rows with empty cells
    pub fn insert_column(&mut self, position: usize, name: &str) {
        let position = position.min(self.columns.len());
        self.columns
            .insert(position, Column::new(name.to_string(), position));
        for row in &mut self.rows {
            if row.cells.len() < position {
                row.cells.resize(position, String::new());
            }
            row.cells.insert(position, String::new());
        }
        self.reindex();
    }

    /// Append a column at the end, filling existing rows with empty cells
    pub fn push_column(&mut self, name: &str) {
        let position = self.columns.len();
        self.insert_column(position, name);
    }

    /// Ensure `name` and `url` columns exist.
    ///
    /// A missing `name` column is inserted first, a missing `url` column is
    /// appended. Existing columns and values are left alone, so applying
    /// this twice is the same as applying it once.
    pub fn normalize(&mut self) {
        if self.find_column(NAME_COLUMN).is_none() {
            self.insert_column(0, NAME_COLUMN);
        }
        if self.find_column(URL_COLUMN).is_none() {
            self.push_column(URL_COLUMN);
        }
    }

    fn reindex(&mut self) {
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.index = i;
        }
    }
}

/// Return `table` with the `name`/`url` schema guaranteed
pub fn normalize_schema(mut table: Table) -> Table {
    table.normalize();
    table
}

/// A table with exactly the `name` and `url` columns and no rows
pub fn create_empty<P: AsRef<Path>>(path: P) -> Table {
    let mut table = Table::new(path.as_ref().to_path_buf());
    table.normalize();
    table
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as written in the header
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }

    /// Case-insensitive name comparison
    pub fn matches(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// A row of data, one cell per column
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    /// Cell text, verbatim from the file
    pub cells: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// A row viewed through its table's header
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [Column],
    row: &'a Row,
}

impl<'a> Record<'a> {
    /// Look up a value by column name
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.columns.iter().find(|c| c.matches(column))?.index;
        self.row.get(index)
    }

    /// (column, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let (columns, row) = (self.columns, self.row);
        columns
            .iter()
            .map(move |c| (c.name.as_str(), row.get(c.index).unwrap_or("")))
    }
}
