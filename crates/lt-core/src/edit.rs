//! In-place edits to a link table
//!
//! This module provides:
//! - Edit operations on cells and rows
//! - Edit file format (JSON) for storing a batch of edits
//! - Applying edits to a table while collecting the ones that did not apply

use crate::error::{Error, Result};
use crate::table::{Row, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A single edit. Rows are addressed by 0-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    /// Replace one cell value
    SetCell {
        row: usize,
        column: String,
        value: String,
    },
    /// Append a row; columns not mentioned stay empty
    AppendRow { values: BTreeMap<String, String> },
    /// Remove a row; later rows shift up
    DeleteRow { row: usize },
}

impl Edit {
    /// Create a cell edit
    pub fn set_cell(row: usize, column: impl Into<String>, value: impl Into<String>) -> Self {
        Edit::SetCell {
            row,
            column: column.into(),
            value: value.into(),
        }
    }

    /// Create a row append from (column, value) pairs
    pub fn append_row<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Edit::AppendRow {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Create a row deletion
    pub fn delete_row(row: usize) -> Self {
        Edit::DeleteRow { row }
    }
}

/// A file containing a batch of edits for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFile {
    /// File name of the table these edits apply to
    pub table: String,
    /// Edits, applied in order
    pub edits: Vec<Edit>,
}

impl EditFile {
    /// Create a new empty edit file
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            edits: Vec::new(),
        }
    }

    /// Add an edit
    pub fn add_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Load an edit file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the edit file as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Result of applying edits
#[derive(Debug, Clone, Default)]
pub struct EditResult {
    /// Number of edits applied
    pub applied: usize,
    /// Edits that did not apply, with the reason
    pub failed: Vec<(Edit, String)>,
}

impl EditResult {
    /// True if at least one edit changed the table
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Apply edits in order. A failing edit is recorded and skipped.
pub fn apply_edits(table: &mut Table, edits: &[Edit]) -> EditResult {
    let mut result = EditResult::default();

    for edit in edits {
        match apply_edit(table, edit) {
            Ok(()) => result.applied += 1,
            Err(e) => {
                tracing::debug!(?edit, error = %e, "edit skipped");
                result.failed.push((edit.clone(), e.to_string()));
            }
        }
    }

    result
}

/// Apply a single edit
pub fn apply_edit(table: &mut Table, edit: &Edit) -> Result<()> {
    match edit {
        Edit::SetCell { row, column, value } => {
            let len = table.row_count();
            let col = table
                .column_index(column)
                .ok_or_else(|| Error::ColumnNotFound(column.clone()))?;
            let width = table.column_count();
            let cells = &mut table
                .rows
                .get_mut(*row)
                .ok_or(Error::RowOutOfRange { row: *row, len })?
                .cells;
            if cells.len() < width {
                cells.resize(width, String::new());
            }
            cells[col] = value.clone();
            Ok(())
        }
        Edit::AppendRow { values } => {
            for column in values.keys() {
                if table.find_column(column).is_none() {
                    table.push_column(column);
                }
            }
            let mut cells = vec![String::new(); table.column_count()];
            for (column, value) in values {
                if let Some(index) = table.column_index(column) {
                    cells[index] = value.clone();
                }
            }
            table.rows.push(Row::new(cells));
            Ok(())
        }
        Edit::DeleteRow { row } => {
            if *row >= table.row_count() {
                return Err(Error::RowOutOfRange {
                    row: *row,
                    len: table.row_count(),
                });
            }
            table.rows.remove(*row);
            Ok(())
        }
    }
}

/// Parse a `row:column:value` edit as given on the command line
pub fn parse_set_cell(arg: &str) -> Option<Edit> {
    let mut parts = arg.splitn(3, ':');
    let row = parts.next()?.trim().parse().ok()?;
    let column = parts.next()?;
    let value = parts.next()?;
    Some(Edit::set_cell(row, column, value))
}

/// Parse a `column=value,column=value` row as given on the command line
pub fn parse_append_row(arg: &str) -> Option<Edit> {
    let mut values = Vec::new();
    for pair in arg.split(',') {
        let (column, value) = pair.split_once('=')?;
        if column.trim().is_empty() {
            return None;
        }
        values.push((column.trim(), value));
    }
    Some(Edit::append_row(values))
}
