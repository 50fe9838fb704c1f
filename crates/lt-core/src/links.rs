//! Turning table rows into links and opening them

use crate::table::{Table, NAME_COLUMN, URL_COLUMN};
use serde::{Deserialize, Serialize};

/// How one row is presented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkItem {
    /// Clickable label pointing at a URL
    Link { label: String, url: String },
    /// Plain label, the row has no usable URL
    Label(String),
}

impl LinkItem {
    /// The text shown for this row
    pub fn label(&self) -> &str {
        match self {
            LinkItem::Link { label, .. } => label,
            LinkItem::Label(label) => label,
        }
    }

    /// The target, if this row is a link
    pub fn url(&self) -> Option<&str> {
        match self {
            LinkItem::Link { url, .. } => Some(url),
            LinkItem::Label(_) => None,
        }
    }
}

/// Render every row of `table`.
///
/// Rows become links only when the table has a `url` column and the cell is
/// not blank. The label is the `name` cell, or the row number when the
/// table has no `name` column.
pub fn render_rows(table: &Table) -> Vec<LinkItem> {
    let has_name = table.find_column(NAME_COLUMN).is_some();
    let has_url = table.has_url_column();

    table
        .records()
        .enumerate()
        .map(|(i, record)| {
            let label = if has_name {
                record.get(NAME_COLUMN).unwrap_or_default().to_string()
            } else {
                i.to_string()
            };
            let url = if has_url {
                record.get(URL_COLUMN).map(str::trim).unwrap_or_default()
            } else {
                ""
            };

            if url.is_empty() {
                LinkItem::Label(label)
            } else {
                LinkItem::Link {
                    label,
                    url: url.to_string(),
                }
            }
        })
        .collect()
}

/// Non-blank URLs in row order; empty when there is no `url` column
pub fn collect_urls(table: &Table) -> Vec<String> {
    render_rows(table)
        .into_iter()
        .filter_map(|item| match item {
            LinkItem::Link { url, .. } => Some(url),
            LinkItem::Label(_) => None,
        })
        .collect()
}

/// Something that can open a URL in an external browsing context
pub trait UrlOpener {
    /// Open one URL, returning a readable reason on failure
    fn open(&mut self, url: &str) -> Result<(), String>;
}

/// Result of opening a batch of URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenReport {
    /// URLs that were handed to the opener successfully
    pub opened: Vec<String>,
    /// URLs that failed, with the reason
    pub failures: Vec<(String, String)>,
}

/// Open every URL once, in order. A failure is recorded and the rest still open.
pub fn open_all<O: UrlOpener + ?Sized>(urls: &[String], opener: &mut O) -> OpenReport {
    let mut report = OpenReport::default();

    for url in urls {
        match opener.open(url) {
            Ok(()) => {
                tracing::debug!(url = %url, "opened");
                report.opened.push(url.clone());
            }
            Err(reason) => {
                tracing::warn!(url = %url, reason = %reason, "failed to open URL");
                report.failures.push((url.clone(), reason));
            }
        }
    }

    report
}
