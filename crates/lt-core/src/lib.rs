//! lt-core: Core library for CSV link tables
//!
//! This library provides functionality to:
//! - Discover CSV tables in a root directory
//! - Decode files whose text encoding is unknown (UTF-8, Shift_JIS, EUC-JP, GBK, UTF-16LE)
//! - Guarantee the `name`/`url` schema and save tables back
//! - Apply cell and row edits
//! - Render rows as links and open them

pub mod edit;
pub mod encoding;
pub mod error;
pub mod links;
pub mod parser;
pub mod scanner;
pub mod session;
pub mod store;
pub mod table;

pub use edit::{apply_edit, apply_edits, Edit, EditFile, EditResult};
pub use error::{Error, Result};
pub use links::{collect_urls, open_all, render_rows, LinkItem, OpenReport, UrlOpener};
pub use parser::{parse_csv, parse_csv_bytes, parse_csv_str};
pub use scanner::{discover, Discovery, Issue, TableEntry};
pub use session::{Notice, SessionState};
pub use store::{save, SaveOutcome, StoreConfig, TableStore, UploadPolicy};
pub use table::{create_empty, normalize_schema, Column, Record, Row, Table};
