//! Session state carried between render passes
//!
//! A successful save stores a one-shot notice; the next render takes it and
//! the file is cleared again.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Session file name, kept in the root directory
pub const SESSION_FILE: &str = ".lt-session.json";

/// A message waiting to be shown on the next render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// When the notice was set
    pub created_at: DateTime<Utc>,
    /// Text to show
    pub message: String,
}

/// Persisted session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Notice for the next render, if any
    #[serde(default)]
    pub pending_notice: Option<Notice>,
}

impl SessionState {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the session file for a root directory
    pub fn path_in<P: AsRef<Path>>(root: P) -> PathBuf {
        root.as_ref().join(SESSION_FILE)
    }

    /// Load session state, or an empty one if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save session state
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Replace the pending notice
    pub fn set_notice(&mut self, message: impl Into<String>) {
        self.pending_notice = Some(Notice {
            created_at: Utc::now(),
            message: message.into(),
        });
    }

    /// Take the pending notice, leaving none behind
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.pending_notice.take()
    }
}
