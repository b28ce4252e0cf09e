use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Where the value in a catalog's `Date Created` column came from.
///
/// Not every platform reports a birth time. Linux only does so through
/// `statx` on filesystems that record it; elsewhere the inode change time
/// is the closest substitute, and it moves on every permission or link
/// change. The source is kept next to the timestamp so it is never passed
/// off as a real creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatedSource {
    /// The filesystem reported a true creation (birth) time.
    Birth,
    /// Unix `st_ctime`, the last metadata change.
    StatusChange,
    /// Neither was available; the modification time is repeated.
    Modified,
}

impl CreatedSource {
    /// Returns the string representation of this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatedSource::Birth => "birth",
            CreatedSource::StatusChange => "status_change",
            CreatedSource::Modified => "modified",
        }
    }
}

/// Metadata for one regular file found during a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Canonicalized absolute path of the file.
    pub absolute_path: PathBuf,
    /// Size in bytes at scan time.
    pub size_bytes: u64,
    /// Last modification time, local timezone.
    pub modified_time: DateTime<Local>,
    /// Creation time, or its substitute; see `created_source`.
    pub created_time: DateTime<Local>,
    pub created_source: CreatedSource,
}

/// Input to a single cataloging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRequest {
    /// Directory to scan recursively.
    pub target_dir: String,
    /// Path of the catalog to create. Must not exist yet.
    pub output_file: String,
}

impl CatalogRequest {
    pub fn new(target_dir: impl Into<String>, output_file: impl Into<String>) -> Self {
        Self {
            target_dir: target_dir.into(),
            output_file: output_file.into(),
        }
    }
}

/// Outcome of a successful cataloging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub target_dir: String,
    pub output_file: String,
    /// Number of data rows written (the header is not counted).
    pub file_count: usize,
}
