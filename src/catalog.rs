//! Directory cataloger: walks a tree and writes a tab-separated inventory.
//!
//! The catalog has a fixed four-column layout (`Filename`, `Size`,
//! `Date Modified`, `Date Created`), one row per regular file in walk order.
//! Files that cannot be inspected are skipped; a single unreadable entry
//! never aborts an otherwise complete catalog.

use std::fs::{self, Metadata, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::{CatalogError, Result};
use crate::types::{CatalogEntry, CatalogRequest, CatalogSummary, CreatedSource};

/// Column names of the header row, in output order.
pub const HEADER: [&str; 4] = ["Filename", "Size", "Date Modified", "Date Created"];

/// ISO-8601 local time without a zone suffix. Fractional seconds appear
/// only when non-zero.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const FIELD_DELIMITER: char = '\t';
const LINE_TERMINATOR: &str = "\r\n";

/// Creates a catalog of every file under `target_dir` at `output_file`.
///
/// Fails with [`CatalogError::NotFound`] when `target_dir` is not a
/// directory and with [`CatalogError::AlreadyExists`] when anything is
/// already present at `output_file`. Both checks happen before the walk
/// starts, and neither failure touches the filesystem. If writing fails
/// halfway, the partial output is removed.
pub fn create_catalog(target_dir: &str, output_file: &str) -> Result<CatalogSummary> {
    let target = Path::new(target_dir);
    let output = Path::new(output_file);

    if !target.is_dir() {
        return Err(CatalogError::NotFound {
            path: target_dir.to_string(),
        });
    }

    // symlink_metadata so a dangling link at the output path also counts.
    if output.symlink_metadata().is_ok() {
        return Err(CatalogError::AlreadyExists {
            path: output_file.to_string(),
        });
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => CatalogError::AlreadyExists {
                path: output_file.to_string(),
            },
            _ => CatalogError::Io(e),
        })?;

    let mut substitute = None;
    let entries = walk_directory(target).inspect(|entry| {
        if entry.created_source != CreatedSource::Birth {
            substitute.get_or_insert(entry.created_source);
        }
    });
    let file_count = write_catalog_file(entries, BufWriter::new(file), output)?;

    if let Some(source) = substitute {
        debug!(
            output_file,
            source = source.as_str(),
            "birth time unavailable; Date Created holds a substitute"
        );
    }
    info!(target_dir, output_file, file_count, "catalog created");
    Ok(CatalogSummary {
        target_dir: target_dir.to_string(),
        output_file: output_file.to_string(),
        file_count,
    })
}

/// Writes a catalog through `writer`, which must be open on `output`.
///
/// On failure the writer is closed and `output` is removed, so a catalog
/// is either complete or absent.
pub fn write_catalog_file<W, I>(entries: I, mut writer: W, output: &Path) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = CatalogEntry>,
{
    match write_catalog(entries, &mut writer) {
        Ok(count) => Ok(count),
        Err(e) => {
            drop(writer);
            if let Err(remove_err) = fs::remove_file(output) {
                warn!(
                    output = %output.display(),
                    error = %remove_err,
                    "failed to remove partial catalog"
                );
            }
            Err(e)
        }
    }
}

/// Runs [`create_catalog`] for a decoded request.
pub fn create_catalog_for(request: &CatalogRequest) -> Result<CatalogSummary> {
    create_catalog(&request.target_dir, &request.output_file)
}

/// Lazily walks `target` and yields an entry for every regular file.
///
/// Directory symlinks are not descended into. A symlink to a regular file
/// is reported with the metadata and canonical path of its target; broken
/// links and entries that fail to stat are skipped.
pub fn walk_directory(target: &Path) -> impl Iterator<Item = CatalogEntry> + '_ {
    WalkDir::new(target)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                debug!(error = %err, "skipping unreadable walk entry");
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        .filter_map(|entry| match describe_file(entry.path()) {
            Ok(described) => described,
            Err(err) => {
                debug!(path = %entry.path().display(), error = %err, "skipping file");
                None
            }
        })
}

/// Writes the header and one row per entry. Returns the number of rows.
pub fn write_catalog<W, I>(entries: I, writer: &mut W) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = CatalogEntry>,
{
    write_row(writer, &HEADER)?;

    let mut count = 0;
    for entry in entries {
        let path = entry.absolute_path.to_string_lossy();
        let size = entry.size_bytes.to_string();
        let modified = format_timestamp(&entry.modified_time);
        let created = format_timestamp(&entry.created_time);
        write_row(writer, &[&*path, size.as_str(), modified.as_str(), created.as_str()])?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

/// Formats a timestamp the way catalog rows store it.
pub fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

fn write_row<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(FIELD_DELIMITER);
        }
        line.push_str(&quote_field(field));
    }
    line.push_str(LINE_TERMINATOR);
    writer.write_all(line.as_bytes())
}

/// Quotes a field only when it contains the delimiter, a quote or a line
/// break. Embedded quotes are doubled.
fn quote_field(field: &str) -> String {
    let needs_quotes = field
        .chars()
        .any(|c| c == FIELD_DELIMITER || c == '"' || c == '\n' || c == '\r');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Reads metadata for one walk entry. `Ok(None)` means "not a regular file".
fn describe_file(path: &Path) -> io::Result<Option<CatalogEntry>> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Ok(None);
    }

    let absolute_path = fs::canonicalize(path)?;
    let modified_time: DateTime<Local> = metadata.modified()?.into();
    let (created_time, created_source) = creation_time(&metadata, modified_time);

    Ok(Some(CatalogEntry {
        absolute_path,
        size_bytes: metadata.len(),
        modified_time,
        created_time,
        created_source,
    }))
}

/// Picks the best available creation timestamp.
///
/// Prefers the OS birth time, then the Unix inode change time, then the
/// modification time.
fn creation_time(
    metadata: &Metadata,
    modified: DateTime<Local>,
) -> (DateTime<Local>, CreatedSource) {
    if let Ok(created) = metadata.created() {
        return (created.into(), CreatedSource::Birth);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let nanos = metadata.ctime_nsec() as u32;
        if let Some(changed) = DateTime::from_timestamp(metadata.ctime(), nanos) {
            return (changed.with_timezone(&Local), CreatedSource::StatusChange);
        }
    }

    (modified, CreatedSource::Modified)
}
