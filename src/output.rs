//! Delimited artifact I/O and console previews.
//!
//! Artifacts are written whole: rows go to a sibling temporary file that is
//! renamed over the target only after every row is flushed.

use crate::error::{Result, require_input};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A record type with a fixed column layout.
pub trait CsvArtifact: Serialize {
    const HEADERS: &'static [&'static str];
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// A fully written artifact waiting in its temporary sibling.
///
/// Nothing at the target changes until [`StagedArtifact::commit`]. Dropping
/// an uncommitted artifact removes the temporary file.
#[derive(Debug)]
pub struct StagedArtifact {
    tmp: PathBuf,
    target: PathBuf,
    rows: usize,
    committed: bool,
}

impl StagedArtifact {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Renames the staged file over the target; returns the data row count.
    pub fn commit(mut self) -> Result<usize> {
        fs::rename(&self.tmp, &self.target)?;
        self.committed = true;
        debug!(path = %self.target.display(), rows = self.rows, "Artifact written");
        Ok(self.rows)
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

/// Writes `records` to the temporary sibling of `path`, header first.
pub fn stage_records<T: CsvArtifact>(path: &Path, records: &[T]) -> Result<StagedArtifact> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staged = StagedArtifact {
        tmp: temp_sibling(path),
        target: path.to_path_buf(),
        rows: records.len(),
        committed: false,
    };
    write_to(&staged.tmp, records)?;
    Ok(staged)
}

/// Replaces `path` with a CSV of `records`, header first.
///
/// Returns the number of data rows written. On failure the previous file,
/// if any, is left untouched.
pub fn write_records<T: CsvArtifact>(path: &Path, records: &[T]) -> Result<usize> {
    stage_records(path, records)?.commit()
}

fn write_to<T: CsvArtifact>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(T::HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads every row of a CSV artifact written by [`write_records`].
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    require_input(path)?;
    let mut rdr = csv::Reader::from_path(path)?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Logs the first `limit` rows as JSON lines under `title`.
pub fn log_preview<T: Serialize>(title: &str, rows: &[T], limit: usize) -> Result<()> {
    info!("--- {} ({} of {} rows) ---", title, rows.len().min(limit), rows.len());
    for row in rows.iter().take(limit) {
        info!("{}", serde_json::to_string(row)?);
    }
    Ok(())
}
