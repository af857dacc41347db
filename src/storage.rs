//! Durable storage for recorded samples
//!
//! Two on-disk formats are used:
//!
//! - **Temp store**: append-only flat file of whitespace-separated
//!   `elapsed_time value` rows without a header. Overflow flushes append to
//!   it; it is truncated on reset (and after a save when configured).
//! - **Destination file**: CSV with an `elapsed_time,value` header, rewritten
//!   in full on every save.

use crate::error::{Result, ResultExt};
use crate::types::Sample;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Append-only store for flushed samples
#[derive(Debug, Clone)]
pub struct TempStore {
    path: PathBuf,
}

impl TempStore {
    /// Open a fresh temp store for a new session
    ///
    /// Rows left behind by an earlier session belong to a different clock,
    /// so they are discarded rather than merged into this session's saves.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::open(path)?;
        if !store.is_empty()? {
            tracing::warn!(
                "Discarding rows left in temp store {} by a previous session",
                store.path.display()
            );
            store.truncate()?;
        }
        Ok(store)
    }

    /// Open (or create) the temp store at `path`, keeping existing rows
    ///
    /// Parent directories are created if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create temp store directory {}", parent.display())
                })?;
            }
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open temp store {}", path.display()))?;
        Ok(Self { path })
    }

    /// Location of the store on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append samples to the end of the store
    pub fn append(&self, samples: &[Sample]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        self.append_or_rollback(|file| {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(b' ')
                .has_headers(false)
                .from_writer(file);
            for sample in samples {
                writer.serialize(sample)?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    /// Run `write` against the store, cutting the file back to its previous
    /// length if it fails so a retried flush never duplicates rows
    fn append_or_rollback<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&File) -> Result<()>,
    {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let start = file.metadata()?.len();

        if let Err(e) = write(&file) {
            if let Err(rollback) = file.set_len(start) {
                tracing::error!(
                    "Failed to roll back partial append to {}: {}",
                    self.path.display(),
                    rollback
                );
            }
            return Err(e);
        }
        Ok(())
    }

    /// Read every flushed sample in write order
    ///
    /// A missing file reads as an empty store.
    pub fn read_all(&self) -> Result<Vec<Sample>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(file);
        let mut samples = Vec::new();
        for row in reader.deserialize() {
            samples.push(row?);
        }
        Ok(samples)
    }

    /// Drop all stored samples
    pub fn truncate(&self) -> Result<()> {
        File::create(&self.path)
            .with_context(|| format!("Failed to truncate temp store {}", self.path.display()))?;
        Ok(())
    }

    /// Check if the store holds no rows
    pub fn is_empty(&self) -> Result<bool> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `samples` to `path` as CSV, replacing any existing file
///
/// Returns the number of data rows written.
pub fn write_destination<'a, I>(path: &Path, samples: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Sample>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    let mut rows = 0;
    for sample in samples {
        writer.serialize(sample)?;
        rows += 1;
    }
    // Header is emitted with the first row; an empty save still gets one
    if rows == 0 {
        writer.write_record(["elapsed_time", "value"])?;
    }
    writer.flush()?;
    Ok(rows)
}

/// Read a destination CSV written by [`write_destination`]
pub fn read_destination(path: &Path) -> Result<Vec<Sample>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut samples = Vec::new();
    for row in reader.deserialize() {
        samples.push(row?);
    }
    Ok(samples)
}
