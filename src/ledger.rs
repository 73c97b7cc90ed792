//! Deletion ledger
//!
//! Append-only text file of [`DeletionRecord`]s, oldest first. Records are
//! added at the tail and removed by rewriting the whole file through a
//! sibling temp file and a rename.

use crate::error::{Result, RmsError};
use crate::record::{parse_records, DeletionRecord};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Ledger backed by a flat text file
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stat the absolute `path` and append a record for it, held under `holding_name`.
    ///
    /// Nothing is written when the stat fails.
    pub fn add(&self, path: &Path, holding_name: &str) -> Result<DeletionRecord> {
        if !path.is_absolute() {
            return Err(RmsError::InvalidPath(path.to_path_buf()));
        }
        let metadata = fs::symlink_metadata(path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "cannot stat, no record written");
            RmsError::path(path, e)
        })?;

        let record = DeletionRecord::capture(path, &metadata, holding_name);
        self.append(&record)?;
        Ok(record)
    }

    /// Append one pre-built record
    pub fn append(&self, record: &DeletionRecord) -> Result<()> {
        let line = record.to_line()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RmsError::path(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| RmsError::path(&self.path, e))?;
        tracing::debug!(path = %record.original_path.display(), holding = %record.holding_name, "ledger append");
        Ok(())
    }

    /// All records, oldest first
    pub fn records(&self) -> Result<Vec<DeletionRecord>> {
        parse_records(&self.read()?)
    }

    /// Newest record without removing it
    pub fn last(&self) -> Result<Option<DeletionRecord>> {
        Ok(self.records()?.pop())
    }

    /// Remove and return the newest record.
    ///
    /// An empty ledger yields `None` and the file is left untouched.
    pub fn pop_last(&self) -> Result<Option<DeletionRecord>> {
        let mut records = self.records()?;
        let Some(last) = records.pop() else {
            return Ok(None);
        };
        self.rewrite(&records)?;
        tracing::debug!(path = %last.original_path.display(), "ledger pop");
        Ok(Some(last))
    }

    /// Remove and return the record at `index` (0 = oldest)
    pub fn take(&self, index: usize) -> Result<DeletionRecord> {
        let mut records = self.records()?;
        if index >= records.len() {
            return Err(RmsError::EmptyLedger);
        }
        let taken = records.remove(index);
        self.rewrite(&records)?;
        tracing::debug!(path = %taken.original_path.display(), index, "ledger take");
        Ok(taken)
    }

    /// Byte count and raw text of the ledger
    pub fn enumerate(&self) -> Result<(usize, String)> {
        let content = self.read()?;
        Ok((content.len(), content))
    }

    /// Truncate the ledger to zero length
    pub fn clear(&self) -> Result<()> {
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| RmsError::path(&self.path, e))?;
        tracing::debug!(ledger = %self.path.display(), "ledger cleared");
        Ok(())
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| RmsError::path(&self.path, e))
    }

    /// Replace the file content with `records` via temp file + rename
    fn rewrite(&self, records: &[DeletionRecord]) -> Result<()> {
        let mut content = String::new();
        for record in records {
            content.push_str(&record.to_line()?);
        }

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, content).map_err(|e| RmsError::path(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            tracing::debug!(ledger = %self.path.display(), error = %e, "ledger rewrite failed");
            let _ = fs::remove_file(&tmp_path);
            RmsError::path(&self.path, e)
        })
    }
}
