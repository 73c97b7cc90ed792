//! Relocation of entries between their original location and the holding directory
//!
//! Every move is a single `rename`. There is no copy fallback, so a move
//! across filesystems fails with `LinkError`.

use crate::error::{Result, RmsError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// `EXDEV` on Linux and macOS
#[cfg(unix)]
const CROSS_DEVICE: i32 = 18;
/// `ERROR_NOT_SAME_DEVICE`
#[cfg(windows)]
const CROSS_DEVICE: i32 = 17;
#[cfg(not(any(unix, windows)))]
const CROSS_DEVICE: i32 = -1;

/// Moves entries into and out of the holding directory
#[derive(Debug, Clone)]
pub struct Mover {
    holding_dir: PathBuf,
}

impl Mover {
    pub fn new(holding_dir: impl Into<PathBuf>) -> Self {
        Self {
            holding_dir: holding_dir.into(),
        }
    }

    pub fn holding_dir(&self) -> &Path {
        &self.holding_dir
    }

    /// Path of `holding_name` inside the holding directory
    pub fn holding_path(&self, holding_name: &str) -> PathBuf {
        self.holding_dir.join(holding_name)
    }

    /// First free `<n>_<base_name>` in the holding directory, starting at `hint`
    pub fn reserve_name(&self, base_name: &str, hint: usize) -> String {
        let mut seq = hint.max(1);
        loop {
            let name = format!("{}_{}", seq, base_name);
            // symlink_metadata so a dangling link still counts as taken
            if fs::symlink_metadata(self.holding_path(&name)).is_err() {
                return name;
            }
            seq += 1;
        }
    }

    /// Rename `source` to `holding_dir/holding_name`
    pub fn move_to_holding(&self, source: &Path, holding_name: &str) -> Result<PathBuf> {
        let destination = self.holding_path(holding_name);
        rename(source, &destination)?;
        tracing::debug!(from = %source.display(), to = %destination.display(), "moved to holding");
        Ok(destination)
    }

    /// Rename `holding_dir/holding_name` back to `destination`
    pub fn move_from_holding(&self, holding_name: &str, destination: &Path) -> Result<()> {
        let source = self.holding_path(holding_name);
        rename(&source, destination)?;
        tracing::debug!(from = %source.display(), to = %destination.display(), "moved from holding");
        Ok(())
    }

    /// Remove every entry inside the holding directory, keeping the directory.
    ///
    /// All entries are attempted; the first failure is returned afterwards.
    pub fn clear_holding(&self) -> Result<usize> {
        let entries =
            fs::read_dir(&self.holding_dir).map_err(|e| RmsError::path(&self.holding_dir, e))?;

        let mut removed = 0;
        let mut first_error = None;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    first_error.get_or_insert(RmsError::path(&self.holding_dir, e));
                    continue;
                }
            };

            match remove_entry(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "cannot remove trash entry");
                    first_error.get_or_insert(RmsError::path(&path, e));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }
}

/// Remove a file, symlink or directory tree without following links
fn remove_entry(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Single atomic rename.
///
/// The source is checked first, so any later failure other than a device
/// boundary or a denied source is blamed on the destination.
fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::symlink_metadata(from).map_err(|e| RmsError::path(from, e))?;

    fs::rename(from, to).map_err(|e| {
        if e.raw_os_error() == Some(CROSS_DEVICE) {
            return RmsError::LinkError {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source: e,
            };
        }
        match e.kind() {
            io::ErrorKind::PermissionDenied if !parent_writable(to) => RmsError::path(to, e),
            io::ErrorKind::PermissionDenied => RmsError::path(from, e),
            // Missing destination parent, EISDIR, ENOTEMPTY, ENOTDIR
            _ => RmsError::path(to, e),
        }
    })
}

/// Best-effort check that the directory receiving `path` is not read-only
fn parent_writable(path: &Path) -> bool {
    path.parent()
        .and_then(|parent| fs::metadata(parent).ok())
        .map_or(true, |meta| !meta.permissions().readonly())
}
