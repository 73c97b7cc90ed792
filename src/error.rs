//! Error types for rms
//!
//! Defines RmsError covering path, relocation and ledger failures.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// rms error type
#[derive(Debug)]
pub enum RmsError {
    // Path errors
    /// Path does not exist or access was denied
    PathError { path: PathBuf, source: io::Error },
    /// Path has no base name, is not UTF-8, or contains a newline
    InvalidPath(PathBuf),
    /// Path is the trash can itself, the ledger, or one of their parents
    ProtectedPath(PathBuf),

    // Relocation errors
    /// Rename could not be performed as a single atomic rename
    LinkError {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    // Ledger states
    /// No records to restore
    EmptyLedger,
    /// No record matches the requested name
    NotInTrash(String),
    /// Record pointed at a holding entry that no longer exists; the record was dropped
    MissingFromHolding {
        holding_path: PathBuf,
        original_path: PathBuf,
    },
    /// Ledger file could not be parsed
    CorruptLedger { offset: usize, reason: String },

    // System errors
    /// I/O error
    IoError(io::Error),
}

impl RmsError {
    /// Wrap an I/O failure on `path` as a PathError
    pub fn path(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::PathError {
            path: path.into(),
            source,
        }
    }

    /// Exit code for errors that reach the top level
    pub fn exit_code(&self) -> u8 {
        match self {
            // Empty trash is a recognized state, not a failure
            Self::EmptyLedger => 0,
            _ => 1,
        }
    }

    /// Short name of the error kind, printed before the OS message
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PathError { .. } => "PathError",
            Self::InvalidPath(_) => "InvalidPath",
            Self::ProtectedPath(_) => "ProtectedPath",
            Self::LinkError { .. } => "LinkError",
            Self::EmptyLedger => "EmptyLedger",
            Self::NotInTrash(_) => "NotInTrash",
            Self::MissingFromHolding { .. } => "MissingFromHolding",
            Self::CorruptLedger { .. } => "CorruptLedger",
            Self::IoError(_) => "IoError",
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::PathError { path, source } => {
                format!("PathError {}: {}", path.display(), source)
            }
            Self::InvalidPath(path) => {
                format!(
                    "cannot move '{}' to trash: not a valid target name",
                    path.display()
                )
            }
            Self::ProtectedPath(path) => {
                format!(
                    "refusing to move '{}': it holds the trash can or its ledger",
                    path.display()
                )
            }
            Self::LinkError { from, to, source } => {
                format!(
                    "LinkError rename {} {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::EmptyLedger => "Trash can is EMPTY.".to_string(),
            Self::NotInTrash(name) => format!("'{}' is not in the trash can", name),
            Self::MissingFromHolding {
                holding_path,
                original_path,
            } => {
                format!(
                    "cannot restore '{}': {} is gone from the trash can, record dropped",
                    original_path.display(),
                    holding_path.display()
                )
            }
            Self::CorruptLedger { offset, reason } => {
                format!("ledger is corrupt at byte {}: {}", offset, reason)
            }
            Self::IoError(e) => format!("I/O error: {}", e),
        }
    }
}

impl fmt::Display for RmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for RmsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PathError { source, .. } | Self::LinkError { source, .. } => Some(source),
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RmsError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

/// Result alias used across the crate
pub type Result<T, E = RmsError> = std::result::Result<T, E>;
