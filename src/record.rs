//! Deletion records and their ledger line format
//!
//! One record per line:
//!
//! ```text
//! <mode> <size> <date> <time> <len>:<holding-name> <len>:<original-path>\n
//! ```
//!
//! The two free-form fields carry a byte-length prefix so names and paths
//! containing spaces survive a round trip.

use crate::error::{Result, RmsError};
use chrono::{Local, NaiveDateTime, SubsecRound};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Textual format of `deleted_at`, e.g. `2024-1-9 08:05:13`
pub const DATE_FORMAT: &str = "%Y-%-m-%-d %H:%M:%S";

/// One deleted item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRecord {
    /// Mode string, e.g. `-rw-r--r--`
    pub permissions: String,
    /// Size in bytes at deletion time (informational)
    pub size: u64,
    /// Local deletion time
    pub deleted_at: NaiveDateTime,
    /// Name of the entry inside the holding directory
    pub holding_name: String,
    /// Absolute path the item lived at
    pub original_path: PathBuf,
}

impl DeletionRecord {
    /// Build a record for `original_path` from its (non-followed) metadata
    pub fn capture(original_path: &Path, metadata: &Metadata, holding_name: &str) -> Self {
        Self {
            permissions: mode_string(metadata),
            size: metadata.len(),
            deleted_at: Local::now().naive_local().trunc_subsecs(0),
            holding_name: holding_name.to_string(),
            original_path: original_path.to_path_buf(),
        }
    }

    /// Base name of the original path, used as the default restore name
    pub fn original_name(&self) -> &str {
        self.original_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.holding_name)
    }

    /// Deletion time in `DATE_FORMAT`
    pub fn deleted_at_display(&self) -> String {
        self.deleted_at.format(DATE_FORMAT).to_string()
    }

    /// Serialize as a single newline-terminated ledger line
    pub fn to_line(&self) -> Result<String> {
        let path = checked_str(&self.original_path)?;
        if self.holding_name.contains('\n') {
            return Err(RmsError::InvalidPath(PathBuf::from(&self.holding_name)));
        }
        Ok(format!(
            "{} {} {} {}:{} {}:{}\n",
            self.permissions,
            self.size,
            self.deleted_at_display(),
            self.holding_name.len(),
            self.holding_name,
            path.len(),
            path,
        ))
    }
}

/// Reject paths the ledger cannot store: non-UTF-8 or containing a newline
pub fn checked_str(path: &Path) -> Result<&str> {
    match path.to_str() {
        Some(s) if !s.contains('\n') => Ok(s),
        _ => Err(RmsError::InvalidPath(path.to_path_buf())),
    }
}

/// Parse every record in `content`, oldest first. Blank lines are skipped.
pub fn parse_records(content: &str) -> Result<Vec<DeletionRecord>> {
    let mut records = Vec::new();
    let mut cursor = Cursor { text: content, pos: 0 };

    loop {
        cursor.skip_blank_lines();
        if cursor.at_end() {
            break;
        }
        records.push(cursor.record()?);
    }

    Ok(records)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_blank_lines(&mut self) {
        while self.rest().starts_with('\n') || self.rest().starts_with("\r\n") {
            self.pos += if self.rest().starts_with('\n') { 1 } else { 2 };
        }
    }

    fn corrupt(&self, start: usize, reason: impl Into<String>) -> RmsError {
        RmsError::CorruptLedger {
            offset: start,
            reason: reason.into(),
        }
    }

    /// Next space-terminated token
    fn token(&mut self, start: usize, field: &str) -> Result<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c == ' ' || c == '\n')
            .ok_or_else(|| self.corrupt(start, format!("truncated before {}", field)))?;
        if !rest[end..].starts_with(' ') || end == 0 {
            return Err(self.corrupt(start, format!("missing {}", field)));
        }
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    /// Next `<len>:<bytes>` field
    fn prefixed(&mut self, start: usize, field: &str) -> Result<&'a str> {
        let rest = self.rest();
        let colon = rest
            .find(':')
            .ok_or_else(|| self.corrupt(start, format!("missing length prefix for {}", field)))?;
        let len: usize = rest[..colon]
            .parse()
            .map_err(|_| self.corrupt(start, format!("bad length prefix for {}", field)))?;
        let body_start = colon + 1;
        let body_end = body_start
            .checked_add(len)
            .ok_or_else(|| self.corrupt(start, format!("length prefix for {} overflows", field)))?;
        if body_end > rest.len() || !rest.is_char_boundary(body_end) {
            return Err(self.corrupt(start, format!("{} shorter than its length prefix", field)));
        }
        self.pos += body_end;
        Ok(&rest[body_start..body_end])
    }

    fn expect(&mut self, start: usize, delimiter: char, allow_eof: bool) -> Result<()> {
        if allow_eof && self.at_end() {
            return Ok(());
        }
        if self.rest().starts_with(delimiter) {
            self.pos += delimiter.len_utf8();
            Ok(())
        } else {
            Err(self.corrupt(start, format!("expected {:?} after field", delimiter)))
        }
    }

    fn record(&mut self) -> Result<DeletionRecord> {
        let start = self.pos;

        let permissions = self.token(start, "permissions")?.to_string();
        let size = self
            .token(start, "size")?
            .parse::<u64>()
            .map_err(|_| self.corrupt(start, "size is not a number"))?;
        let date = self.token(start, "date")?;
        let time = self.token(start, "time")?;
        let deleted_at = NaiveDateTime::parse_from_str(&format!("{} {}", date, time), DATE_FORMAT)
            .map_err(|e| self.corrupt(start, format!("bad deletion date: {}", e)))?;

        let holding_name = self.prefixed(start, "holding name")?.to_string();
        self.expect(start, ' ', false)?;
        let original_path = PathBuf::from(self.prefixed(start, "original path")?);
        // The final record may lack its newline
        self.expect(start, '\n', true)?;

        Ok(DeletionRecord {
            permissions,
            size,
            deleted_at,
            holding_name,
            original_path,
        })
    }
}

/// `ls`-style mode string for an entry
#[cfg(unix)]
pub fn mode_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode();
    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        'd'
    } else if file_type.is_symlink() {
        'l'
    } else if file_type.is_file() {
        '-'
    } else {
        use std::os::unix::fs::FileTypeExt;
        if file_type.is_fifo() {
            'p'
        } else if file_type.is_socket() {
            's'
        } else if file_type.is_block_device() {
            'b'
        } else if file_type.is_char_device() {
            'c'
        } else {
            '?'
        }
    };

    let mut out = String::with_capacity(10);
    out.push(kind);
    for (shift, special, lower, upper) in [
        (6, 0o4000, 's', 'S'),
        (3, 0o2000, 's', 'S'),
        (0, 0o1000, 't', 'T'),
    ] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        let exec = bits & 0o1 != 0;
        out.push(match (mode & special != 0, exec) {
            (true, true) => lower,
            (true, false) => upper,
            (false, true) => 'x',
            (false, false) => '-',
        });
    }
    out
}

/// `ls`-style mode string for an entry
#[cfg(not(unix))]
pub fn mode_string(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    let write = if metadata.permissions().readonly() { '-' } else { 'w' };
    format!("{kind}r{write}-r{write}-r{write}-")
}
