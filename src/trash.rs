//! Delete, restore, list and empty operations
//!
//! Sequences the [`Ledger`] and the [`Mover`]. A record is appended before an
//! entry moves into the holding directory and is removed only after the entry
//! has moved back out, so a failed or declined restore never loses a record.

use crate::config::TrashPaths;
use crate::error::{Result, RmsError};
use crate::ledger::Ledger;
use crate::mover::Mover;
use crate::prompt::Confirm;
use crate::record::{checked_str, DeletionRecord};
use path_clean::PathClean;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Which record an undelete acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreTarget {
    /// The most recently deleted item
    Latest,
    /// The most recent record whose base name or original path matches
    Named(String),
}

/// Where a restored item lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreMode {
    /// `<cwd>/<original base name>`
    #[default]
    CurrentDir,
    /// The recorded original path
    Original,
}

/// Terminal state of one restore
#[derive(Debug)]
pub enum RestoreOutcome {
    Restored {
        record: DeletionRecord,
        destination: PathBuf,
    },
    /// Overwrite was declined; ledger and holding directory are unchanged
    Declined { destination: PathBuf },
}

/// Result of one `delete_all` target
#[derive(Debug)]
pub struct DeleteOutcome {
    pub target: PathBuf,
    pub result: Result<DeletionRecord>,
}

/// Per-target results of a batch delete
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DeleteOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Results of emptying the trash, each half reported on its own
#[derive(Debug)]
pub struct EmptyReport {
    pub holding: Result<usize>,
    pub ledger: Result<()>,
}

impl EmptyReport {
    pub fn is_ok(&self) -> bool {
        self.holding.is_ok() && self.ledger.is_ok()
    }
}

/// Listing of the ledger
#[derive(Debug)]
pub enum Listing {
    Empty,
    Records(Vec<DeletionRecord>),
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => writeln!(f, "[ Trash can is EMPTY. ]"),
            Self::Records(records) => {
                let size_width = records
                    .iter()
                    .map(|r| r.size.to_string().len())
                    .max()
                    .unwrap_or(0)
                    .max(4);
                writeln!(
                    f,
                    "{:<10}  {:>size_width$}  {:<19}  Path",
                    "Perm", "Size", "Deletion-Date"
                )?;
                for record in records {
                    writeln!(
                        f,
                        "{:<10}  {:>size_width$}  {:<19}  {}",
                        record.permissions,
                        record.size,
                        record.deleted_at_display(),
                        record.original_path.display()
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// A trash can session rooted at one working directory
#[derive(Debug, Clone)]
pub struct Trash {
    paths: TrashPaths,
    ledger: Ledger,
    mover: Mover,
    cwd: PathBuf,
}

impl Trash {
    pub fn new(paths: TrashPaths, cwd: impl Into<PathBuf>) -> Self {
        Self {
            ledger: Ledger::new(&paths.ledger_path),
            mover: Mover::new(&paths.holding_dir),
            paths,
            cwd: cwd.into(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn mover(&self) -> &Mover {
        &self.mover
    }

    /// Absolute, lexically cleaned form of `target` relative to the session cwd
    pub fn resolve(&self, target: &Path) -> PathBuf {
        if target.is_absolute() {
            target.to_path_buf().clean()
        } else {
            self.cwd.join(target).clean()
        }
    }

    /// Move one target into the trash
    pub fn delete(&self, target: &Path) -> Result<DeletionRecord> {
        let source = self.resolve(target);
        checked_str(&source)?;
        if self.paths.is_protected(&source) {
            return Err(RmsError::ProtectedPath(source));
        }
        let base_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RmsError::InvalidPath(target.to_path_buf()))?;

        let existing = self.ledger.records()?.len();
        let holding_name = self.mover.reserve_name(base_name, existing + 1);
        let record = self.ledger.add(&source, &holding_name)?;

        if let Err(e) = self.mover.move_to_holding(&source, &holding_name) {
            // Roll back so the ledger never points at an entry that did not move
            if let Err(rollback) = self.ledger.pop_last() {
                tracing::warn!(error = %rollback, "cannot roll back ledger record");
            }
            return Err(e);
        }

        Ok(record)
    }

    /// Delete every target in order; a failure never stops the batch
    pub fn delete_all<P: AsRef<Path>>(&self, targets: &[P]) -> BatchReport {
        let outcomes = targets
            .iter()
            .map(|target| DeleteOutcome {
                target: target.as_ref().to_path_buf(),
                result: self.delete(target.as_ref()),
            })
            .collect();
        BatchReport { outcomes }
    }

    /// Move a deleted item back out of the trash.
    ///
    /// The ledger record is removed only once the move has succeeded.
    pub fn restore(
        &self,
        target: &RestoreTarget,
        mode: RestoreMode,
        confirm: &mut dyn Confirm,
    ) -> Result<RestoreOutcome> {
        let records = self.ledger.records()?;
        let (index, record) = self.select(&records, target)?;

        let holding_path = self.mover.holding_path(&record.holding_name);
        if fs::symlink_metadata(&holding_path).is_err() {
            // Drop the dead record so the next undelete reaches the older ones
            self.remove_record(index, records.len())?;
            return Err(RmsError::MissingFromHolding {
                holding_path,
                original_path: record.original_path.clone(),
            });
        }

        let destination = match mode {
            RestoreMode::CurrentDir => self.cwd.join(record.original_name()),
            RestoreMode::Original => record.original_path.clone(),
        };

        if fs::symlink_metadata(&destination).is_ok() {
            let question = format!(
                "{} is existing, are you going to OVERRIDE it",
                destination.display()
            );
            if !confirm.confirm(&question) {
                return Ok(RestoreOutcome::Declined { destination });
            }
        }

        self.mover
            .move_from_holding(&record.holding_name, &destination)?;

        let removed = self.remove_record(index, records.len())?;

        Ok(RestoreOutcome::Restored {
            record: removed.unwrap_or_else(|| record.clone()),
            destination,
        })
    }

    /// Remove the record at `index`, popping when it is the newest
    fn remove_record(&self, index: usize, count: usize) -> Result<Option<DeletionRecord>> {
        if index + 1 == count {
            self.ledger.pop_last()
        } else {
            self.ledger.take(index).map(Some)
        }
    }

    fn select<'r>(
        &self,
        records: &'r [DeletionRecord],
        target: &RestoreTarget,
    ) -> Result<(usize, &'r DeletionRecord)> {
        match target {
            RestoreTarget::Latest => records
                .iter()
                .enumerate()
                .last()
                .ok_or(RmsError::EmptyLedger),
            RestoreTarget::Named(name) => {
                if records.is_empty() {
                    return Err(RmsError::EmptyLedger);
                }
                let as_path = self.resolve(Path::new(name));
                records
                    .iter()
                    .enumerate()
                    .rev()
                    .find(|(_, r)| r.original_path == as_path || r.original_name() == name.as_str())
                    .ok_or_else(|| RmsError::NotInTrash(name.clone()))
            }
        }
    }

    /// Current records for display
    pub fn list(&self) -> Result<Listing> {
        let (count, _) = self.ledger.enumerate()?;
        if count == 0 {
            return Ok(Listing::Empty);
        }
        let records = self.ledger.records()?;
        if records.is_empty() {
            return Ok(Listing::Empty);
        }
        Ok(Listing::Records(records))
    }

    /// Remove the holding directory contents and clear the ledger.
    ///
    /// Both halves always run.
    pub fn empty(&self) -> EmptyReport {
        let holding = self.mover.clear_holding();
        let ledger = self.ledger.clear();
        EmptyReport { holding, ledger }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::AssumeYes;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        work: PathBuf,
        trash: Trash,
    }

    fn setup() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        let paths = TrashPaths::new(root.join(".Trash"), root.join(".trash").join("deleted"));
        paths.ensure().unwrap();
        let work = root.join("work");
        fs::create_dir(&work).unwrap();
        let trash = Trash::new(paths, &work);
        Fixture {
            _tmp: tmp,
            work,
            trash,
        }
    }

    fn holding_entries(trash: &Trash) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(trash.mover().holding_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn restore_latest(trash: &Trash) -> Result<RestoreOutcome> {
        trash.restore(&RestoreTarget::Latest, RestoreMode::CurrentDir, &mut AssumeYes)
    }

    #[test]
    fn test_delete_then_restore_scenario() {
        let fx = setup();
        fs::write(fx.work.join("notes.txt"), vec![b'n'; 42]).unwrap();

        let record = fx.trash.delete(Path::new("notes.txt")).unwrap();
        assert_eq!(record.size, 42);
        assert_eq!(record.original_path, fx.work.join("notes.txt"));
        assert!(!fx.work.join("notes.txt").exists());
        assert_eq!(holding_entries(&fx.trash), vec!["1_notes.txt".to_string()]);

        let (_, raw) = fx.trash.ledger().enumerate().unwrap();
        assert_eq!(raw.lines().count(), 1);
        assert!(raw.trim_end().ends_with(fx.work.join("notes.txt").to_str().unwrap()));

        match restore_latest(&fx.trash).unwrap() {
            RestoreOutcome::Restored { destination, .. } => {
                assert_eq!(destination, fx.work.join("notes.txt"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(fs::read(fx.work.join("notes.txt")).unwrap().len(), 42);
        assert_eq!(fx.trash.ledger().enumerate().unwrap().0, 0);
        assert!(holding_entries(&fx.trash).is_empty());
    }

    #[test]
    fn test_n_deletes_then_n_restores_empty_everything() {
        let fx = setup();
        let names = ["a.txt", "b.txt", "c.txt", "d.txt"];
        for name in names {
            fs::write(fx.work.join(name), name).unwrap();
        }
        let report = fx.trash.delete_all(&names);
        assert_eq!(report.succeeded(), 4);

        for _ in names {
            restore_latest(&fx.trash).unwrap();
        }
        assert!(holding_entries(&fx.trash).is_empty());
        assert_eq!(fx.trash.ledger().enumerate().unwrap().0, 0);
        for name in names {
            assert_eq!(fs::read_to_string(fx.work.join(name)).unwrap(), name);
        }
        assert!(matches!(restore_latest(&fx.trash), Err(RmsError::EmptyLedger)));
    }

    #[test]
    fn test_restore_is_lifo() {
        let fx = setup();
        fs::write(fx.work.join("a"), "a").unwrap();
        fs::write(fx.work.join("b"), "b").unwrap();
        fx.trash.delete(Path::new("a")).unwrap();
        fx.trash.delete(Path::new("b")).unwrap();

        let first = restore_latest(&fx.trash).unwrap();
        assert!(matches!(
            first,
            RestoreOutcome::Restored { ref record, .. } if record.original_name() == "b"
        ));
        assert!(fx.work.join("b").exists());
        assert!(!fx.work.join("a").exists());
    }

    #[test]
    fn test_same_name_from_two_directories_does_not_collide() {
        let fx = setup();
        for dir in ["one", "two"] {
            fs::create_dir(fx.work.join(dir)).unwrap();
            fs::write(fx.work.join(dir).join("config.toml"), dir).unwrap();
        }

        fx.trash.delete(Path::new("one/config.toml")).unwrap();
        fx.trash.delete(Path::new("two/config.toml")).unwrap();
        assert_eq!(
            holding_entries(&fx.trash),
            vec!["1_config.toml".to_string(), "2_config.toml".to_string()]
        );

        fx.trash
            .restore(&RestoreTarget::Latest, RestoreMode::Original, &mut AssumeYes)
            .unwrap();
        fx.trash
            .restore(&RestoreTarget::Latest, RestoreMode::Original, &mut AssumeYes)
            .unwrap();
        assert_eq!(
            fs::read_to_string(fx.work.join("one").join("config.toml")).unwrap(),
            "one"
        );
        assert_eq!(
            fs::read_to_string(fx.work.join("two").join("config.toml")).unwrap(),
            "two"
        );
    }

    #[test]
    fn test_declined_overwrite_keeps_record_and_entry() {
        let fx = setup();
        fs::write(fx.work.join("notes.txt"), "old").unwrap();
        fx.trash.delete(Path::new("notes.txt")).unwrap();
        fs::write(fx.work.join("notes.txt"), "new").unwrap();

        let mut asked = Vec::new();
        let mut decline = |q: &str| {
            asked.push(q.to_string());
            false
        };
        let outcome = fx
            .trash
            .restore(&RestoreTarget::Latest, RestoreMode::CurrentDir, &mut decline)
            .unwrap();

        assert!(matches!(outcome, RestoreOutcome::Declined { .. }));
        assert_eq!(asked.len(), 1);
        assert!(asked[0].contains("OVERRIDE"));
        assert_eq!(fs::read_to_string(fx.work.join("notes.txt")).unwrap(), "new");
        assert_eq!(fx.trash.ledger().records().unwrap().len(), 1);
        assert_eq!(holding_entries(&fx.trash), vec!["1_notes.txt".to_string()]);
    }

    #[test]
    fn test_accepted_overwrite_replaces_destination() {
        let fx = setup();
        fs::write(fx.work.join("notes.txt"), "old").unwrap();
        fx.trash.delete(Path::new("notes.txt")).unwrap();
        fs::write(fx.work.join("notes.txt"), "new").unwrap();

        restore_latest(&fx.trash).unwrap();
        assert_eq!(fs::read_to_string(fx.work.join("notes.txt")).unwrap(), "old");
        assert!(fx.trash.ledger().records().unwrap().is_empty());
    }

    #[test]
    fn test_failed_restore_keeps_record() {
        let fx = setup();
        fs::create_dir(fx.work.join("sub")).unwrap();
        fs::write(fx.work.join("sub").join("notes.txt"), "x").unwrap();
        fx.trash.delete(Path::new("sub/notes.txt")).unwrap();
        fs::remove_dir(fx.work.join("sub")).unwrap();

        // Original parent is gone, so the rename back fails on the destination side
        let err = fx
            .trash
            .restore(&RestoreTarget::Latest, RestoreMode::Original, &mut AssumeYes)
            .unwrap_err();
        match err {
            RmsError::PathError { path, .. } => {
                assert_eq!(path, fx.work.join("sub").join("notes.txt"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(fx.trash.ledger().records().unwrap().len(), 1);
        assert_eq!(holding_entries(&fx.trash), vec!["1_notes.txt".to_string()]);
    }

    #[test]
    fn test_missing_holding_entry_drops_record() {
        let fx = setup();
        fs::write(fx.work.join("a.txt"), "a").unwrap();
        fs::write(fx.work.join("b.txt"), "b").unwrap();
        fx.trash.delete_all(&["a.txt", "b.txt"]);
        fs::remove_file(fx.trash.mover().holding_path("2_b.txt")).unwrap();

        let mut asked = 0;
        let mut count = |_: &str| {
            asked += 1;
            true
        };
        let err = fx
            .trash
            .restore(&RestoreTarget::Latest, RestoreMode::CurrentDir, &mut count)
            .unwrap_err();
        match err {
            RmsError::MissingFromHolding {
                holding_path,
                original_path,
            } => {
                assert_eq!(holding_path, fx.trash.mover().holding_path("2_b.txt"));
                assert_eq!(original_path, fx.work.join("b.txt"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(asked, 0);
        assert_eq!(fx.trash.ledger().records().unwrap().len(), 1);

        // The older record is reachable again
        restore_latest(&fx.trash).unwrap();
        assert_eq!(fs::read_to_string(fx.work.join("a.txt")).unwrap(), "a");
        assert!(fx.trash.ledger().records().unwrap().is_empty());
    }

    #[test]
    fn test_failed_move_rolls_back_record() {
        let fx = setup();
        fs::write(fx.work.join("notes.txt"), "x").unwrap();
        // Holding directory gone: stat succeeds, rename fails
        fs::remove_dir(fx.trash.mover().holding_dir()).unwrap();

        assert!(fx.trash.delete(Path::new("notes.txt")).is_err());
        assert!(fx.work.join("notes.txt").exists());
        assert_eq!(fx.trash.ledger().enumerate().unwrap().0, 0);
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let fx = setup();
        fs::write(fx.work.join("a.txt"), "a").unwrap();
        fs::write(fx.work.join("c.txt"), "c").unwrap();

        let report = fx.trash.delete_all(&["a.txt", "missing.txt", "c.txt"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.outcomes[1].result,
            Err(RmsError::PathError { .. })
        ));
        assert_eq!(report.outcomes[1].target, PathBuf::from("missing.txt"));
        assert_eq!(fx.trash.ledger().records().unwrap().len(), 2);
    }

    #[test]
    fn test_protected_and_invalid_targets() {
        let fx = setup();
        let holding = fx.trash.mover().holding_dir().to_path_buf();
        assert!(matches!(
            fx.trash.delete(&holding),
            Err(RmsError::ProtectedPath(_))
        ));
        assert!(matches!(
            fx.trash.delete(fx.trash.ledger().path()),
            Err(RmsError::ProtectedPath(_))
        ));
        assert!(matches!(
            fx.trash.delete(Path::new("/")),
            Err(RmsError::ProtectedPath(_))
        ));
    }

    #[test]
    fn test_paths_with_spaces() {
        let fx = setup();
        fs::write(fx.work.join("my notes.txt"), "x").unwrap();
        fx.trash.delete(Path::new("my notes.txt")).unwrap();

        let records = fx.trash.ledger().records().unwrap();
        assert_eq!(records[0].original_path, fx.work.join("my notes.txt"));
        restore_latest(&fx.trash).unwrap();
        assert!(fx.work.join("my notes.txt").exists());
    }

    #[test]
    fn test_named_restore() {
        let fx = setup();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(fx.work.join(name), name).unwrap();
        }
        fx.trash.delete_all(&["a.txt", "b.txt", "c.txt"]);

        fx.trash
            .restore(
                &RestoreTarget::Named("b.txt".into()),
                RestoreMode::CurrentDir,
                &mut AssumeYes,
            )
            .unwrap();
        assert!(fx.work.join("b.txt").exists());

        let remaining: Vec<_> = fx
            .trash
            .ledger()
            .records()
            .unwrap()
            .iter()
            .map(|r| r.original_name().to_string())
            .collect();
        assert_eq!(remaining, vec!["a.txt".to_string(), "c.txt".to_string()]);

        assert!(matches!(
            fx.trash.restore(
                &RestoreTarget::Named("zzz".into()),
                RestoreMode::CurrentDir,
                &mut AssumeYes
            ),
            Err(RmsError::NotInTrash(_))
        ));
    }

    #[test]
    fn test_list_in_deletion_order_and_clear_keeps_holding() {
        let fx = setup();
        fs::write(fx.work.join("a.txt"), "a").unwrap();
        fs::write(fx.work.join("b.txt"), "b").unwrap();
        fx.trash.delete_all(&["a.txt", "b.txt"]);

        match fx.trash.list().unwrap() {
            Listing::Records(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].original_name(), "a.txt");
                assert_eq!(records[1].original_name(), "b.txt");
            }
            Listing::Empty => panic!("expected records"),
        }

        fx.trash.ledger().clear().unwrap();
        assert!(matches!(fx.trash.list().unwrap(), Listing::Empty));
        assert_eq!(holding_entries(&fx.trash).len(), 2);

        let report = fx.trash.empty();
        assert!(report.is_ok());
        assert!(holding_entries(&fx.trash).is_empty());
    }

    #[test]
    fn test_empty_reports_each_half() {
        let fx = setup();
        fs::write(fx.work.join("a.txt"), "a").unwrap();
        fx.trash.delete(Path::new("a.txt")).unwrap();
        fs::remove_file(fx.trash.ledger().path()).unwrap();

        let report = fx.trash.empty();
        assert_eq!(*report.holding.as_ref().unwrap(), 1);
        assert!(report.ledger.is_err());
        assert!(!report.is_ok());
    }

    #[test]
    fn test_listing_display() {
        let fx = setup();
        assert_eq!(Listing::Empty.to_string(), "[ Trash can is EMPTY. ]\n");

        fs::write(fx.work.join("a.txt"), "abc").unwrap();
        fx.trash.delete(Path::new("a.txt")).unwrap();
        let shown = fx.trash.list().unwrap().to_string();
        let lines: Vec<_> = shown.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Perm"));
        assert!(lines[1].ends_with(fx.work.join("a.txt").to_str().unwrap()));
    }
}
