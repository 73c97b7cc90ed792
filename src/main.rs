//! rms: safe deletion with undo
//!
//! Moves files into a trash can instead of removing them, and restores the
//! most recent deletion on request.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rms::cli::{CliArgs, Commands};
use rms::config::Config;
use rms::error::RmsError;
use rms::init::run_init;
use rms::prompt::{AssumeYes, Confirm, LinePrompt};
use rms::trash::{Listing, RestoreMode, RestoreOutcome, RestoreTarget, Trash};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rms: {:#}", e);
            let code = e.downcast_ref::<RmsError>().map_or(1, RmsError::exit_code);
            code.into()
        }
    }
}

/// Main execution logic
fn run() -> Result<()> {
    let args = CliArgs::parse_args();

    if args.command == Commands::Init {
        return run_init();
    }

    let config = Config::load();
    let paths = config.trash_paths();
    paths.ensure().with_context(|| {
        format!(
            "cannot prepare trash can at {} (ledger {})",
            paths.holding_dir.display(),
            paths.ledger_path.display()
        )
    })?;

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let trash = Trash::new(paths, cwd);

    match args.command {
        Commands::Delete { paths } => delete(&trash, &paths),
        Commands::Undelete {
            name,
            original,
            yes,
        } => {
            let mode = if original || config.restore_to_original {
                RestoreMode::Original
            } else {
                RestoreMode::CurrentDir
            };
            let target = name.map_or(RestoreTarget::Latest, RestoreTarget::Named);
            undelete(&trash, &target, mode, yes)
        }
        Commands::List => list(&trash),
        Commands::Clear { yes } => clear(&trash, yes),
        Commands::Init => Ok(()),
    }
}

/// Per-target failures are printed and do not change the exit code
fn delete(trash: &Trash, targets: &[PathBuf]) -> Result<()> {
    let report = trash.delete_all(targets);
    for outcome in &report.outcomes {
        if let Err(e) = &outcome.result {
            eprintln!("rms: {}: {}", outcome.target.display(), e);
        }
    }
    tracing::debug!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "delete finished"
    );
    Ok(())
}

fn undelete(trash: &Trash, target: &RestoreTarget, mode: RestoreMode, yes: bool) -> Result<()> {
    let mut confirm: Box<dyn Confirm> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(LinePrompt::stdio())
    };

    match trash.restore(target, mode, confirm.as_mut()) {
        Ok(RestoreOutcome::Restored { destination, .. }) => {
            println!("restored: {}", destination.display());
            Ok(())
        }
        Ok(RestoreOutcome::Declined { destination }) => {
            println!("kept in trash: {}", destination.display());
            Ok(())
        }
        Err(RmsError::EmptyLedger) => {
            println!("Trash can may be EMPTY.");
            Ok(())
        }
        Err(e @ (RmsError::CorruptLedger { .. } | RmsError::IoError(_))) => Err(e.into()),
        Err(e) => {
            eprintln!("rms: {}", e);
            Ok(())
        }
    }
}

fn list(trash: &Trash) -> Result<()> {
    let listing = trash.list()?;
    println!("List trash can");
    print!("{}", listing);
    if let Listing::Records(records) = &listing {
        tracing::debug!(count = records.len(), "listed trash can");
    }
    Ok(())
}

fn clear(trash: &Trash, yes: bool) -> Result<()> {
    if !yes && !LinePrompt::stdio().confirm("This operation can't be undone. Clear trash") {
        return Ok(());
    }

    let report = trash.empty();
    if let Err(e) = &report.holding {
        eprintln!("rms: cannot empty holding directory: {}", e);
    }
    if let Err(e) = &report.ledger {
        eprintln!("rms: cannot clear ledger: {}", e);
    }
    if let Ok(removed) = report.holding {
        if report.ledger.is_ok() {
            println!("cleared {} item(s)", removed);
        }
    }
    Ok(())
}
