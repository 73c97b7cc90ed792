//! Configuration initialization for rms
//!
//! Generates a default config file at ~/.config/rms/config.toml

use crate::config::Config;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config template
const CONFIG_TEMPLATE: &str = r#"# rms configuration
# Location: ~/.config/rms/config.toml
#
# Supports tilde (~) expansion for the home directory.

# Where deleted files are moved to
holding_dir = "~/.Trash"

# Ledger recording every deletion (permissions, size, date, original path)
ledger_path = "~/.trash/deleted"

# Restore into the original directory instead of the current one
restore_to_original = false
"#;

/// Outcome of writing the config template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(PathBuf),
    AlreadyExists(PathBuf),
}

/// Write the config template to `config_path` unless a file is already there
pub fn write_config(config_path: &Path) -> anyhow::Result<InitOutcome> {
    if config_path.exists() {
        return Ok(InitOutcome::AlreadyExists(config_path.to_path_buf()));
    }

    if let Some(config_dir) = config_path.parent() {
        fs::create_dir_all(config_dir)
            .with_context(|| format!("cannot create directory {}", config_dir.display()))?;
    }
    fs::write(config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("cannot write config file {}", config_path.display()))?;

    Ok(InitOutcome::Created(config_path.to_path_buf()))
}

/// Run the init subcommand against the resolved config location
pub fn run_init() -> anyhow::Result<()> {
    let config_path = Config::config_path().context("cannot determine config directory")?;

    match write_config(&config_path)? {
        InitOutcome::Created(path) => println!("Created config file: {}", path.display()),
        InitOutcome::AlreadyExists(path) => {
            eprintln!("Config file already exists: {}", path.display());
            eprintln!("To regenerate, delete the file first and run `rms init` again.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_template_is_valid_toml() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.holding_dir.as_deref(), Some("~/.Trash"));
        assert_eq!(config.ledger_path.as_deref(), Some("~/.trash/deleted"));
        assert!(!config.restore_to_original);
    }

    #[test]
    fn test_config_template_matches_defaults() {
        let from_template: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(from_template.trash_paths(), Config::default().trash_paths());
    }

    #[test]
    fn test_template_written_file_loads() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let config_path: PathBuf = tmp_dir.path().join("rms").join("config.toml");
        fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        fs::write(&config_path, CONFIG_TEMPLATE).unwrap();

        let config = Config::load_from_path(Some(config_path));
        assert_eq!(config.holding_dir.as_deref(), Some("~/.Trash"));
    }

    #[test]
    fn test_write_config_creates_then_keeps_existing() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let config_path = tmp_dir.path().join("nested").join("rms").join("config.toml");

        let outcome = write_config(&config_path).unwrap();
        assert_eq!(outcome, InitOutcome::Created(config_path.clone()));
        assert_eq!(fs::read_to_string(&config_path).unwrap(), CONFIG_TEMPLATE);

        fs::write(&config_path, "restore_to_original = true\n").unwrap();
        let outcome = write_config(&config_path).unwrap();
        assert_eq!(outcome, InitOutcome::AlreadyExists(config_path.clone()));
        assert_eq!(
            fs::read_to_string(&config_path).unwrap(),
            "restore_to_original = true\n"
        );
    }

    #[test]
    fn test_write_config_reports_unwritable_location() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let blocker = tmp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_config(&blocker.join("config.toml")).unwrap_err();
        assert!(err.to_string().contains("blocker"));
    }
}
