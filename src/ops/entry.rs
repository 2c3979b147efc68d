//! Entry commands: creating, locating, listing, opening and searching entries.

use crate::config::{Config, SortOrder};
use crate::errors::{AppError, AppResult};
use crate::journal::{EntryCollection, EntryStore};
use crate::shell::CommandRunner;
use crate::template::Template;
use chrono::NaiveDate;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

/// What `path` should print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTarget {
    /// The entry file for a date.
    Entry(NaiveDate),
    /// The base directory.
    Base,
}

/// Creates the entry for `date` if it does not exist yet.
///
/// # Returns
///
/// The entry path; calling this again for the same date returns the same
/// path and leaves the file untouched.
///
/// # Errors
///
/// Returns `AppError::Io` if directories or the file cannot be created.
pub fn new_entry(store: &EntryStore, date: NaiveDate) -> AppResult<PathBuf> {
    store.create_entry(date)
}

/// Resolves the path to print for `path`.
///
/// # Arguments
///
/// * `store` - The entry store
/// * `target` - Entry path for a date, or the base directory
/// * `check` - Fail unless the path exists
///
/// # Errors
///
/// Returns `AppError::Io` with `NotFound` if `check` is set and the path does
/// not exist.
pub fn entry_path(store: &EntryStore, target: PathTarget, check: bool) -> AppResult<PathBuf> {
    let path = match target {
        PathTarget::Entry(date) => store.entry_path(date),
        PathTarget::Base => store.base_dir().to_path_buf(),
    };

    if check && !path.exists() {
        return Err(AppError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Not found: {}", path.display()),
        )));
    }
    Ok(path)
}

/// Lists every dated entry in `sort` order.
///
/// # Errors
///
/// Returns `AppError::Io` if the base directory cannot be scanned.
pub fn list_entries(store: &EntryStore, sort: SortOrder) -> AppResult<EntryCollection> {
    let mut entries = store.list_entries()?;
    entries.sort(sort);
    Ok(entries)
}

/// Creates the entry for `date` if needed and runs the `[open]` command on it.
///
/// # Arguments
///
/// * `config` - Application configuration
/// * `runner` - Runs the expanded command line
/// * `date` - Date of the entry to open
///
/// # Errors
///
/// Returns an error if:
/// - The entry cannot be created
/// - The open command does not parse
/// - The command cannot be started or exits unsuccessfully
pub fn open_entry(config: &Config, runner: &dyn CommandRunner, date: NaiveDate) -> AppResult<PathBuf> {
    let store = EntryStore::from_config(config)?;
    let path = store.create_entry(date)?;

    let command = Template::parse(&config.open.command)?.render(&store.template_vars(date));
    debug!(command = %command, "running open command");
    runner.run(&command)?;

    info!(path = %path.display(), "opened entry");
    Ok(path)
}

/// Runs the `[search]` command for `pattern`.
///
/// The pattern is substituted as-is; the command template decides how it is
/// quoted.
///
/// # Errors
///
/// Returns `AppError::Template` if the search command does not parse and
/// `AppError::Command` if it cannot be run or exits unsuccessfully.
pub fn search_entries(config: &Config, runner: &dyn CommandRunner, pattern: &str) -> AppResult<()> {
    let store = EntryStore::from_config(config)?;
    let today = crate::dates::today();
    let vars = store.template_vars(today).with_pattern(pattern);
    let command = Template::parse(&config.search.command)?.render(&vars);
    debug!(command = %command, "running search command");
    runner.run(&command)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CommandError;
    use crate::shell::tests::RecordingRunner;
    use chrono::Datelike;
    use std::fs;
    use tempfile::tempdir;

    fn config_for(base: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.common.base_directory = base.to_path_buf();
        config
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_entry_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = EntryStore::from_config(&config_for(dir.path())).unwrap();

        let first = new_entry(&store, day(2024, 3, 5)).unwrap();
        assert_eq!(first, dir.path().join("2024-03-05.md"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "# 2024-03-05\n");

        fs::write(&first, "edited").unwrap();
        let second = new_entry(&store, day(2024, 3, 5)).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).unwrap(), "edited");
    }

    #[test]
    fn test_entry_path_with_and_without_check() {
        let dir = tempdir().unwrap();
        let store = EntryStore::from_config(&config_for(dir.path())).unwrap();
        let date = day(2024, 1, 1);

        let path = entry_path(&store, PathTarget::Entry(date), false).unwrap();
        assert_eq!(path, dir.path().join("2024-01-01.md"));
        assert!(!path.exists());

        let err = entry_path(&store, PathTarget::Entry(date), true).unwrap_err();
        assert!(matches!(err, AppError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));

        let base = entry_path(&store, PathTarget::Base, true).unwrap();
        assert_eq!(base, dir.path());
    }

    #[test]
    fn test_list_entries_sorted() {
        let dir = tempdir().unwrap();
        for name in ["2024-01-02.md", "2024-01-01.md", "2024-01-03.md", "readme.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let store = EntryStore::from_config(&config_for(dir.path())).unwrap();

        let dates: Vec<_> = list_entries(&store, SortOrder::Asc)
            .unwrap()
            .iter()
            .map(|e| e.date().day0())
            .collect();
        assert_eq!(dates, vec![0, 1, 2]);

        let dates: Vec<_> = list_entries(&store, SortOrder::Desc)
            .unwrap()
            .iter()
            .map(|e| e.date().day0())
            .collect();
        assert_eq!(dates, vec![2, 1, 0]);
    }

    #[test]
    fn test_open_entry_creates_and_runs_command() {
        let dir = tempdir().unwrap();
        let mut config = config_for(dir.path());
        config.open.command = "edit {{ .File }} --title {{ .Date }}".to_string();
        let runner = RecordingRunner::default();

        let path = open_entry(&config, &runner, day(2024, 6, 1)).unwrap();

        assert!(path.exists());
        assert_eq!(
            *runner.commands.lock().unwrap(),
            vec![format!("edit {} --title 2024-06-01", path.display())]
        );
    }

    #[test]
    fn test_open_entry_reports_command_failure() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path());
        let runner = RecordingRunner {
            exit_code: Some(3),
            ..RecordingRunner::default()
        };

        let err = open_entry(&config, &runner, day(2024, 6, 1)).unwrap_err();
        assert!(matches!(
            err,
            AppError::Command(CommandError::NonZeroExit { status_code: 3, .. })
        ));
        assert!(dir.path().join("2024-06-01.md").exists());
    }

    #[test]
    fn test_search_substitutes_pattern_verbatim() {
        let dir = tempdir().unwrap();
        let mut config = config_for(dir.path());
        config.search.command = "rg {{ .Pattern }} {{ .BaseDir }}".to_string();
        let runner = RecordingRunner::default();

        search_entries(&config, &runner, "two words").unwrap();

        assert_eq!(
            *runner.commands.lock().unwrap(),
            vec![format!("rg two words {}", dir.path().display())]
        );
    }
}
