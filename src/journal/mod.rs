//! Journal entries on disk.
//!
//! This module contains the `EntryStore`, which maps dates to entry paths,
//! creates new entries from the configured file template, and discovers the
//! dated Markdown files under the journal's base directory. Discovery results
//! are returned as an `EntryCollection` that can be ordered by date.
//!
//! The store never caches anything: the base directory is edited concurrently
//! by the user's editor, so every listing is a fresh scan.


use crate::config::{Config, SortOrder};
use crate::constants::ENTRY_FILE_EXTENSION;
use crate::dates::{self, DateLayout};
use crate::errors::{AppResult, TemplateError};
use crate::template::{Template, TemplateVars};
use chrono::NaiveDate;
use std::fs::{self, DirBuilder};
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A single dated journal file.
///
/// Entries are created by a directory scan and never modified afterwards;
/// loading content produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    path: PathBuf,
    date: NaiveDate,
    raw_content: Option<String>,
    rendered_html: Option<String>,
}

impl JournalEntry {
    /// Creates an entry without content.
    pub fn new(path: impl Into<PathBuf>, date: NaiveDate) -> Self {
        JournalEntry {
            path: path.into(),
            date,
            raw_content: None,
            rendered_html: None,
        }
    }

    /// Returns this entry with its raw Markdown attached.
    pub fn with_raw_content(self, raw_content: String) -> Self {
        JournalEntry {
            raw_content: Some(raw_content),
            ..self
        }
    }

    /// Returns this entry with its rendered HTML attached.
    pub fn with_rendered_html(self, rendered_html: String) -> Self {
        JournalEntry {
            rendered_html: Some(rendered_html),
            ..self
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn raw_content(&self) -> Option<&str> {
        self.raw_content.as_deref()
    }

    pub fn rendered_html(&self) -> Option<&str> {
        self.rendered_html.as_deref()
    }
}

/// An ordered sequence of journal entries.
///
/// Sorting is stable: entries sharing a date keep their scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryCollection {
    entries: Vec<JournalEntry>,
}

impl EntryCollection {
    pub fn new(entries: Vec<JournalEntry>) -> Self {
        EntryCollection { entries }
    }

    /// Orders entries from newest to oldest.
    pub fn sort_by_date_desc(&mut self) {
        self.entries.sort_by(|a, b| b.date.cmp(&a.date));
    }

    /// Orders entries from oldest to newest.
    pub fn sort_by_date_asc(&mut self) {
        self.entries.sort_by_key(|entry| entry.date);
    }

    /// Orders entries according to `order`.
    pub fn sort(&mut self, order: SortOrder) {
        match order {
            SortOrder::Asc => self.sort_by_date_asc(),
            SortOrder::Desc => self.sort_by_date_desc(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JournalEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[JournalEntry] {
        &self.entries
    }
}

impl IntoIterator for EntryCollection {
    type Item = JournalEntry;
    type IntoIter = std::vec::IntoIter<JournalEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntryCollection {
    type Item = &'a JournalEntry;
    type IntoIter = std::slice::Iter<'a, JournalEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<JournalEntry> for EntryCollection {
    fn from_iter<I: IntoIterator<Item = JournalEntry>>(iter: I) -> Self {
        EntryCollection::new(iter.into_iter().collect())
    }
}

/// Discovers and creates journal entries under a base directory.
///
/// # Examples
///
/// ```
/// use daybook::journal::EntryStore;
/// use chrono::NaiveDate;
/// use std::path::Path;
///
/// let store = EntryStore::new("/tmp/j", "2006/01/02.md", "2006-01-02", "# {{ .Date }}").unwrap();
/// let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(store.entry_path(date), Path::new("/tmp/j/2024/03/05.md"));
/// ```
#[derive(Debug, Clone)]
pub struct EntryStore {
    base_dir: PathBuf,
    path_layout: DateLayout,
    date_layout: DateLayout,
    file_template: Template,
}

impl EntryStore {
    /// Creates a store rooted at `base_dir`.
    ///
    /// # Arguments
    ///
    /// * `base_dir` - The journal root; entry paths are resolved against it
    /// * `path_format` - Layout of entry paths relative to `base_dir`
    /// * `date_format` - Layout of the `Date` template variable
    /// * `file_template` - Template for the content of new entries
    ///
    /// # Errors
    ///
    /// Returns a `TemplateError` if `file_template` does not parse.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        path_format: &str,
        date_format: &str,
        file_template: &str,
    ) -> Result<Self, TemplateError> {
        Ok(EntryStore {
            base_dir: base_dir.into(),
            path_layout: DateLayout::new(path_format),
            date_layout: DateLayout::new(date_format),
            file_template: Template::parse(file_template)?,
        })
    }

    /// Creates a store from the `[common]` and `[new]` configuration sections.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(EntryStore::new(
            &config.common.base_directory,
            &config.common.path_format,
            &config.common.date_format,
            &config.new.file_template,
        )?)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the path of the entry for `date`. Performs no I/O.
    pub fn entry_path(&self, date: NaiveDate) -> PathBuf {
        self.base_dir.join(self.path_layout.format(date))
    }

    /// The layout used for display dates.
    pub fn date_layout(&self) -> &DateLayout {
        &self.date_layout
    }

    /// Formats `date` with the configured display layout.
    pub fn display_date(&self, date: NaiveDate) -> String {
        self.date_layout.format(date)
    }

    /// Builds the template variables describing the entry for `date`.
    ///
    /// The process environment is captured for `.Env`; `Pattern` is left empty.
    pub fn template_vars(&self, date: NaiveDate) -> TemplateVars {
        TemplateVars::new(self.display_date(date))
            .with_base_dir(self.base_dir.display().to_string())
            .with_file(self.entry_path(date).display().to_string())
            .with_process_env()
    }

    /// Creates the entry for `date` unless it already exists.
    ///
    /// The expanded file template is written to a temporary file next to the
    /// target and then moved into place without replacing anything. A file
    /// that shows up concurrently wins and is returned untouched.
    ///
    /// # Returns
    ///
    /// The entry path, whether it was created by this call or already existed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if directories or the file cannot be written.
    pub fn create_entry(&self, date: NaiveDate) -> AppResult<PathBuf> {
        let path = self.entry_path(date);
        if path.exists() {
            debug!(path = %path.display(), "entry already exists");
            return Ok(path);
        }

        let parent = path.parent().unwrap_or(&self.base_dir);
        create_entry_dirs(parent)?;

        let mut content = self.file_template.render(&self.template_vars(date));
        content.push('\n');

        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&path) {
            Ok(_) => {
                info!(path = %path.display(), "created entry");
                Ok(path)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "entry appeared concurrently, keeping it");
                Ok(path)
            }
            Err(e) => Err(e.error.into()),
        }
    }

    /// Scans the base directory for dated Markdown entries.
    ///
    /// Files without the Markdown extension, or whose name holds no valid
    /// `yyyy-mm-dd` date, are skipped. Files that disappear during the scan
    /// are skipped as well. Entries are returned in scan order (file names
    /// sorted per directory) and carry no content.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the base directory cannot be read or a
    /// subdirectory walk fails.
    pub fn list_entries(&self) -> AppResult<EntryCollection> {
        let mut entries = Vec::new();

        for item in WalkDir::new(&self.base_dir).sort_by_file_name() {
            let item = match item {
                Ok(item) => item,
                Err(e) if e.depth() > 0 && is_not_found(&e) => {
                    debug!(error = %e, "path vanished during scan");
                    continue;
                }
                Err(e) => return Err(io::Error::from(e).into()),
            };

            if item.file_type().is_dir() || !has_entry_extension(item.path()) {
                continue;
            }

            let file_name = item.file_name().to_string_lossy();
            match dates::date_from_filename(&file_name) {
                Ok(date) => entries.push(JournalEntry::new(item.path(), date)),
                Err(e) => debug!(path = %item.path().display(), error = %e, "skipping undated file"),
            }
        }

        debug!(count = entries.len(), base_dir = %self.base_dir.display(), "listed entries");
        Ok(EntryCollection::new(entries))
    }
}

/// Reads the raw Markdown of an entry.
pub fn read_entry(entry: &JournalEntry) -> io::Result<String> {
    fs::read_to_string(entry.path()).inspect_err(|e| {
        warn!(path = %entry.path().display(), error = %e, "failed to read entry");
    })
}

fn has_entry_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == ENTRY_FILE_EXTENSION)
}

fn is_not_found(error: &walkdir::Error) -> bool {
    error
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

/// Creates `dir` and its missing parents, owner-only on Unix.
fn create_entry_dirs(dir: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(crate::constants::DEFAULT_DIR_PERMISSIONS);
    builder.create(dir)
}
