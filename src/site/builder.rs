//! One-shot static rendering of the journal.

use super::SiteRenderer;
use crate::constants::INDEX_FILE_NAME;
use crate::errors::AppResult;
use std::fs::{self, DirBuilder};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the journal page to an output directory.
///
/// The output directory is created if needed. Existing files other than
/// `index.html` are left alone.
#[derive(Debug, Clone)]
pub struct StaticBuilder {
    site: SiteRenderer,
}

impl StaticBuilder {
    pub fn new(site: SiteRenderer) -> Self {
        StaticBuilder { site }
    }

    /// Renders all entries into `output_dir/index.html`.
    ///
    /// # Returns
    ///
    /// The path of the written index page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the base directory cannot be scanned or the
    /// output cannot be written.
    pub fn build(&self, output_dir: &Path) -> AppResult<PathBuf> {
        DirBuilder::new().recursive(true).create(output_dir)?;

        let entries = self.site.load_entries()?;
        let html = self.site.render_index(&entries, false);

        let index_path = output_dir.join(INDEX_FILE_NAME);
        fs::write(&index_path, html)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(
                &index_path,
                fs::Permissions::from_mode(crate::constants::PUBLIC_FILE_PERMISSIONS),
            )?;
        }

        info!(
            path = %index_path.display(),
            entries = entries.len(),
            "built site"
        );
        Ok(index_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortOrder;
    use crate::journal::EntryStore;
    use crate::render::MarkdownRenderer;
    use tempfile::tempdir;

    fn builder(base: &Path) -> StaticBuilder {
        let store = EntryStore::new(base, "2006-01-02.md", "2006-01-02", "x").unwrap();
        StaticBuilder::new(SiteRenderer::new(
            store,
            MarkdownRenderer::default(),
            "Journal",
            SortOrder::Desc,
            "",
        ))
    }

    #[test]
    fn test_build_creates_output_and_keeps_other_files() {
        let journal = tempdir().unwrap();
        fs::write(journal.path().join("2024-01-01.md"), "first entry").unwrap();
        fs::write(journal.path().join("2024-01-02.md"), "second entry").unwrap();

        let out = tempdir().unwrap();
        let output_dir = out.path().join("nested/public");
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join("keep.txt"), "mine").unwrap();

        let index = builder(journal.path()).build(&output_dir).unwrap();

        assert_eq!(index, output_dir.join("index.html"));
        let html = fs::read_to_string(&index).unwrap();
        let second = html.find("second entry").unwrap();
        let first = html.find("first entry").unwrap();
        assert!(second < first, "entries are newest first");
        assert!(!html.contains("EventSource"));
        assert_eq!(fs::read_to_string(output_dir.join("keep.txt")).unwrap(), "mine");
    }

    #[test]
    fn test_build_missing_base_dir_fails() {
        let journal = tempdir().unwrap();
        let out = tempdir().unwrap();
        let result = builder(&journal.path().join("absent")).build(out.path());
        assert!(result.is_err());
        assert!(!out.path().join("index.html").exists());
    }

    #[test]
    fn test_build_twice_overwrites_index() {
        let journal = tempdir().unwrap();
        let out = tempdir().unwrap();
        let builder = builder(journal.path());

        builder.build(out.path()).unwrap();
        fs::write(journal.path().join("2024-05-05.md"), "late addition").unwrap();
        builder.build(out.path()).unwrap();

        let html = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(html.contains("late addition"));
    }
}
