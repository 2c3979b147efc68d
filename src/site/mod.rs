//! The journal site: loading entries and rendering the index page.
//!
//! `SiteRenderer` owns everything needed to turn the base directory into a
//! page. The preview server and the static builder both go through it, so
//! they always agree on ordering, section markers and entry HTML.

pub mod builder;

pub use builder::StaticBuilder;

use crate::config::{Config, SortOrder};
use crate::errors::AppResult;
use crate::journal::{read_entry, EntryCollection, EntryStore};
use crate::render::css::load_css;
use crate::render::page::{self, IndexData};
use crate::render::MarkdownRenderer;
use tracing::{debug, instrument};

/// Loads, renders and lays out journal entries.
#[derive(Debug, Clone)]
pub struct SiteRenderer {
    store: EntryStore,
    markdown: MarkdownRenderer,
    title: String,
    sort: SortOrder,
    css: String,
}

impl SiteRenderer {
    /// Creates a renderer from already resolved parts.
    pub fn new(
        store: EntryStore,
        markdown: MarkdownRenderer,
        title: impl Into<String>,
        sort: SortOrder,
        css: impl Into<String>,
    ) -> Self {
        SiteRenderer {
            store,
            markdown,
            title: title.into(),
            sort,
            css: css.into(),
        }
    }

    /// Creates a renderer from the configuration, resolving the stylesheet.
    ///
    /// Fetching a stylesheet URL blocks, so this must run outside of an async
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Server` if the stylesheet cannot be loaded and
    /// `AppError::Template` if the file template does not parse.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let css = load_css(&config.build.css)?;
        Ok(SiteRenderer::new(
            EntryStore::from_config(config)?,
            MarkdownRenderer::new((&config.build).into()),
            config.build.title.clone(),
            config.build.sort,
            css,
        ))
    }

    /// Returns a copy presenting entries in `sort` order.
    pub fn with_sort(self, sort: SortOrder) -> Self {
        SiteRenderer { sort, ..self }
    }

    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Scans, sorts and renders all entries.
    ///
    /// An entry that cannot be read keeps empty content; the others are
    /// still rendered.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the base directory cannot be scanned.
    #[instrument(skip(self), fields(base_dir = %self.store.base_dir().display()))]
    pub fn load_entries(&self) -> AppResult<EntryCollection> {
        let mut entries = self.store.list_entries()?;
        entries.sort(self.sort);

        let rendered: EntryCollection = entries
            .into_iter()
            .map(|entry| match read_entry(&entry) {
                Ok(raw) => {
                    let html = self.markdown.render_entry(&raw);
                    entry.with_raw_content(raw).with_rendered_html(html)
                }
                Err(_) => entry,
            })
            .collect();

        debug!(count = rendered.len(), "loaded entries");
        Ok(rendered)
    }

    /// Builds the page data for `entries`.
    pub fn index_data(&self, entries: &EntryCollection, live_reload: bool) -> IndexData {
        let (template_entries, year_navs) =
            page::convert_to_template_entries(entries.as_slice(), self.store.date_layout());
        IndexData {
            title: self.title.clone(),
            entries: template_entries,
            year_navs,
            css: self.css.clone(),
            live_reload,
        }
    }

    /// Renders the index page for `entries`.
    pub fn render_index(&self, entries: &EntryCollection, live_reload: bool) -> String {
        page::index(&self.index_data(entries, live_reload)).into_string()
    }
}
