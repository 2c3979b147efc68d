//! Configuration management for the daybook application.
//!
//! Configuration is read from a sectioned TOML file. Every section and every
//! field is optional and falls back to a documented default, so an empty file
//! (or no file at all) yields a usable configuration.
//!
//! # Lookup Order
//!
//! 1. The path given with `--config`
//! 2. The path in `DAYBOOK_CONFIG`
//! 3. `.daybook.toml` in the working directory
//! 4. `~/.config/daybook/config.toml`
//! 5. Built-in defaults
//!
//! A file named explicitly (1 or 2) must exist.
//!
//! # Environment Variables
//!
//! - `DAYBOOK_CONFIG`: Path to the configuration file
//! - `DAYBOOK_DIR`: Overrides `[common] base_directory`
//! - `HOME` and any other variable referenced by `base_directory` (expanded with `shellexpand`)

use crate::constants::{
    DEFAULT_BASE_DIRECTORY, DEFAULT_CONFIG_FILE_NAME, DEFAULT_DATE_FORMAT, DEFAULT_FILE_TEMPLATE,
    DEFAULT_HEADING_SHIFT, DEFAULT_OPEN_COMMAND, DEFAULT_PATH_FORMAT, DEFAULT_PORT,
    DEFAULT_SEARCH_COMMAND, DEFAULT_TITLE, ENV_VAR_DAYBOOK_CONFIG, ENV_VAR_DAYBOOK_DIR,
    USER_CONFIG_PATH,
};
use crate::dates::DateLayout;
use crate::errors::{AppError, AppResult};
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Order in which entries are presented.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// `[common]`: where entries live and how they are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    /// Root directory of the journal.
    pub base_directory: PathBuf,
    /// Layout of the `Date` template variable.
    pub date_format: String,
    /// Layout of entry paths relative to `base_directory`.
    pub path_format: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        CommonConfig {
            base_directory: PathBuf::from(DEFAULT_BASE_DIRECTORY),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            path_format: DEFAULT_PATH_FORMAT.to_string(),
        }
    }
}

/// `[new]`: content of freshly created entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewConfig {
    pub file_template: String,
}

impl Default for NewConfig {
    fn default() -> Self {
        NewConfig {
            file_template: DEFAULT_FILE_TEMPLATE.to_string(),
        }
    }
}

/// `[open]`: shell command used to open an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenConfig {
    pub command: String,
}

impl Default for OpenConfig {
    fn default() -> Self {
        OpenConfig {
            command: DEFAULT_OPEN_COMMAND.to_string(),
        }
    }
}

/// `[search]`: shell command used to search entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub command: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            command: DEFAULT_SEARCH_COMMAND.to_string(),
        }
    }
}

/// `[build]`: how the journal page is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Page title.
    pub title: String,
    /// Entry order on the page.
    pub sort: SortOrder,
    /// Inline CSS or an `http(s)://` URL; empty selects the built-in stylesheet.
    pub css: String,
    /// Heading levels added to every entry heading (0 disables).
    pub heading_shift: u8,
    /// Render single newlines as line breaks.
    pub hard_wraps: bool,
    /// Turn bare URLs into links.
    pub linkify: bool,
    /// Open absolute links in a new tab.
    pub link_target_blank: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            title: DEFAULT_TITLE.to_string(),
            sort: SortOrder::default(),
            css: String::new(),
            heading_shift: DEFAULT_HEADING_SHIFT,
            hard_wraps: true,
            linkify: true,
            link_target_blank: true,
        }
    }
}

/// `[serve]`: preview server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig { port: DEFAULT_PORT }
    }
}

/// Configuration for the daybook application.
///
/// # Examples
///
/// ```
/// use daybook::config::{Config, SortOrder};
///
/// let config = Config::from_toml_str("[build]\nsort = \"asc\"\n").unwrap();
/// assert_eq!(config.build.sort, SortOrder::Asc);
/// assert_eq!(config.serve.port, 8080);
/// assert_eq!(config.common.path_format, "2006-01-02.md");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub common: CommonConfig,
    pub new: NewConfig,
    pub open: OpenConfig,
    pub search: SearchConfig,
    pub build: BuildConfig,
    pub serve: ServeConfig,

    /// The file this configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Parses configuration text without resolving or validating it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TomlParse` if the text is not valid TOML for this schema.
    pub fn from_toml_str(text: &str) -> AppResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Locates, reads, resolves and validates the configuration.
    ///
    /// # Arguments
    ///
    /// * `explicit` - Path given on the command line, if any
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if an explicitly named file is missing, the
    /// base directory cannot be expanded, or validation fails, and
    /// `AppError::TomlParse` if the file is malformed.
    pub fn load(explicit: Option<&Path>) -> AppResult<Self> {
        let config = match find_config_file(explicit)? {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration file");
                let text = fs::read_to_string(&path).map_err(|e| {
                    AppError::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Config {
                    source: Some(path),
                    ..Config::from_toml_str(&text)?
                }
            }
            None => {
                debug!("no configuration file found, using defaults");
                Config::default()
            }
        };

        config.resolve()
    }

    /// Applies `DAYBOOK_DIR`, expands and absolutizes the base directory,
    /// then validates the result.
    pub fn resolve(mut self) -> AppResult<Self> {
        if let Some(dir) = env::var_os(ENV_VAR_DAYBOOK_DIR).filter(|d| !d.is_empty()) {
            debug!("base directory overridden by {}", ENV_VAR_DAYBOOK_DIR);
            self.common.base_directory = PathBuf::from(dir);
        }

        let raw = self.common.base_directory.to_string_lossy().into_owned();
        let expanded = shellexpand::full(&raw)
            .map_err(|e| AppError::Config(format!("Failed to expand base_directory: {}", e)))?;
        let mut base_directory = PathBuf::from(expanded.into_owned());
        if base_directory.is_relative() {
            base_directory = env::current_dir()?.join(base_directory);
        }
        self.common.base_directory = normalize(&base_directory);

        self.validate()?;
        Ok(self)
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when:
    /// - `base_directory` is empty
    /// - a date layout uses an unsupported strftime specifier
    /// - `path_format` is absolute or cannot tell distinct days apart
    /// - any template does not parse
    pub fn validate(&self) -> AppResult<()> {
        if self.common.base_directory.as_os_str().is_empty() {
            return Err(AppError::Config("base_directory is empty".to_string()));
        }

        for (name, layout) in [
            ("date_format", &self.common.date_format),
            ("path_format", &self.common.path_format),
        ] {
            if !DateLayout::new(layout).is_valid() {
                return Err(AppError::Config(format!(
                    "{} {:?} contains an unsupported format specifier",
                    name, layout
                )));
            }
        }

        let path_format = &self.common.path_format;
        if Path::new(path_format).is_absolute() {
            return Err(AppError::Config(format!(
                "path_format {:?} must be relative to base_directory",
                path_format
            )));
        }
        if !DateLayout::new(path_format).is_unique_per_day() {
            return Err(AppError::Config(format!(
                "path_format {:?} must contain year, month and day (or year and day of year)",
                path_format
            )));
        }

        for (name, text) in [
            ("[new] file_template", &self.new.file_template),
            ("[open] command", &self.open.command),
            ("[search] command", &self.search.command),
        ] {
            Template::parse(text)
                .map_err(|e| AppError::Config(format!("invalid {}: {}", name, e)))?;
        }

        Ok(())
    }

    /// Serializes the effective configuration as TOML.
    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))
    }
}

/// Finds the configuration file to read, following the lookup order.
fn find_config_file(explicit: Option<&Path>) -> AppResult<Option<PathBuf>> {
    let named = explicit.map(Path::to_path_buf).or_else(|| {
        env::var_os(ENV_VAR_DAYBOOK_CONFIG)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    });
    if let Some(path) = named {
        if !path.is_file() {
            return Err(AppError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(Some(local));
    }

    let user = PathBuf::from(shellexpand::tilde(USER_CONFIG_PATH).into_owned());
    if user.is_file() {
        return Ok(Some(user));
    }

    Ok(None)
}

/// Removes `.` components so printed paths stay tidy.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

/// Commented configuration written by `init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r##"# daybook configuration file

[common]
# base_directory = "."  # Default: current directory (DAYBOOK_DIR overrides)
date_format = "2006-01-02"
path_format = "2006-01-02.md"

[new]
file_template = "# {{ .Date }}"

# [open]
# command = '${EDITOR:-vi} "{{ .File }}"'

# [search]
# command = '''grep -rn --include='*.md' -- "{{ .Pattern }}" "{{ .BaseDir }}"'''

[build]
title = "Journal"
sort = "desc"
# heading_shift = 4  # Shift heading levels in HTML output (0 to disable)
# hard_wraps = true
# css = "https://cdn.jsdelivr.net/npm/water.css@2/out/water.css"

[serve]
port = 8080
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn clear_env() {
        env::remove_var(ENV_VAR_DAYBOOK_CONFIG);
        env::remove_var(ENV_VAR_DAYBOOK_DIR);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.common.base_directory, PathBuf::from("."));
        assert_eq!(config.common.date_format, "2006-01-02");
        assert_eq!(config.common.path_format, "2006-01-02.md");
        assert_eq!(config.new.file_template, "# {{ .Date }}");
        assert_eq!(config.build.title, "Journal");
        assert_eq!(config.build.sort, SortOrder::Desc);
        assert_eq!(config.build.heading_shift, 4);
        assert!(config.build.hard_wraps);
        assert!(config.build.css.is_empty());
        assert_eq!(config.serve.port, 8080);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = Config::from_toml_str(
            "[build]\ntitle = \"Diary\"\nheading_shift = 0\n\n[serve]\nport = 9000\n",
        )
        .unwrap();
        assert_eq!(config.build.title, "Diary");
        assert_eq!(config.build.heading_shift, 0);
        assert_eq!(config.build.sort, SortOrder::Desc);
        assert!(config.build.hard_wraps);
        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.common, CommonConfig::default());
    }

    #[test]
    fn test_invalid_values_are_parse_errors() {
        for text in [
            "[build]\nsort = \"random\"\n",
            "[build]\nheading_shift = -1\n",
            "[serve]\nport = \"eighty\"\n",
            "[common\n",
        ] {
            assert!(
                matches!(Config::from_toml_str(text), Err(AppError::TomlParse(_))),
                "text {:?}",
                text
            );
        }
    }

    #[test]
    fn test_validate_rejects_ambiguous_path_format() {
        let mut config = Config::default();
        config.common.base_directory = PathBuf::from("/tmp/j");
        config.common.path_format = "2006-01.md".to_string();
        match config.validate() {
            Err(AppError::Config(msg)) => assert!(msg.contains("path_format")),
            other => panic!("expected config error, got {:?}", other),
        }

        config.common.path_format = "/abs/2006-01-02.md".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_date_layouts() {
        let mut config = Config::default();
        config.common.base_directory = PathBuf::from("/tmp/j");
        config.common.date_format = "2006-01-02 15:04".to_string();
        assert!(config.validate().is_ok());

        config.common.date_format = "%Y-%m-%d %z".to_string();
        match config.validate() {
            Err(AppError::Config(msg)) => assert!(msg.contains("unsupported format specifier")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_templates() {
        let mut config = Config::default();
        config.new.file_template = "# {{ .Weather }}".to_string();
        match config.validate() {
            Err(AppError::Config(msg)) => assert!(msg.contains("file_template")),
            other => panic!("expected config error, got {:?}", other),
        }

        let mut config = Config::default();
        config.open.command = "vi {{ .File".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_template_is_valid() {
        let config = Config::from_toml_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.build.title, "Journal");
    }

    #[test]
    fn test_toml_output_round_trips() {
        let mut config = Config::default();
        config.build.sort = SortOrder::Asc;
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[build]"));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    #[serial]
    fn test_load_explicit_missing_file_is_error() {
        clear_env();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        match Config::load(Some(&missing)) {
            Err(AppError::Config(msg)) => assert!(msg.contains("not found")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_load_resolves_base_directory() {
        clear_env();
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[common]\nbase_directory = \"$DAYBOOK_TEST_ROOT/journal\"\n").unwrap();

        env::set_var("DAYBOOK_TEST_ROOT", dir.path());
        let config = Config::load(Some(&path)).unwrap();
        env::remove_var("DAYBOOK_TEST_ROOT");

        assert_eq!(config.common.base_directory, dir.path().join("journal"));
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        let dir = tempdir().unwrap();
        let path = dir.path().join("from-env.toml");
        fs::write(&path, "[serve]\nport = 4000\n").unwrap();

        env::set_var(ENV_VAR_DAYBOOK_CONFIG, &path);
        env::set_var(ENV_VAR_DAYBOOK_DIR, dir.path().join("entries"));
        let config = Config::load(None);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.serve.port, 4000);
        assert_eq!(config.common.base_directory, dir.path().join("entries"));
    }

    #[test]
    #[serial]
    fn test_relative_base_directory_is_absolutized() {
        clear_env();
        let config = Config {
            common: CommonConfig {
                base_directory: PathBuf::from("./notes"),
                ..CommonConfig::default()
            },
            ..Config::default()
        }
        .resolve()
        .unwrap();
        assert!(config.common.base_directory.is_absolute());
        assert!(config.common.base_directory.ends_with("notes"));
    }
}
