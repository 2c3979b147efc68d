//! Constants used throughout the application.
//!
//! This module contains all constants used in the Daybook application, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "daybook";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A simple CLI tool for daily journaling in Markdown";

// CLI Arguments & Defaults
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default output directory for `build`.
pub const DEFAULT_BUILD_OUTPUT: &str = "public";

// Configuration Keys & Environment Variables
/// Environment variable naming an explicit configuration file.
pub const ENV_VAR_DAYBOOK_CONFIG: &str = "DAYBOOK_CONFIG";
/// Environment variable overriding the configured base directory.
pub const ENV_VAR_DAYBOOK_DIR: &str = "DAYBOOK_DIR";
/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE_NAME: &str = ".daybook.toml";
/// Fallback configuration file under the user's home directory.
pub const USER_CONFIG_PATH: &str = "~/.config/daybook/config.toml";

// Configuration Defaults
/// Default base directory (the working directory).
pub const DEFAULT_BASE_DIRECTORY: &str = ".";
/// Default layout used to display dates.
pub const DEFAULT_DATE_FORMAT: &str = "2006-01-02";
/// Default layout used to derive entry paths.
pub const DEFAULT_PATH_FORMAT: &str = "2006-01-02.md";
/// Default content template for new entries.
pub const DEFAULT_FILE_TEMPLATE: &str = "# {{ .Date }}";
/// Default command template for `open`.
pub const DEFAULT_OPEN_COMMAND: &str = "${EDITOR:-vi} \"{{ .File }}\"";
/// Default command template for `search`.
pub const DEFAULT_SEARCH_COMMAND: &str =
    "grep -rn --include='*.md' -- \"{{ .Pattern }}\" \"{{ .BaseDir }}\"";
/// Default page title for the rendered journal.
pub const DEFAULT_TITLE: &str = "Journal";
/// Default heading shift applied to rendered entries.
pub const DEFAULT_HEADING_SHIFT: u8 = 4;
/// Default port for the preview server.
pub const DEFAULT_PORT: u16 = 8080;

// File System Parameters
/// File extension (without the dot) of journal entries.
pub const ENTRY_FILE_EXTENSION: &str = "md";
/// Name of the generated index page.
pub const INDEX_FILE_NAME: &str = "index.html";
/// Default POSIX permissions for newly created entry directories.
#[cfg(unix)]
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o700;
/// POSIX permissions for generated site files and the default config file.
#[cfg(unix)]
pub const PUBLIC_FILE_PERMISSIONS: u32 = 0o644;

// Date/Time Logic
/// strftime format of the canonical date shape (yyyy-mm-dd).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Regex matching the canonical date shape anywhere in a file name.
pub const DATE_IN_FILENAME_PATTERN: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2}";
/// Highest HTML heading level.
pub const MAX_HEADING_LEVEL: u8 = 6;

// Preview Server
/// Path of the live-reload event stream.
pub const EVENTS_ROUTE: &str = "/events";
/// Message pushed to clients after every completed reload.
pub const RELOAD_MESSAGE: &str = "reload";
/// Message sent to a client right after it connects.
pub const CONNECTED_MESSAGE: &str = "connected";
/// Capacity of the reload broadcast channel.
pub const RELOAD_CHANNEL_CAPACITY: usize = 16;
/// How long graceful shutdown may take before connections are dropped.
pub const SHUTDOWN_GRACE_SECS: u64 = 5;
/// How often the watch loop checks for cancellation.
pub const WATCH_TICK_MILLIS: u64 = 200;
/// Changes arriving within this window of each other cause a single reload.
pub const COALESCE_WINDOW_MILLIS: u64 = 50;
/// Default interface the preview server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

// Logging Configuration
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "daybook";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";
