/*!
# Daybook

Daybook is a small journaling tool: one Markdown file per day, kept in a plain
directory tree that any editor can work with. It creates entries from a
template, renders the whole journal as a single HTML page, and can serve that
page with live reload while you write.

## Core Features

- Create today's (or any day's) entry from a configurable template
- Open and search entries with configurable shell commands
- Render all entries into a static `index.html`
- Preview the journal in a browser, reloading as files change

## Architecture

- `cli`: Command-line interface handling using clap
- `config`: Configuration loading and validation
- `dates`: Date layouts, parsing and filename date extraction
- `template`: Placeholder templates for entry content and commands
- `journal`: Entry discovery and creation on disk
- `render`: Markdown to HTML and the index page
- `site`: Shared page rendering and the static builder
- `preview`: The live preview server and file watching
- `shell`: Running expanded command lines
- `ops`: The operation behind each command
- `errors`: Error handling infrastructure

## Usage Example

```rust,no_run
use daybook::journal::EntryStore;
use daybook::{dates, Config};

fn main() -> daybook::AppResult<()> {
    let config = Config::load(None)?;
    let store = EntryStore::from_config(&config)?;

    let path = store.create_entry(dates::today())?;
    println!("{}", path.display());
    Ok(())
}
```
*/

/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// Calendar date formatting and parsing
pub mod dates;
/// Error types and utilities for error handling
pub mod errors;
/// Journal entries on disk
pub mod journal;
/// Command implementations
pub mod ops;
/// Live preview server
pub mod preview;
/// HTML rendering
pub mod render;
/// Shell command execution
pub mod shell;
/// Page rendering shared by build and serve
pub mod site;
/// Placeholder templates
pub mod template;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use errors::{AppError, AppResult};
