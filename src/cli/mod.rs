//! Command-line interface definition.

use crate::config::SortOrder;
use crate::constants::{APP_DESCRIPTION, APP_NAME, DEFAULT_BUILD_OUTPUT, LOG_FORMAT_TEXT};
use crate::dates;
use crate::errors::AppResult;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A simple CLI tool for daily journaling in Markdown
#[derive(Parser, Debug)]
#[clap(name = APP_NAME, about = APP_DESCRIPTION)]
#[clap(version, long_about = None)]
pub struct CliArgs {
    /// Configuration file (default: ./.daybook.toml, then ~/.config/daybook/config.toml)
    #[clap(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Print verbose output
    #[clap(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Log format for diagnostics on stderr
    #[clap(long, global = true, value_parser = ["text", "json"], default_value = LOG_FORMAT_TEXT)]
    pub log_format: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Create an entry (today's by default) and print its path
    New(DateArg),

    /// Create an entry if needed and open it with the configured command
    Open(DateArg),

    /// Print the path of an entry or of the base directory
    Path {
        #[clap(flatten)]
        date: DateArg,

        /// Print the base directory instead of an entry path
        #[clap(short = 'b', long)]
        base: bool,

        /// Fail unless the path exists
        #[clap(long)]
        check: bool,
    },

    /// List entries as DATE<TAB>PATH
    List {
        /// Sort order (default from [build] sort)
        #[clap(short = 's', long, value_enum)]
        sort: Option<SortOrder>,
    },

    /// Search entries with the configured search command
    Search {
        /// Pattern passed to the search command
        pattern: String,
    },

    /// Render the journal into a static index.html
    Build {
        /// Output directory
        #[clap(short = 'o', long, default_value = DEFAULT_BUILD_OUTPUT)]
        output: PathBuf,
    },

    /// Serve the journal with a live preview
    Serve {
        /// Port to listen on (default from [serve] port)
        #[clap(short = 'p', long)]
        port: Option<u16>,

        /// Sort order (default from [build] sort)
        #[clap(short = 's', long, value_enum)]
        sort: Option<SortOrder>,

        /// Reload open browser tabs when entries change
        #[clap(short = 'l', long)]
        live_reload: bool,

        /// Detect changes by polling every N milliseconds instead of native notifications
        #[clap(long, value_name = "MILLIS", num_args = 0..=1, default_missing_value = "500")]
        poll: Option<u64>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[clap(short = 'f', long)]
        force: bool,
    },

    /// Show the effective configuration
    Config,

    /// Show version and build information
    Version,
}

/// The `--date` option shared by entry commands.
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct DateArg {
    /// Date of the entry (format: yyyy-mm-dd, default: today)
    #[clap(short = 'd', long)]
    pub date: Option<String>,
}

impl DateArg {
    /// Parses the date, falling back to `today`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Date` if the value is not a valid `yyyy-mm-dd` date.
    pub fn resolve(&self, today: NaiveDate) -> AppResult<NaiveDate> {
        match &self.date {
            Some(input) => Ok(dates::parse(input)?),
            None => Ok(today),
        }
    }
}
