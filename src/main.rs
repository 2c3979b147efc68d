/*!
# Daybook - A Simple Journaling Tool

This file contains the main application flow: it sets up logging, parses the
command line, loads configuration and dispatches to the matching operation.

## Usage

```
daybook [OPTIONS] <COMMAND>

Commands:
  new      Create an entry (today's by default) and print its path
  open     Create an entry if needed and open it with the configured command
  path     Print the path of an entry or of the base directory
  list     List entries as DATE<TAB>PATH
  search   Search entries with the configured search command
  build    Render the journal into a static index.html
  serve    Serve the journal with a live preview
  init     Write a default configuration file
  config   Show the effective configuration
  version  Show version and build information

Options:
  -c, --config <CONFIG>          Configuration file
  -v, --verbose                  Print verbose output
      --log-format <LOG_FORMAT>  Log format for diagnostics on stderr [default: text]
```

## Configuration

- `DAYBOOK_CONFIG`: configuration file to read when `--config` is not given
- `DAYBOOK_DIR`: overrides `[common] base_directory`
- `RUST_LOG`: log filter (takes precedence over `--verbose`)
*/

use clap::Parser;
use daybook::cli::{CliArgs, Command};
use daybook::config::Config;
use daybook::constants::{
    DEFAULT_LOG_LEVEL, LOG_FORMAT_JSON, TRACING_ROOT_SPAN_NAME, TRACING_SERVICE_NAME,
};
use daybook::dates;
use daybook::errors::AppResult;
use daybook::journal::EntryStore;
use daybook::ops::{self, PathTarget};
use daybook::preview::{ServeOptions, WatchBackend};
use daybook::shell::ShellRunner;
use std::process;
use std::time::Duration;
use tracing::{debug, info_span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let args = CliArgs::parse();
    init_tracing(args.verbose, &args.log_format);

    let correlation_id = uuid::Uuid::new_v4().to_string();
    let root_span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        service_name = TRACING_SERVICE_NAME,
        correlation_id = %correlation_id
    );
    let _guard = root_span.enter();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Installs the global subscriber. Logs go to stderr; stdout carries command output.
fn init_tracing(verbose: bool, log_format: &str) {
    let default_level = if verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let json = log_format == LOG_FORMAT_JSON;
    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

/// Runs one command.
///
/// # Errors
///
/// Any error from configuration loading or the command itself; the caller
/// reports it and exits non-zero.
fn run(args: CliArgs) -> AppResult<()> {
    debug!("CLI arguments: {:?}", args);

    match args.command {
        Command::Init { force } => {
            let path = ops::init_config(args.config.as_deref(), force)?;
            println!("Created config file at {}", path.display());
            return Ok(());
        }
        Command::Version => {
            println!("{}", ops::version_info());
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load(args.config.as_deref())?;
    let today = dates::today();

    match args.command {
        Command::New(date) => {
            let store = EntryStore::from_config(&config)?;
            let path = ops::new_entry(&store, date.resolve(today)?)?;
            println!("{}", path.display());
        }
        Command::Open(date) => {
            ops::open_entry(&config, &ShellRunner::default(), date.resolve(today)?)?;
        }
        Command::Path { date, base, check } => {
            let store = EntryStore::from_config(&config)?;
            let target = if base {
                PathTarget::Base
            } else {
                PathTarget::Entry(date.resolve(today)?)
            };
            println!("{}", ops::entry_path(&store, target, check)?.display());
        }
        Command::List { sort } => {
            let store = EntryStore::from_config(&config)?;
            let entries = ops::list_entries(&store, sort.unwrap_or(config.build.sort))?;
            for entry in &entries {
                println!("{}\t{}", dates::format(entry.date()), entry.path().display());
            }
        }
        Command::Search { pattern } => {
            ops::search_entries(&config, &ShellRunner::default(), &pattern)?;
        }
        Command::Build { output } => {
            let index = ops::build_site(&config, &output)?;
            println!("{}", index.display());
        }
        Command::Serve {
            port,
            sort,
            live_reload,
            poll,
        } => {
            let options = ServeOptions {
                port: port.unwrap_or(config.serve.port),
                live_reload,
                backend: poll
                    .map(|millis| WatchBackend::Polling(Duration::from_millis(millis)))
                    .unwrap_or(WatchBackend::Native),
                ..ServeOptions::default()
            };
            ops::serve(&config, options, sort)?;
        }
        Command::Config => {
            print!("{}", ops::describe_config(&config)?);
        }
        Command::Init { .. } | Command::Version => {}
    }

    Ok(())
}
