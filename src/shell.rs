//! Shell abstraction for running expanded command templates.
//!
//! The `open` and `search` commands expand a configured template into a
//! command line and hand it to a system shell verbatim. No quoting is added:
//! templates are responsible for quoting their own arguments.
//!
//! Running commands goes through the `CommandRunner` trait so that operations
//! can be tested without spawning processes.

use crate::errors::CommandError;
use std::io;
use std::process::Command;
use tracing::debug;

/// Trait defining the interface for running a shell command line.
///
/// # Examples
///
/// ```
/// use daybook::shell::CommandRunner;
/// use daybook::errors::CommandError;
///
/// struct EchoRunner;
///
/// impl CommandRunner for EchoRunner {
///     fn run(&self, command: &str) -> Result<(), CommandError> {
///         println!("Would run: {}", command);
///         Ok(())
///     }
/// }
///
/// EchoRunner.run("vi 2024-01-01.md").unwrap();
/// ```
pub trait CommandRunner {
    /// Runs `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns a `CommandError` if the command cannot be started or exits
    /// unsuccessfully.
    fn run(&self, command: &str) -> Result<(), CommandError>;
}

/// Runs command lines through `sh -c`, inheriting the terminal.
///
/// # Examples
///
/// ```no_run
/// use daybook::shell::{CommandRunner, ShellRunner};
///
/// ShellRunner::default().run("vim \"2024-01-01.md\"").expect("editor failed");
/// ```
#[derive(Debug, Clone)]
pub struct ShellRunner {
    /// The shell binary (`sh` by default).
    pub shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        ShellRunner {
            shell: "sh".to_string(),
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<(), CommandError> {
        debug!(shell = %self.shell, command, "running command");

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .status()
            .map_err(|e| spawn_error(command, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::NonZeroExit {
                command: command.to_string(),
                status_code: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Maps a spawn failure to the matching `CommandError` variant.
fn spawn_error(command: &str, source: io::Error) -> CommandError {
    let command = command.to_string();
    match source.kind() {
        io::ErrorKind::NotFound => CommandError::CommandNotFound { command, source },
        io::ErrorKind::PermissionDenied => CommandError::PermissionDenied { command, source },
        _ => CommandError::ExecutionFailed { command, source },
    }
}
