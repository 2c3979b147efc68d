//! Error handling utilities for the daybook application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors produced while parsing or extracting calendar dates.
///
/// # Examples
///
/// ```
/// use daybook::errors::DateError;
///
/// let error = DateError::InvalidFormat { input: "2024-13-01".to_string() };
/// assert!(format!("{}", error).contains("2024-13-01"));
/// assert!(format!("{}", error).contains("yyyy-mm-dd"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    /// The input is not a valid `yyyy-mm-dd` date.
    #[error("Invalid date {input:?}: expected yyyy-mm-dd")]
    InvalidFormat {
        /// The rejected input
        input: String,
    },

    /// No `yyyy-mm-dd` substring was found in a file name.
    #[error("No date found in file name {filename:?}")]
    NotFound {
        /// The file name that was searched
        filename: String,
    },
}

/// Errors produced while parsing or expanding a template string.
///
/// # Examples
///
/// ```
/// use daybook::errors::TemplateError;
///
/// let error = TemplateError::UnknownField { field: "Author".to_string() };
/// assert!(format!("{}", error).contains("Author"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The template text is malformed.
    #[error("Template syntax error at byte {position}: {message}")]
    Syntax {
        /// Byte offset of the offending action
        position: usize,
        /// What was wrong
        message: String,
    },

    /// The template references a variable outside the supported set.
    #[error("Template references unknown field {field:?}")]
    UnknownField {
        /// The field name as written in the template
        field: String,
    },
}

/// Represents specific error cases that can occur when running an expanded shell command.
///
/// # Examples
///
/// ```
/// use daybook::errors::CommandError;
///
/// let error = CommandError::NonZeroExit {
///     command: "vim notes.md".to_string(),
///     status_code: 1,
/// };
///
/// assert!(format!("{}", error).contains("non-zero status code"));
/// assert!(format!("{}", error).contains("vim notes.md"));
/// ```
#[derive(Debug, Error)]
pub enum CommandError {
    /// The shell used to run commands cannot be found.
    #[error("Shell for command '{command}' not found: {source}. Please check that a POSIX shell is available in your PATH.")]
    CommandNotFound {
        /// The expanded command line
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Permission was denied when spawning the shell.
    #[error("Permission denied when trying to execute '{command}': {source}")]
    PermissionDenied {
        /// The expanded command line
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Spawning the shell failed for another I/O reason.
    #[error("Failed to execute '{command}': {source}")]
    ExecutionFailed {
        /// The expanded command line
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The command ran but exited unsuccessfully.
    #[error("Command '{command}' exited with non-zero status code: {status_code}")]
    NonZeroExit {
        /// The expanded command line
        command: String,
        /// The exit status code (-1 when terminated by a signal)
        status_code: i32,
    },
}

/// Errors that prevent the preview server (or the site renderer it shares
/// with the static builder) from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The address we tried to bind
        addr: SocketAddr,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The filesystem watcher could not be created.
    #[error("Failed to watch journal directory: {0}")]
    Watch(#[from] notify::Error),

    /// The configured stylesheet could not be loaded.
    #[error("Failed to load CSS from {location}: {message}")]
    Css {
        /// The configured CSS location
        location: String,
        /// What went wrong
        message: String,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

/// Represents all possible errors that can occur in the daybook application.
///
/// # Examples
///
/// Creating a configuration error:
/// ```
/// use daybook::errors::AppError;
///
/// let error = AppError::Config("invalid sort: random".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: invalid sort: random");
/// ```
///
/// Converting from an IO error:
/// ```
/// use daybook::errors::AppError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "file not found");
/// let app_error: AppError = io_error.into();
///
/// match app_error {
///     AppError::Io(inner) => assert_eq!(inner.kind(), ErrorKind::NotFound),
///     _ => panic!("Expected Io variant"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file is not valid TOML for our schema.
    #[error("Configuration error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Invalid `--date` input or undated file names.
    #[error("{0}")]
    Date(#[from] DateError),

    /// Malformed templates or expansion failures.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Input/output errors from filesystem operations.
    ///
    /// This variant automatically converts from `std::io::Error` through the `From` trait.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failures of the shell command collaborator.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Failures starting or running the preview server.
    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;
