//! Setup and introspection commands: `init`, `config` and `version`.

use crate::config::{Config, DEFAULT_CONFIG_TEMPLATE};
use crate::constants::{APP_NAME, DEFAULT_CONFIG_FILE_NAME};
use crate::errors::{AppError, AppResult};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the commented default configuration.
///
/// # Arguments
///
/// * `target` - Where to write; `.daybook.toml` in the working directory if `None`
/// * `force` - Overwrite an existing file
///
/// # Returns
///
/// The path that was written.
///
/// # Errors
///
/// Returns `AppError::Config` if the file exists and `force` is not set, and
/// `AppError::Io` if it cannot be written.
pub fn init_config(target: Option<&Path>, force: bool) -> AppResult<PathBuf> {
    let path = target
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE_NAME));

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(crate::constants::PUBLIC_FILE_PERMISSIONS);
    }

    let mut file = options.open(&path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => AppError::Config(format!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        )),
        _ => AppError::Io(e),
    })?;
    file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())?;

    info!(path = %path.display(), "wrote configuration file");
    Ok(path)
}

/// Describes the effective configuration: its origin followed by TOML.
pub fn describe_config(config: &Config) -> AppResult<String> {
    let origin = match &config.source {
        Some(path) => path.display().to_string(),
        None => "(built-in defaults)".to_string(),
    };
    Ok(format!("# ConfigFile: {}\n{}", origin, config.to_toml_string()?))
}

/// Build metadata, e.g. `daybook 0.1.0 (Built on unknown from Git SHA unknown)`.
///
/// Build time and commit come from `DAYBOOK_BUILD_TIME` and `DAYBOOK_GIT_SHA`
/// at compile time.
pub fn version_info() -> String {
    format!(
        "{} {} (Built on {} from Git SHA {})",
        APP_NAME,
        env!("CARGO_PKG_VERSION"),
        option_env!("DAYBOOK_BUILD_TIME").unwrap_or("unknown"),
        option_env!("DAYBOOK_GIT_SHA").unwrap_or("unknown"),
    )
}
