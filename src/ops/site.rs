//! Site commands: static build and live preview.

use crate::config::{Config, SortOrder};
use crate::errors::{AppError, AppResult};
use crate::preview::{PreviewServer, ServeOptions};
use crate::site::{SiteRenderer, StaticBuilder};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Renders the journal once into `output_dir/index.html`.
///
/// # Returns
///
/// The path of the written index page.
///
/// # Errors
///
/// Returns `AppError::Server` if the configured stylesheet cannot be loaded
/// and `AppError::Io` if scanning or writing fails.
pub fn build_site(config: &Config, output_dir: &Path) -> AppResult<PathBuf> {
    let site = SiteRenderer::from_config(config)?;
    StaticBuilder::new(site).build(output_dir)
}

/// Runs the preview server until the process is interrupted.
///
/// The stylesheet is resolved before the async runtime starts. Ctrl-C starts
/// a graceful shutdown.
///
/// # Arguments
///
/// * `config` - Application configuration
/// * `options` - Listening and watching options; the port comes from here
/// * `sort` - Overrides `[build] sort` when given
///
/// # Errors
///
/// Returns an error if the server cannot start (see [`PreviewServer::run`])
/// or the runtime cannot be created.
pub fn serve(config: &Config, options: ServeOptions, sort: Option<SortOrder>) -> AppResult<()> {
    let mut site = SiteRenderer::from_config(config)?;
    if let Some(sort) = sort {
        site = site.with_sort(sort);
    }
    let server = PreviewServer::new(site, options);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::Io)?;

    runtime.block_on(async {
        let shutdown = CancellationToken::new();
        let on_interrupt = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("interrupt received");
                    on_interrupt.cancel();
                }
                Err(e) => warn!(error = %e, "failed to listen for interrupt"),
            }
        });
        server.run(shutdown).await
    })
}
