//! Live preview server.
//!
//! The server keeps a rendered snapshot of the journal in memory, serves it
//! over HTTP and rebuilds it whenever an entry file changes. With live reload
//! enabled, browsers subscribe to a server-sent event stream and refresh after
//! each rebuild.
//!
//! Lifecycle: `Stopped -> Starting -> Running -> ShuttingDown -> Stopped`.
//! A failure while starting goes straight back to `Stopped`.

pub mod routes;
pub mod state;
pub mod watch;

pub use state::{reload, AppState, SharedEntries, Snapshot};
pub use watch::{EventSource, WatchBackend, WatchEvent, WatchEventKind};

use crate::constants::{DEFAULT_HOST, RELOAD_CHANNEL_CAPACITY, SHUTDOWN_GRACE_SECS};
use crate::errors::{AppError, AppResult, ServerError};
use crate::site::SiteRenderer;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch as state_watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    /// Accepting connections on `addr`.
    Running { addr: SocketAddr },
    ShuttingDown,
}

impl ServerState {
    /// The listening address while running.
    pub fn addr(&self) -> Option<SocketAddr> {
        match self {
            ServerState::Running { addr } => Some(*addr),
            _ => None,
        }
    }
}

/// How the preview server listens and watches.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: IpAddr,
    /// `0` picks a free port; the chosen address is published with `Running`.
    pub port: u16,
    pub live_reload: bool,
    pub backend: WatchBackend,
}

impl Default for ServeOptions {
    fn default() -> Self {
        ServeOptions {
            host: DEFAULT_HOST.parse().unwrap_or(IpAddr::from([127, 0, 0, 1])),
            port: crate::constants::DEFAULT_PORT,
            live_reload: false,
            backend: WatchBackend::Native,
        }
    }
}

/// Serves the journal and keeps it up to date.
#[derive(Debug)]
pub struct PreviewServer {
    site: Arc<SiteRenderer>,
    options: ServeOptions,
    state_tx: state_watch::Sender<ServerState>,
}

impl PreviewServer {
    pub fn new(site: SiteRenderer, options: ServeOptions) -> Self {
        let (state_tx, _) = state_watch::channel(ServerState::Stopped);
        PreviewServer {
            site: Arc::new(site),
            options,
            state_tx,
        }
    }

    /// Subscribes to lifecycle changes.
    pub fn state(&self) -> state_watch::Receiver<ServerState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: ServerState) {
        self.state_tx.send_replace(state);
    }

    /// Loads the journal, starts serving and blocks until `shutdown` is
    /// cancelled or the HTTP server fails.
    ///
    /// On cancellation, in-flight requests get a grace period to finish and
    /// event streams are closed; connections still open afterwards are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the initial scan fails, `ServerError::Bind`
    /// if the address is unavailable and `ServerError::Watch` if the base
    /// directory cannot be watched. Nothing is left running in those cases.
    pub async fn run(&self, shutdown: CancellationToken) -> AppResult<()> {
        self.set_state(ServerState::Starting);
        match self.start_and_serve(shutdown).await {
            Ok(()) => {
                self.set_state(ServerState::Stopped);
                info!("preview server stopped");
                Ok(())
            }
            Err(e) => {
                self.set_state(ServerState::Stopped);
                Err(e)
            }
        }
    }

    async fn start_and_serve(&self, shutdown: CancellationToken) -> AppResult<()> {
        let entries = SharedEntries::new();
        {
            let site = Arc::clone(&self.site);
            let entries = entries.clone();
            tokio::task::spawn_blocking(move || reload(&site, &entries))
                .await
                .map_err(|e| AppError::Io(std::io::Error::other(e)))??;
        }

        let addr = SocketAddr::new(self.options.host, self.options.port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let source = self.options.backend.open(self.site.store().base_dir())?;

        // Child token so that stopping the watcher on a server failure does
        // not cancel the caller's token.
        let stop = shutdown.child_token();
        let (reloads, _) = broadcast::channel(RELOAD_CHANNEL_CAPACITY);
        let app_state = AppState {
            site: Arc::clone(&self.site),
            entries: entries.clone(),
            reloads: reloads.clone(),
            live_reload: self.options.live_reload,
            shutdown: stop.clone(),
        };

        let watcher = {
            let site = Arc::clone(&self.site);
            let stop = stop.clone();
            tokio::task::spawn_blocking(move || {
                watch::run_watch_loop(source, &site, &entries, &reloads, &stop)
            })
        };

        let mut server = {
            let router = routes::router(app_state);
            let stop = stop.clone();
            tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(stop.cancelled_owned())
                    .await
            })
        };

        self.set_state(ServerState::Running { addr: local_addr });
        info!(
            addr = %local_addr,
            base_dir = %self.site.store().base_dir().display(),
            live_reload = self.options.live_reload,
            "preview server listening on http://{}",
            local_addr
        );

        let outcome = tokio::select! {
            result = &mut server => Some(result),
            _ = shutdown.cancelled() => None,
        };

        let result = match outcome {
            Some(finished) => {
                stop.cancel();
                match finished {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => {
                        error!(error = %e, "preview server failed");
                        Err(ServerError::Serve(e).into())
                    }
                    Err(e) => Err(ServerError::Serve(std::io::Error::other(e)).into()),
                }
            }
            None => {
                self.set_state(ServerState::ShuttingDown);
                info!("shutting down preview server");
                let grace = Duration::from_secs(SHUTDOWN_GRACE_SECS);
                match tokio::time::timeout(grace, &mut server).await {
                    Ok(Ok(Ok(()))) => Ok(()),
                    Ok(Ok(Err(e))) => Err(ServerError::Serve(e).into()),
                    Ok(Err(e)) => Err(ServerError::Serve(std::io::Error::other(e)).into()),
                    Err(_) => {
                        warn!(
                            grace_secs = SHUTDOWN_GRACE_SECS,
                            "graceful shutdown timed out, dropping connections"
                        );
                        server.abort();
                        Ok(())
                    }
                }
            }
        };

        if let Err(e) = watcher.await {
            warn!(error = %e, "watch task ended abnormally");
        }
        result
    }
}
