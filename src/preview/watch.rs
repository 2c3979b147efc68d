//! Filesystem change notification for the preview server.
//!
//! Change detection sits behind the [`EventSource`] trait. The native source
//! uses the platform notification API through `notify`; the polling source
//! rescans the tree on an interval and works everywhere. The watch loop only
//! sees [`WatchEvent`]s and does not care which one is in use.

use crate::constants::{COALESCE_WINDOW_MILLIS, ENTRY_FILE_EXTENSION, WATCH_TICK_MILLIS};
use crate::errors::ServerError;
use crate::preview::state::{reload, SharedEntries};
use crate::site::SiteRenderer;
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Created,
    Modified,
    Removed,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: WatchEventKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: WatchEventKind) -> Self {
        WatchEvent {
            path: path.into(),
            kind,
        }
    }

    /// Whether this change can affect the journal page.
    pub fn touches_entry(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext == ENTRY_FILE_EXTENSION)
    }
}

/// Result of waiting on an [`EventSource`].
#[derive(Debug)]
pub enum Next {
    Event(WatchEvent),
    /// Nothing happened within the timeout.
    Idle,
    /// The source reported an error but keeps watching.
    Failed(notify::Error),
    /// The source is gone; no further events will arrive.
    Closed,
}

/// A restartable stream of filesystem changes below a root directory.
pub trait EventSource: Send {
    /// Waits up to `timeout` for the next change.
    fn next_event(&mut self, timeout: Duration) -> Next;
}

/// Which [`EventSource`] implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchBackend {
    Native,
    Polling(Duration),
}

impl WatchBackend {
    /// Starts watching `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Watch` if the watch cannot be established.
    pub fn open(self, root: &Path) -> Result<Box<dyn EventSource>, ServerError> {
        Ok(match self {
            WatchBackend::Native => Box::new(NotifyEventSource::new(root)?),
            WatchBackend::Polling(interval) => Box::new(PollingEventSource::new(root, interval)?),
        })
    }
}

/// Native change notifications via `notify`.
pub struct NotifyEventSource {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<notify::Result<notify::Event>>,
    pending: VecDeque<WatchEvent>,
}

impl NotifyEventSource {
    pub fn new(root: &Path) -> Result<Self, ServerError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        debug!(root = %root.display(), "native watcher started");
        Ok(NotifyEventSource {
            _watcher: watcher,
            rx,
            pending: VecDeque::new(),
        })
    }
}

impl EventSource for NotifyEventSource {
    fn next_event(&mut self, timeout: Duration) -> Next {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Next::Event(event);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(Ok(event)) => self.pending.extend(translate(event)),
                Ok(Err(e)) => return Next::Failed(e),
                Err(RecvTimeoutError::Timeout) => return Next::Idle,
                Err(RecvTimeoutError::Disconnected) => return Next::Closed,
            }
        }
    }
}

/// Maps a `notify` event to zero or more watch events.
///
/// Access and metadata-only changes are dropped. The source side of a rename
/// counts as a removal and the destination side as a creation.
fn translate(event: notify::Event) -> Vec<WatchEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => WatchEventKind::Created,
        EventKind::Remove(_) => WatchEventKind::Removed,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => WatchEventKind::Removed,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => WatchEventKind::Created,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            return event
                .paths
                .into_iter()
                .enumerate()
                .map(|(i, path)| {
                    let kind = if i == 0 {
                        WatchEventKind::Removed
                    } else {
                        WatchEventKind::Created
                    };
                    WatchEvent::new(path, kind)
                })
                .collect();
        }
        EventKind::Modify(_) => WatchEventKind::Modified,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };
    event
        .paths
        .into_iter()
        .map(|path| WatchEvent::new(path, kind))
        .collect()
}

/// Change detection by periodically comparing modification times.
pub struct PollingEventSource {
    root: PathBuf,
    interval: Duration,
    known: HashMap<PathBuf, SystemTime>,
    pending: VecDeque<WatchEvent>,
    next_scan: Instant,
}

impl PollingEventSource {
    /// Takes an initial inventory of `root`; existing files produce no events.
    pub fn new(root: &Path, interval: Duration) -> Result<Self, ServerError> {
        let known = scan(root).map_err(|e| ServerError::Watch(notify::Error::io(e)))?;
        debug!(root = %root.display(), files = known.len(), "polling watcher started");
        Ok(PollingEventSource {
            root: root.to_path_buf(),
            interval,
            known,
            pending: VecDeque::new(),
            next_scan: Instant::now() + interval,
        })
    }

    fn rescan(&mut self) -> io::Result<()> {
        let current = scan(&self.root)?;
        for (path, modified) in &current {
            match self.known.get(path) {
                None => self
                    .pending
                    .push_back(WatchEvent::new(path, WatchEventKind::Created)),
                Some(previous) if previous != modified => self
                    .pending
                    .push_back(WatchEvent::new(path, WatchEventKind::Modified)),
                Some(_) => {}
            }
        }
        for path in self.known.keys() {
            if !current.contains_key(path) {
                self.pending
                    .push_back(WatchEvent::new(path, WatchEventKind::Removed));
            }
        }
        self.known = current;
        Ok(())
    }
}

impl EventSource for PollingEventSource {
    fn next_event(&mut self, timeout: Duration) -> Next {
        if let Some(event) = self.pending.pop_front() {
            return Next::Event(event);
        }

        let now = Instant::now();
        if now < self.next_scan {
            let wait = (self.next_scan - now).min(timeout);
            std::thread::sleep(wait);
            if Instant::now() < self.next_scan {
                return Next::Idle;
            }
        }

        self.next_scan = Instant::now() + self.interval;
        if let Err(e) = self.rescan() {
            return Next::Failed(notify::Error::io(e));
        }
        match self.pending.pop_front() {
            Some(event) => Next::Event(event),
            None => Next::Idle,
        }
    }
}

/// Lists every file below `root` with its modification time.
fn scan(root: &Path) -> io::Result<HashMap<PathBuf, SystemTime>> {
    let mut files = HashMap::new();
    for item in WalkDir::new(root) {
        let item = match item {
            Ok(item) => item,
            Err(e) if e.depth() > 0 && is_not_found(&e) => continue,
            Err(e) => return Err(e.into()),
        };
        if item.file_type().is_dir() {
            continue;
        }
        match item.metadata() {
            Ok(metadata) => {
                let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                files.insert(item.into_path(), modified);
            }
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(files)
}

/// Files removed while a scan is running are not errors.
fn is_not_found(error: &walkdir::Error) -> bool {
    error
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

/// Runs until `shutdown` is cancelled or the source closes.
///
/// Every change to an entry file triggers a full reload; changes arriving in
/// quick succession are coalesced into one. Each completed reload publishes
/// the new snapshot version on `reloads`. Watch and reload errors are logged
/// and the loop keeps going.
pub fn run_watch_loop(
    mut source: Box<dyn EventSource>,
    site: &SiteRenderer,
    shared: &SharedEntries,
    reloads: &broadcast::Sender<u64>,
    shutdown: &CancellationToken,
) {
    let tick = Duration::from_millis(WATCH_TICK_MILLIS);
    let coalesce = Duration::from_millis(COALESCE_WINDOW_MILLIS);

    while !shutdown.is_cancelled() {
        let event = match source.next_event(tick) {
            Next::Event(event) => event,
            Next::Idle => continue,
            Next::Failed(e) => {
                warn!(error = %e, "watch error");
                continue;
            }
            Next::Closed => break,
        };
        if !event.touches_entry() {
            continue;
        }

        let mut changes = 1;
        let mut closed = false;
        loop {
            match source.next_event(coalesce) {
                Next::Event(more) => {
                    if more.touches_entry() {
                        changes += 1;
                    }
                }
                Next::Idle => break,
                Next::Failed(e) => warn!(error = %e, "watch error"),
                Next::Closed => {
                    closed = true;
                    break;
                }
            }
        }

        info!(
            path = %event.path.display(),
            kind = ?event.kind,
            changes,
            "entry changed, reloading"
        );
        match reload(site, shared) {
            Ok(version) => {
                // No receivers just means no browser is connected.
                let _ = reloads.send(version);
            }
            Err(e) => error!(error = %e, "reload failed, keeping previous entries"),
        }

        if closed {
            break;
        }
    }
    debug!("watch loop stopped");
}
