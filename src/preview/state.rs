//! Shared state of the preview server.

use crate::errors::AppResult;
use crate::journal::EntryCollection;
use crate::site::SiteRenderer;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// An immutable view of the journal produced by one reload.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Increases by one with every completed reload.
    pub version: u64,
    pub entries: EntryCollection,
}

/// The current snapshot behind a reader/writer lock.
///
/// Readers clone the `Arc` and release the lock immediately; a reload swaps
/// in a new snapshot, so readers never observe a partially updated view.
#[derive(Debug, Clone, Default)]
pub struct SharedEntries {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl SharedEntries {
    pub fn new() -> Self {
        SharedEntries::default()
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publishes `entries` as the next snapshot and returns its version.
    pub fn replace(&self, entries: EntryCollection) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let version = guard.version + 1;
        *guard = Arc::new(Snapshot { version, entries });
        version
    }
}

/// Rescans and renders all entries off-lock, then swaps the snapshot in.
///
/// # Errors
///
/// Returns the scan error; the previous snapshot stays in place.
pub fn reload(site: &SiteRenderer, shared: &SharedEntries) -> AppResult<u64> {
    let entries = site.load_entries()?;
    let count = entries.len();
    let version = shared.replace(entries);
    info!(version, entries = count, "reloaded journal");
    Ok(version)
}

/// State shared by all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub site: Arc<SiteRenderer>,
    pub entries: SharedEntries,
    /// Carries the snapshot version after every completed reload.
    pub reloads: broadcast::Sender<u64>,
    pub live_reload: bool,
    /// Cancelled when the server shuts down; ends open event streams.
    pub shutdown: CancellationToken,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::JournalEntry;
    use chrono::NaiveDate;

    fn collection(days: &[u32]) -> EntryCollection {
        days.iter()
            .map(|d| {
                let date = NaiveDate::from_ymd_opt(2024, 1, *d).unwrap();
                JournalEntry::new(format!("{}.md", date), date)
            })
            .collect()
    }

    #[test]
    fn test_replace_increments_version() {
        let shared = SharedEntries::new();
        assert_eq!(shared.snapshot().version, 0);
        assert!(shared.snapshot().entries.is_empty());

        assert_eq!(shared.replace(collection(&[1, 2])), 1);
        assert_eq!(shared.replace(collection(&[1, 2, 3])), 2);
        assert_eq!(shared.snapshot().entries.len(), 3);
    }

    #[test]
    fn test_old_snapshot_stays_consistent() {
        let shared = SharedEntries::new();
        shared.replace(collection(&[1]));
        let held = shared.snapshot();

        shared.replace(collection(&[1, 2, 3, 4]));

        assert_eq!(held.version, 1);
        assert_eq!(held.entries.len(), 1);
        assert_eq!(shared.snapshot().entries.len(), 4);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let shared = SharedEntries::new();
        std::thread::scope(|scope| {
            let writer = shared.clone();
            scope.spawn(move || {
                for n in 1..=20u32 {
                    writer.replace(collection(&(1..=n).collect::<Vec<_>>()));
                }
            });
            for _ in 0..4 {
                let reader = shared.clone();
                scope.spawn(move || {
                    for _ in 0..200 {
                        let snapshot = reader.snapshot();
                        assert_eq!(snapshot.entries.len() as u64, snapshot.version);
                    }
                });
            }
        });
        assert_eq!(shared.snapshot().version, 20);
    }
}
