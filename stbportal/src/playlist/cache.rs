use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use super::catalog::Catalog;
use super::source::{FetchError, PlaylistSource};

#[derive(Clone)]
struct Snapshot {
    catalog: Catalog,
    fetched_at: Instant,
}

/// Outcome of the most recent failed fetch.
struct Failure {
    error: FetchError,
    failed_at: Instant,
}

/**
    Catalog built from the upstream playlist, refreshed at most once per
    refresh interval.

    Refreshes are single-flight: callers that arrive while a fetch is running
    wait for it and share its result, success or failure. A snapshot is
    published only once it is fully parsed, so readers see either the old
    catalog or the new one.
*/
pub struct CatalogCache {
    source: Arc<dyn PlaylistSource>,
    refresh_interval: Duration,
    current: RwLock<Option<Snapshot>>,
    /// Serializes fetches and remembers the last failure for queued callers.
    refresh_gate: Mutex<Option<Failure>>,
}

impl CatalogCache {
    /// A zero `refresh_interval` fetches on every request (still coalesced).
    pub fn new(source: Arc<dyn PlaylistSource>, refresh_interval: Duration) -> Self {
        Self {
            source,
            refresh_interval,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(None),
        }
    }

    pub fn location(&self) -> &str {
        self.source.location()
    }

    /// Current catalog, fetching and parsing the playlist if needed.
    pub async fn get(&self) -> Result<Catalog, FetchError> {
        let requested_at = Instant::now();

        if let Some(catalog) = self.usable(requested_at).await {
            return Ok(catalog);
        }

        let mut last_failure = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we queued on the gate.
        if let Some(catalog) = self.usable(requested_at).await {
            return Ok(catalog);
        }
        if let Some(failure) = last_failure.as_ref()
            && failure.failed_at > requested_at
        {
            return Err(failure.error.clone());
        }

        let source = self.source.location();
        tracing::debug!(source, "Fetching playlist");

        let text = match self.source.fetch().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(source, error = %e, "Playlist fetch failed");
                *last_failure = Some(Failure {
                    error: e.clone(),
                    failed_at: Instant::now(),
                });
                return Err(e);
            }
        };
        let catalog = Catalog::build(&text);

        tracing::info!(
            source,
            channels = catalog.total_items(),
            "Playlist refreshed"
        );

        *self.current.write().await = Some(Snapshot {
            catalog: catalog.clone(),
            fetched_at: Instant::now(),
        });
        *last_failure = None;

        Ok(catalog)
    }

    /// Snapshot that is still fresh, or was fetched after this request began.
    async fn usable(&self, requested_at: Instant) -> Option<Catalog> {
        let current = self.current.read().await;
        let snapshot = current.as_ref()?;

        let fresh = snapshot.fetched_at.elapsed() < self.refresh_interval;
        let newer = snapshot.fetched_at > requested_at;
        (fresh || newer).then(|| snapshot.catalog.clone())
    }
}
