use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::catalog::error::{CatalogError, CatalogParseError};
use crate::catalog::feed::FeedSource;
use crate::catalog::parsing::parse_feed;
use crate::catalog::types::{CatalogSnapshot, RefreshOutcome};

pub const DEFAULT_CACHE_LIFETIME: Duration = Duration::hours(24);

/// Owns the current catalog snapshot and refreshes it from a feed.
///
/// Readers get an `Arc` to a complete snapshot. A refresh builds a new
/// snapshot off to the side and swaps the pointer, so nobody observes a
/// half-built catalog. Refreshes are serialized; a caller that waited on
/// another refresh sees the fresh snapshot and takes the cached path.
pub struct CatalogManager<F> {
    feed: F,
    cache_lifetime: Duration,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    refresh_guard: Mutex<()>,
}

impl<F: FeedSource> CatalogManager<F> {
    pub fn new(feed: F, cache_lifetime: Duration) -> Self {
        Self {
            feed,
            cache_lifetime,
            snapshot: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            refresh_guard: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome, CatalogError> {
        let _guard = self.refresh_guard.lock().await;
        self.refresh_locked(force, Utc::now()).await
    }

    /// Like [`refresh`](Self::refresh) with an explicit clock reading.
    #[cfg(test)]
    pub async fn refresh_at(
        &self,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome, CatalogError> {
        let _guard = self.refresh_guard.lock().await;
        self.refresh_locked(force, now).await
    }

    async fn refresh_locked(
        &self,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome, CatalogError> {
        let current = self.snapshot();

        if !force {
            if let Some(age) = current.age(now) {
                if age < self.cache_lifetime {
                    log::debug!(
                        "Catalog is {}s old, skipping fetch",
                        age.num_seconds()
                    );
                    return Ok(RefreshOutcome::Cached {
                        entries: current.len(),
                        age,
                    });
                }
            }
        }

        match self.fetch_snapshot(now).await {
            Ok((snapshot, skipped)) => {
                let entries = snapshot.len();
                self.replace(snapshot);
                log::info!(
                    "Updated catalog from {}: {} objects, {} skipped",
                    self.feed.describe(),
                    entries,
                    skipped.len()
                );
                Ok(RefreshOutcome::Refreshed { entries, skipped })
            }
            Err(error) if current.captured_at().is_some() => {
                log::warn!(
                    "Catalog refresh failed, serving {} cached objects: {}",
                    current.len(),
                    error
                );
                Ok(RefreshOutcome::Stale {
                    entries: current.len(),
                    error,
                })
            }
            Err(error) => {
                log::error!("Catalog refresh failed with no cached data: {}", error);
                Err(error)
            }
        }
    }

    async fn fetch_snapshot(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(CatalogSnapshot, Vec<CatalogParseError>), CatalogError> {
        let content = self.feed.fetch().await?;
        let parsed = parse_feed(&content);

        if parsed.entries.is_empty() {
            return Err(CatalogError::NoValidEntries {
                skipped: parsed.skipped.len(),
            });
        }

        Ok((CatalogSnapshot::new(parsed.entries, now), parsed.skipped))
    }

    fn replace(&self, snapshot: CatalogSnapshot) {
        let mut slot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::new(snapshot);
    }
}
