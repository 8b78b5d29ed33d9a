use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

use crate::predict::Observer;
use crate::sky::ephemeris::{Ephemeris, EphemerisSource};
use crate::sky::error::ReferenceError;
use crate::sky::snapshot::{sky_snapshot, SkySnapshot};

/// Loads planetary reference data on first use and keeps it for the life of
/// the process. A failed load is retried on the next call.
pub struct SkyEngine {
    source: EphemerisSource,
    ephemeris: OnceCell<Arc<Ephemeris>>,
}

impl SkyEngine {
    pub fn new(source: EphemerisSource) -> Self {
        Self {
            source,
            ephemeris: OnceCell::new(),
        }
    }

    pub async fn ephemeris(&self) -> Result<Arc<Ephemeris>, ReferenceError> {
        let ephemeris = self
            .ephemeris
            .get_or_try_init(|| async {
                let source = self.source.clone();
                let loaded = tokio::task::spawn_blocking(move || source.load())
                    .await
                    .map_err(|e| ReferenceError::Loader(e.to_string()))??;
                log::info!("planetary reference data loaded: {}", loaded.describe());
                Ok::<_, ReferenceError>(Arc::new(loaded))
            })
            .await?;
        Ok(ephemeris.clone())
    }

    /// Reference data if a previous call already loaded it.
    #[cfg(test)]
    pub fn loaded(&self) -> Option<Arc<Ephemeris>> {
        self.ephemeris.get().cloned()
    }

    pub async fn snapshot(
        &self,
        observer: &Observer,
        instant: DateTime<Utc>,
    ) -> Result<SkySnapshot, ReferenceError> {
        let ephemeris = self.ephemeris().await?;
        sky_snapshot(&ephemeris, observer, instant)
    }
}
