use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{CatalogError, CatalogManager, CatalogSnapshot, FeedSource, RefreshOutcome};
use crate::predict::{
    next_pass, visible_objects, Observer, PassError, PassEvent, PassSearch, SatellitePosition,
};
use crate::sky::{ReferenceError, SkyEngine, SkySnapshot};

/// Overview of the satellites above one station, centred on a focus object.
#[derive(Debug, Clone, Serialize)]
pub struct SatelliteSummary {
    pub timestamp: DateTime<Utc>,
    pub catalog_entries: usize,
    pub catalog_age_seconds: Option<i64>,
    pub overhead_count: usize,
    pub overhead: Vec<SatellitePosition>,
    pub focus_norad_id: u32,
    pub focus_overhead: bool,
    pub focus_position: Option<SatellitePosition>,
    pub focus_next_pass: Option<PassEvent>,
}

/// Ties the catalog, the predictor and the sky engine to one observer.
pub struct Tracker<F> {
    observer: Observer,
    catalog: CatalogManager<F>,
    passes: PassSearch,
    sky: SkyEngine,
    horizon_hours: f64,
}

impl<F: FeedSource> Tracker<F> {
    pub fn new(
        observer: Observer,
        catalog: CatalogManager<F>,
        passes: PassSearch,
        sky: SkyEngine,
        horizon_hours: f64,
    ) -> Self {
        Self {
            observer,
            catalog,
            passes,
            sky,
            horizon_hours,
        }
    }

    pub fn catalog(&self) -> Arc<CatalogSnapshot> {
        self.catalog.snapshot()
    }

    pub async fn refresh_catalog(&self, force: bool) -> Result<RefreshOutcome, CatalogError> {
        self.catalog.refresh(force).await
    }

    pub async fn visible_objects(
        &self,
        instant: DateTime<Utc>,
        min_elevation_deg: f64,
    ) -> Vec<SatellitePosition> {
        let sun = self.sun_position(instant).await;
        visible_objects(
            &self.catalog(),
            &self.observer,
            instant,
            min_elevation_deg,
            sun,
        )
    }

    /// Next pass within `horizon_hours`, or the configured horizon.
    pub fn next_pass(
        &self,
        norad_id: u32,
        start: DateTime<Utc>,
        horizon_hours: Option<f64>,
    ) -> Result<Option<PassEvent>, PassError> {
        next_pass(
            &self.passes,
            &self.catalog(),
            &self.observer,
            norad_id,
            start,
            horizon_hours.unwrap_or(self.horizon_hours),
        )
    }

    pub async fn sky_snapshot(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<SkySnapshot, ReferenceError> {
        self.sky.snapshot(&self.observer, instant).await
    }

    pub async fn satellite_summary(
        &self,
        focus_norad_id: u32,
        instant: DateTime<Utc>,
        min_elevation_deg: f64,
    ) -> SatelliteSummary {
        let snapshot = self.catalog();
        let overhead = self.visible_objects(instant, min_elevation_deg).await;
        let focus_position = overhead
            .iter()
            .find(|p| p.norad_id == focus_norad_id)
            .cloned();
        if let Some(position) = &focus_position {
            log::debug!(
                "{} is up at {:.1} deg, {}",
                position.name,
                position.elevation_deg,
                position.illumination
            );
        }

        let focus_next_pass = match self.next_pass(focus_norad_id, instant, None) {
            Ok(pass) => pass,
            Err(PassError::UnknownObject(_)) => None,
            Err(e) => {
                log::warn!("Pass search for {} failed: {}", focus_norad_id, e);
                None
            }
        };

        SatelliteSummary {
            timestamp: instant,
            catalog_entries: snapshot.len(),
            catalog_age_seconds: snapshot.age(instant).map(|age| age.num_seconds()),
            overhead_count: overhead.len(),
            focus_norad_id,
            focus_overhead: focus_position.is_some(),
            focus_position,
            focus_next_pass,
            overhead,
        }
    }

    async fn sun_position(&self, instant: DateTime<Utc>) -> Option<[f64; 3]> {
        let sun = self
            .sky
            .ephemeris()
            .await
            .and_then(|ephemeris| ephemeris.sun_position_km(instant));
        match sun {
            Ok(sun) => Some(sun),
            Err(e) => {
                log::warn!("No sun position, illumination unknown: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{iss_feed, ISS_NAME};
    use crate::catalog::{parse_feed, StubFeed, DEFAULT_CACHE_LIFETIME};
    use crate::predict::{gmst_rad, inertial_to_ecef, propagate, Illumination};
    use crate::sky::EphemerisSource;
    use chrono::TimeZone;
    use std::path::PathBuf;

    const ISS: u32 = 25544;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn tracker(observer: Observer, source: EphemerisSource) -> Tracker<StubFeed> {
        Tracker::new(
            observer,
            CatalogManager::new(StubFeed::new(vec![Some(iss_feed())]), DEFAULT_CACHE_LIFETIME),
            PassSearch::default(),
            SkyEngine::new(source),
            24.0,
        )
    }

    /// Observer standing under the object at epoch.
    fn subpoint_observer() -> Observer {
        let parsed = parse_feed(&iss_feed());
        let entry = &parsed.entries[0];
        let topo = propagate(entry, &Observer::default(), epoch()).unwrap();
        let ecef = inertial_to_ecef(topo.inertial_km, gmst_rad(epoch()));
        let lat = ecef[2].atan2((ecef[0] * ecef[0] + ecef[1] * ecef[1]).sqrt());
        let lon = ecef[1].atan2(ecef[0]);
        Observer::new(lat.to_degrees(), lon.to_degrees(), 0.0)
    }

    #[tokio::test]
    async fn empty_until_refreshed() {
        let tracker = tracker(Observer::default(), EphemerisSource::Builtin);
        assert!(tracker.catalog().is_empty());
        assert!(tracker.visible_objects(epoch(), 0.0).await.is_empty());
        assert!(matches!(
            tracker.next_pass(ISS, epoch(), None),
            Err(PassError::UnknownObject(ISS))
        ));

        tracker.refresh_catalog(false).await.unwrap();
        assert_eq!(tracker.catalog().len(), 1);
    }

    #[tokio::test]
    async fn summary_reports_focus_object_overhead() {
        let observer = subpoint_observer();
        let tracker = tracker(observer, EphemerisSource::Builtin);
        tracker.refresh_catalog(false).await.unwrap();

        let summary = tracker.satellite_summary(ISS, epoch(), 10.0).await;
        assert_eq!(summary.catalog_entries, 1);
        assert_eq!(summary.overhead_count, 1);
        assert!(summary.focus_overhead);
        let position = summary.focus_position.unwrap();
        assert_eq!(position.name, ISS_NAME);
        assert!(position.elevation_deg > 80.0);
        assert_ne!(position.illumination, Illumination::Unknown);
    }

    #[tokio::test]
    async fn unknown_focus_object_is_not_an_error() {
        let tracker = tracker(Observer::new(40.0, -75.0, 0.0), EphemerisSource::Builtin);
        tracker.refresh_catalog(false).await.unwrap();

        let summary = tracker.satellite_summary(99999, epoch(), 0.0).await;
        assert!(!summary.focus_overhead);
        assert!(summary.focus_position.is_none());
        assert!(summary.focus_next_pass.is_none());
    }

    #[tokio::test]
    async fn missing_reference_data_leaves_illumination_unknown() {
        let observer = subpoint_observer();
        let tracker = tracker(
            observer,
            EphemerisSource::Table(PathBuf::from("/nonexistent/sky.eph")),
        );
        tracker.refresh_catalog(false).await.unwrap();

        let visible = tracker.visible_objects(epoch(), 0.0).await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].illumination, Illumination::Unknown);
        assert!(matches!(
            tracker.sky_snapshot(epoch()).await,
            Err(ReferenceError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn configured_horizon_is_the_default() {
        let tracker = tracker(Observer::new(40.0, -75.0, 0.0), EphemerisSource::Builtin);
        tracker.refresh_catalog(false).await.unwrap();

        assert!(matches!(
            tracker.next_pass(ISS, epoch(), Some(0.0)),
            Err(PassError::InvalidHorizon { .. })
        ));
        let pass = tracker.next_pass(ISS, epoch(), Some(48.0)).unwrap().unwrap();
        assert!(pass.rise >= epoch());
        assert!(pass.rise <= pass.peak_time && pass.peak_time <= pass.set);
    }
}
