use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::catalog::{CatalogSnapshot, OrbitalElements};
use crate::predict::error::PropagationError;
use crate::predict::observer::Observer;
use crate::predict::propagation::{illumination, propagate};
use crate::predict::types::SatellitePosition;

/// Every catalog object at or above `min_elevation_deg` at `instant`,
/// highest first.
///
/// Objects that fail to propagate are logged and left out. `sun_km` is the
/// geocentric sun vector for the shadow test; without it illumination is
/// reported as unknown.
pub fn visible_objects(
    snapshot: &CatalogSnapshot,
    observer: &Observer,
    instant: DateTime<Utc>,
    min_elevation_deg: f64,
    sun_km: Option<[f64; 3]>,
) -> Vec<SatellitePosition> {
    collect_visible(snapshot.entries(), min_elevation_deg, |entry| {
        locate(entry, observer, instant, sun_km)
    })
}

fn locate(
    entry: &OrbitalElements,
    observer: &Observer,
    instant: DateTime<Utc>,
    sun_km: Option<[f64; 3]>,
) -> Result<SatellitePosition, PropagationError> {
    let topo = propagate(entry, observer, instant)?;
    Ok(SatellitePosition {
        norad_id: entry.norad_id,
        name: entry.name.clone(),
        timestamp: instant,
        azimuth_deg: topo.azimuth_deg,
        elevation_deg: topo.elevation_deg,
        range_km: topo.range_km,
        illumination: illumination(topo.inertial_km, sun_km),
    })
}

fn collect_visible<T, F>(
    items: impl IntoIterator<Item = T>,
    min_elevation_deg: f64,
    mut locate: F,
) -> Vec<SatellitePosition>
where
    F: FnMut(T) -> Result<SatellitePosition, PropagationError>,
{
    let mut visible: Vec<SatellitePosition> = items
        .into_iter()
        .filter_map(|item| match locate(item) {
            Ok(position) => Some(position),
            Err(e) => {
                log::debug!("Skipping object in visibility scan: {}", e);
                None
            }
        })
        .filter(|p| p.elevation_deg >= min_elevation_deg)
        .collect();

    visible.sort_by(by_elevation_desc);
    visible
}

fn by_elevation_desc(a: &SatellitePosition, b: &SatellitePosition) -> Ordering {
    b.elevation_deg
        .total_cmp(&a.elevation_deg)
        .then(a.norad_id.cmp(&b.norad_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{fixtures, parse_feed};
    use crate::predict::types::Illumination;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn position(norad_id: u32, elevation_deg: f64) -> SatellitePosition {
        SatellitePosition {
            norad_id,
            name: format!("SAT-{}", norad_id),
            timestamp: instant(),
            azimuth_deg: 0.0,
            elevation_deg,
            range_km: 1000.0,
            illumination: Illumination::Unknown,
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let elevations = [(1, 9.999), (2, 10.0), (3, 10.001), (4, -5.0)];
        let visible = collect_visible(elevations, 10.0, |(id, el)| Ok(position(id, el)));
        let ids: Vec<_> = visible.iter().map(|p| p.norad_id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn results_are_highest_first() {
        let elevations = [(1, 5.0), (2, 45.0), (3, 12.0), (4, 45.0)];
        let visible = collect_visible(elevations, 0.0, |(id, el)| Ok(position(id, el)));
        let ids: Vec<_> = visible.iter().map(|p| p.norad_id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn failing_object_does_not_abort_scan() {
        let visible = collect_visible([1u32, 2, 3], 0.0, |id| {
            if id == 2 {
                Err(PropagationError::Model {
                    norad_id: id,
                    message: "decayed".into(),
                })
            } else {
                Ok(position(id, 20.0))
            }
        });
        let ids: Vec<_> = visible.iter().map(|p| p.norad_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn iss_overhead_scenario() {
        let parsed = parse_feed(&fixtures::iss_feed());
        let snapshot = CatalogSnapshot::new(parsed.entries, instant());
        let entry = snapshot.get(25544).unwrap();

        // Place the observer 2 degrees south of a point the object is
        // known to pass over, then check the sampler agrees with a direct
        // propagation.
        let reference = propagate(entry, &Observer::new(0.0, 0.0, 0.0), instant()).unwrap();
        let ecef = crate::predict::propagation::inertial_to_ecef(
            reference.inertial_km,
            crate::predict::propagation::gmst_rad(instant()),
        );
        let lat = ecef[2]
            .atan2((ecef[0] * ecef[0] + ecef[1] * ecef[1]).sqrt())
            .to_degrees();
        let lon = ecef[1].atan2(ecef[0]).to_degrees();
        let observer = Observer::new(lat - 2.0, lon, 0.0);

        let visible = visible_objects(&snapshot, &observer, instant(), 0.0, None);
        assert_eq!(visible.len(), 1);
        let iss = &visible[0];
        assert_eq!(iss.norad_id, 25544);
        assert_eq!(iss.name, fixtures::ISS_NAME);
        assert!(iss.elevation_deg > 45.0);
        assert!(iss.azimuth_deg < 10.0 || iss.azimuth_deg > 350.0);
        assert_eq!(iss.illumination, Illumination::Unknown);

        let direct = propagate(entry, &observer, instant()).unwrap();
        assert_eq!(iss.elevation_deg, direct.elevation_deg);
        assert_eq!(iss.range_km, direct.range_km);

        let far_side = Observer::new(-lat, lon + 180.0, 0.0);
        assert!(visible_objects(&snapshot, &far_side, instant(), 0.0, None).is_empty());
    }
}
