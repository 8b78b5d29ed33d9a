use chrono::{DateTime, Utc};

use crate::catalog::OrbitalElements;
use crate::predict::error::PropagationError;
use crate::predict::observer::Observer;
use crate::predict::types::{Illumination, Topocentric};

pub const EARTH_RADIUS_KM: f64 = 6378.137;

/// Position of `entry` as seen by `observer` at `instant`.
pub fn propagate(
    entry: &OrbitalElements,
    observer: &Observer,
    instant: DateTime<Utc>,
) -> Result<Topocentric, PropagationError> {
    let norad_id = entry.norad_id;
    let minutes = entry
        .elements
        .datetime_to_minutes_since_epoch(&instant.naive_utc())
        .map_err(|e| PropagationError::Epoch {
            norad_id,
            message: e.to_string(),
        })?;

    let prediction = entry
        .constants
        .propagate(minutes)
        .map_err(|e| PropagationError::Model {
            norad_id,
            message: e.to_string(),
        })?;

    if !prediction.position.iter().all(|v| v.is_finite()) {
        return Err(PropagationError::NonFinite { norad_id });
    }

    let (azimuth_deg, elevation_deg, range_km) =
        look_angles(observer, prediction.position, gmst_rad(instant));

    Ok(Topocentric {
        timestamp: instant,
        azimuth_deg,
        elevation_deg,
        range_km,
        inertial_km: prediction.position,
    })
}

/// Greenwich mean sidereal time in radians.
pub fn gmst_rad(instant: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&instant.naive_utc()))
}

/// Azimuth (deg, from north through east), elevation (deg) and range (km)
/// of a geocentric inertial position.
pub fn look_angles(observer: &Observer, inertial_km: [f64; 3], gmst: f64) -> (f64, f64, f64) {
    let target = inertial_to_ecef(inertial_km, gmst);
    let station = observer.position_ecef_km();

    let dr = [
        target[0] - station[0],
        target[1] - station[1],
        target[2] - station[2],
    ];
    let range_km = norm(dr);

    let (east, north, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    let azimuth = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation = if range_km > 0.0 {
        (up / range_km).clamp(-1.0, 1.0).asin().to_degrees()
    } else {
        90.0
    };

    (azimuth, elevation, range_km)
}

pub fn inertial_to_ecef(pos: [f64; 3], gmst: f64) -> [f64; 3] {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    [
        pos[0] * cos_gmst + pos[1] * sin_gmst,
        -pos[0] * sin_gmst + pos[1] * cos_gmst,
        pos[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Cylindrical Earth-shadow test.
///
/// Both vectors are geocentric and in the same inertial frame. Without a sun
/// position the answer is `Unknown`.
pub fn illumination(inertial_km: [f64; 3], sun_km: Option<[f64; 3]>) -> Illumination {
    let Some(sun) = sun_km else {
        return Illumination::Unknown;
    };
    let sun_dist = norm(sun);
    if !sun_dist.is_finite() || sun_dist <= 0.0 {
        return Illumination::Unknown;
    }

    let u = [sun[0] / sun_dist, sun[1] / sun_dist, sun[2] / sun_dist];
    let along = dot(inertial_km, u);
    if along >= 0.0 {
        return Illumination::Illuminated;
    }

    let perp = [
        inertial_km[0] - along * u[0],
        inertial_km[1] - along * u[1],
        inertial_km[2] - along * u[2],
    ];
    if norm(perp) < EARTH_RADIUS_KM {
        Illumination::Eclipsed
    } else {
        Illumination::Illuminated
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{fixtures, parse_feed};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn iss() -> OrbitalElements {
        parse_feed(&fixtures::iss_feed()).entries.remove(0)
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    /// Geocentric latitude/longitude of the point under the object.
    fn subpoint(entry: &OrbitalElements, instant: DateTime<Utc>) -> (f64, f64) {
        let minutes = entry
            .elements
            .datetime_to_minutes_since_epoch(&instant.naive_utc())
            .unwrap();
        let position = entry.constants.propagate(minutes).unwrap().position;
        let ecef = inertial_to_ecef(position, gmst_rad(instant));
        let lat = ecef[2].atan2((ecef[0] * ecef[0] + ecef[1] * ecef[1]).sqrt());
        let lon = ecef[1].atan2(ecef[0]);
        (lat.to_degrees(), lon.to_degrees())
    }

    #[test]
    fn object_is_overhead_at_its_subpoint() {
        let entry = iss();
        let (lat, lon) = subpoint(&entry, epoch());
        let observer = Observer::new(lat, lon, 0.0);

        let topo = propagate(&entry, &observer, epoch()).unwrap();
        assert!(topo.elevation_deg > 80.0, "elevation {}", topo.elevation_deg);
        assert!(
            (350.0..=500.0).contains(&topo.range_km),
            "range {}",
            topo.range_km
        );
    }

    #[test]
    fn object_south_of_observer_has_northern_azimuth() {
        let entry = iss();
        let (lat, lon) = subpoint(&entry, epoch());
        let observer = Observer::new(lat - 5.0, lon, 0.0);

        let topo = propagate(&entry, &observer, epoch()).unwrap();
        assert!(topo.elevation_deg > 0.0);
        assert!(
            topo.azimuth_deg < 10.0 || topo.azimuth_deg > 350.0,
            "azimuth {}",
            topo.azimuth_deg
        );
        assert!(
            (600.0..=900.0).contains(&topo.range_km),
            "range {}",
            topo.range_km
        );
    }

    #[test]
    fn object_is_below_horizon_on_far_side() {
        let entry = iss();
        let (lat, lon) = subpoint(&entry, epoch());
        let observer = Observer::new(-lat, lon + 180.0, 0.0);

        let topo = propagate(&entry, &observer, epoch()).unwrap();
        assert!(topo.elevation_deg < -60.0);
        assert!(topo.range_km > 12_000.0);
    }

    // Vallado's SGP4 verification object, near-earth branch like the ISS.
    const VALLADO_00005: &str = "TEME EXAMPLE
1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753
2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667
";

    fn vallado_00005() -> OrbitalElements {
        parse_feed(VALLADO_00005).entries.remove(0)
    }

    /// Epoch of the 00005 element set plus six hours.
    fn six_hours_after_epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 6, 28, 0, 50, 19).unwrap()
            + chrono::Duration::microseconds(733_571)
    }

    #[test]
    fn teme_position_matches_verification_vectors() {
        let entry = vallado_00005();
        let cases = [
            (
                six_hours_after_epoch(),
                [-7154.03120202, -3783.17682504, -3536.19412294],
            ),
            (
                six_hours_after_epoch() + chrono::Duration::hours(6),
                [-7134.59340119, 6531.68641334, 3260.27186483],
            ),
        ];
        for (instant, expected) in cases {
            let topo = propagate(&entry, &Observer::default(), instant).unwrap();
            for i in 0..3 {
                assert_relative_eq!(topo.inertial_km[i], expected[i], epsilon = 0.1);
            }
        }
    }

    #[test]
    fn gmst_matches_reference_epoch() {
        // 1992-08-20 12:14 UT1, 152.578787810 deg
        let instant = Utc.with_ymd_and_hms(1992, 8, 20, 12, 14, 0).unwrap();
        assert_relative_eq!(gmst_rad(instant).to_degrees(), 152.578787810, epsilon = 1e-4);
    }

    #[test]
    fn look_angles_match_reference_values() {
        // Reference values computed separately with IAU-82 GMST and WGS-84
        // geodetic station coordinates from the verification state above.
        let observer = Observer::new(-20.0, -71.0, 500.0);
        let topo = propagate(&vallado_00005(), &observer, six_hours_after_epoch()).unwrap();

        assert_relative_eq!(topo.azimuth_deg, 246.762, epsilon = 0.1);
        assert_relative_eq!(topo.elevation_deg, 56.221, epsilon = 0.1);
        assert_relative_eq!(topo.range_km, 2790.109, epsilon = 1.0);
    }

    #[test]
    fn enu_of_local_vertical_is_up() {
        let (e, n, u) = ecef_to_enu([0.0, 0.0, 1.0], 90f64.to_radians(), 0.0);
        assert_relative_eq!(e, 0.0, epsilon = 1e-12);
        assert_relative_eq!(n, 0.0, epsilon = 1e-12);
        assert_relative_eq!(u, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn shadow_test() {
        let sun = Some([1.5e8, 0.0, 0.0]);
        assert_eq!(
            illumination([7000.0, 0.0, 0.0], sun),
            Illumination::Illuminated
        );
        assert_eq!(
            illumination([-7000.0, 0.0, 0.0], sun),
            Illumination::Eclipsed
        );
        assert_eq!(
            illumination([-7000.0, 0.0, 7000.0], sun),
            Illumination::Illuminated
        );
        assert_eq!(illumination([-7000.0, 0.0, 0.0], None), Illumination::Unknown);
        assert_eq!(Illumination::Eclipsed.to_string(), "eclipsed");
    }
}
