//! Geocentric sun and moon positions.
//!
//! Vectors are in kilometres, referred to the mean equator and equinox of
//! date, which is close enough to TEME for shadow tests and to the frame
//! used for sidereal-time rotation.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::predict::EARTH_RADIUS_KM;
use crate::sky::error::ReferenceError;
use crate::sky::table::EphemerisTable;

const AU_KM: f64 = 149_597_870.7;
const DAYS_PER_CENTURY: f64 = 36_525.0;
const J2000_UNIX_MS: i64 = 946_728_000_000;

/// Where planetary reference data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum EphemerisSource {
    /// Low-precision analytic series, always available.
    Builtin,
    /// Binary table written by [`EphemerisTable::write`].
    Table(PathBuf),
}

impl EphemerisSource {
    /// Blocking; may read a large file.
    pub fn load(&self) -> Result<Ephemeris, ReferenceError> {
        match self {
            EphemerisSource::Builtin => Ok(Ephemeris::Analytic),
            EphemerisSource::Table(path) => EphemerisTable::read(path).map(Ephemeris::Table),
        }
    }
}

#[derive(Debug)]
pub enum Ephemeris {
    Analytic,
    Table(EphemerisTable),
}

impl Ephemeris {
    pub fn sun_position_km(&self, instant: DateTime<Utc>) -> Result<[f64; 3], ReferenceError> {
        match self {
            Ephemeris::Analytic => Ok(sun_position_km(instant)),
            Ephemeris::Table(table) => table.interpolate(instant).map(|s| [s[0], s[1], s[2]]),
        }
    }

    pub fn moon_position_km(&self, instant: DateTime<Utc>) -> Result<[f64; 3], ReferenceError> {
        match self {
            Ephemeris::Analytic => Ok(moon_position_km(instant)),
            Ephemeris::Table(table) => table.interpolate(instant).map(|s| [s[3], s[4], s[5]]),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Ephemeris::Analytic => "built-in analytic series".to_string(),
            Ephemeris::Table(table) => format!(
                "table of {} samples from {} to {}",
                table.len(),
                table.start(),
                table.end()
            ),
        }
    }
}

fn centuries_since_j2000(instant: DateTime<Utc>) -> f64 {
    let days = (instant.timestamp_millis() - J2000_UNIX_MS) as f64 / 86_400_000.0;
    days / DAYS_PER_CENTURY
}

fn mean_obliquity_rad(t: f64) -> f64 {
    (23.439_291 - 0.013_004_2 * t).to_radians()
}

fn ecliptic_to_equatorial(lon: f64, lat: f64, dist: f64, obliquity: f64) -> [f64; 3] {
    let (sin_lon, cos_lon) = lon.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_eps, cos_eps) = obliquity.sin_cos();

    let x = dist * cos_lat * cos_lon;
    let y = dist * cos_lat * sin_lon;
    let z = dist * sin_lat;
    [x, y * cos_eps - z * sin_eps, y * sin_eps + z * cos_eps]
}

/// Apparent solar position, good to about 0.01 degrees.
pub fn sun_position_km(instant: DateTime<Utc>) -> [f64; 3] {
    let t = centuries_since_j2000(instant);

    let l0 = 280.466_46 + 36_000.769_83 * t + 0.000_303_2 * t * t;
    let m = (357.529_11 + 35_999.050_29 * t - 0.000_153_7 * t * t).to_radians();
    let e = 0.016_708_634 - 0.000_042_037 * t - 0.000_000_126_7 * t * t;

    let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();

    let omega = (125.04 - 1_934.136 * t).to_radians();
    let lambda = (l0 + c - 0.005_69 - 0.004_78 * omega.sin()).to_radians();

    let true_anomaly = m + c.to_radians();
    let dist_au = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * true_anomaly.cos());

    ecliptic_to_equatorial(lambda, 0.0, dist_au * AU_KM, mean_obliquity_rad(t))
}

/// Lunar position from the truncated almanac series, good to a few tenths
/// of a degree.
pub fn moon_position_km(instant: DateTime<Utc>) -> [f64; 3] {
    let t = centuries_since_j2000(instant);
    let s = |a: f64, b: f64| (a + b * t).to_radians().sin();
    let c = |a: f64, b: f64| (a + b * t).to_radians().cos();

    let lambda = 218.32 + 481_267.881 * t + 6.29 * s(135.0, 477_198.87)
        - 1.27 * s(259.3, -413_335.36)
        + 0.66 * s(235.7, 890_534.22)
        + 0.21 * s(269.9, 954_397.74)
        - 0.19 * s(357.5, 35_999.05)
        - 0.11 * s(186.5, 966_404.03);

    let beta = 5.13 * s(93.3, 483_202.02) + 0.28 * s(228.2, 960_400.89)
        - 0.28 * s(318.3, 6_003.15)
        - 0.17 * s(217.6, -407_332.21);

    let parallax = 0.9508
        + 0.0518 * c(135.0, 477_198.87)
        + 0.0095 * c(259.3, -413_335.36)
        + 0.0078 * c(235.7, 890_534.22)
        + 0.0028 * c(269.9, 954_397.74);

    let dist_km = EARTH_RADIUS_KM / parallax.to_radians().sin();

    ecliptic_to_equatorial(
        lambda.to_radians(),
        beta.to_radians(),
        dist_km,
        mean_obliquity_rad(t),
    )
}
