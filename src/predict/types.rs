use chrono::{DateTime, Utc};
use serde::Serialize;

/// Observer-relative position of an object at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Topocentric {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    /// Geocentric inertial (TEME) position, used for the shadow test.
    #[serde(skip)]
    pub inertial_km: [f64; 3],
}

/// Whether an object is lit by the sun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Illumination {
    Illuminated,
    Eclipsed,
    /// No sun position was available to decide.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatellitePosition {
    pub norad_id: u32,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub illumination: Illumination,
}

/// A predicted rise/set window.
///
/// `rise <= peak_time <= set`, and `peak_elevation_deg` is at least the
/// elevation at rise and at set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassEvent {
    pub norad_id: u32,
    pub name: String,
    pub rise: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub peak_time: DateTime<Utc>,
    pub peak_elevation_deg: f64,
    pub rise_azimuth_deg: f64,
    pub set_azimuth_deg: f64,
    pub duration_seconds: i64,
    /// Still above the horizon when the search horizon ended; `set` is the
    /// end of the horizon, not a real set.
    pub truncated: bool,
}
