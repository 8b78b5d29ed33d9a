use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::predict::{gmst_rad, look_angles, Observer};
use crate::sky::ephemeris::Ephemeris;
use crate::sky::error::ReferenceError;
use crate::sky::reference::{
    altitude_deg, BRIGHT_STARS, CONSTELLATIONS, MIN_ALTITUDE_DEG, MOON_MAGNITUDE,
};

const ASTRONOMICAL_NIGHT_DEG: f64 = -18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObjectKind {
    Moon,
    Star,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrightestObject {
    pub name: String,
    pub kind: ObjectKind,
    pub magnitude: f64,
    pub altitude_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkySnapshot {
    pub timestamp: DateTime<Utc>,
    pub sun_altitude_deg: f64,
    pub darkness_level: f64,
    pub astronomical_night: bool,
    pub good_stargazing: bool,
    pub visible_constellations: Vec<String>,
    /// `None` when nothing in the reference set is up.
    pub brightest_object: Option<BrightestObject>,
    /// `HH:MM`
    pub local_sidereal_time: String,
    pub local_sidereal_hours: f64,
}

/// Sky conditions for `observer` at `instant`.
pub fn sky_snapshot(
    ephemeris: &Ephemeris,
    observer: &Observer,
    instant: DateTime<Utc>,
) -> Result<SkySnapshot, ReferenceError> {
    let gmst = gmst_rad(instant);
    let sun = ephemeris.sun_position_km(instant)?;
    let moon = ephemeris.moon_position_km(instant)?;

    let (_, sun_altitude, _) = look_angles(observer, sun, gmst);
    let (_, moon_altitude, _) = look_angles(observer, moon, gmst);
    let lst = local_sidereal_hours(observer, instant);

    let snapshot = assemble(
        instant,
        observer.latitude_deg,
        sun_altitude,
        moon_altitude,
        lst,
    );
    if let Some(brightest) = &snapshot.brightest_object {
        log::debug!(
            "Brightest object: {} {} at {:.1} deg",
            brightest.kind,
            brightest.name,
            brightest.altitude_deg
        );
    }
    Ok(snapshot)
}

fn assemble(
    instant: DateTime<Utc>,
    latitude_deg: f64,
    sun_altitude_deg: f64,
    moon_altitude_deg: f64,
    lst_hours: f64,
) -> SkySnapshot {
    let darkness = darkness_level(sun_altitude_deg);
    let night = is_astronomical_night(sun_altitude_deg);

    let visible_constellations: Vec<String> = CONSTELLATIONS
        .iter()
        .filter(|c| {
            altitude_deg(lst_hours, c.ra_hours, c.dec_deg, latitude_deg) > MIN_ALTITUDE_DEG
        })
        .map(|c| c.name.to_string())
        .collect();

    SkySnapshot {
        timestamp: instant,
        sun_altitude_deg,
        darkness_level: darkness,
        astronomical_night: night,
        good_stargazing: night && darkness > 0.7 && visible_constellations.len() > 5,
        visible_constellations,
        brightest_object: brightest_object(lst_hours, latitude_deg, moon_altitude_deg),
        local_sidereal_time: format_sidereal(lst_hours),
        local_sidereal_hours: lst_hours,
    }
}

/// Stepped darkness scale, 0.0 for daylight up to 1.0 for full night.
pub fn darkness_level(sun_altitude_deg: f64) -> f64 {
    if sun_altitude_deg > 0.0 {
        0.0
    } else if sun_altitude_deg > -6.0 {
        0.3
    } else if sun_altitude_deg > -12.0 {
        0.6
    } else if sun_altitude_deg > ASTRONOMICAL_NIGHT_DEG {
        0.8
    } else {
        1.0
    }
}

pub fn is_astronomical_night(sun_altitude_deg: f64) -> bool {
    sun_altitude_deg <= ASTRONOMICAL_NIGHT_DEG
}

/// Local mean sidereal time in hours, `[0, 24)`.
pub fn local_sidereal_hours(observer: &Observer, instant: DateTime<Utc>) -> f64 {
    let degrees = (gmst_rad(instant).to_degrees() + observer.longitude_deg).rem_euclid(360.0);
    let hours = degrees / 15.0;
    if hours >= 24.0 {
        0.0
    } else {
        hours
    }
}

pub fn format_sidereal(hours: f64) -> String {
    let whole = hours.floor();
    let minutes = ((hours - whole) * 60.0).floor();
    format!("{:02}:{:02}", whole as u32, minutes as u32)
}

fn brightest_object(
    lst_hours: f64,
    latitude_deg: f64,
    moon_altitude_deg: f64,
) -> Option<BrightestObject> {
    let moon = (moon_altitude_deg > 0.0).then(|| BrightestObject {
        name: "Moon".to_string(),
        kind: ObjectKind::Moon,
        magnitude: MOON_MAGNITUDE,
        altitude_deg: moon_altitude_deg,
    });

    let stars = BRIGHT_STARS.iter().filter_map(|s| {
        let altitude = altitude_deg(lst_hours, s.ra_hours, s.dec_deg, latitude_deg);
        (altitude > MIN_ALTITUDE_DEG).then(|| BrightestObject {
            name: s.name.to_string(),
            kind: ObjectKind::Star,
            magnitude: s.magnitude,
            altitude_deg: altitude,
        })
    });

    moon.into_iter()
        .chain(stars)
        .min_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
}
