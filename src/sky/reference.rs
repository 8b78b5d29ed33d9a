//! Static star and constellation data.

use serde::Serialize;

/// Objects below this altitude are treated as lost in horizon haze.
pub const MIN_ALTITUDE_DEG: f64 = 10.0;

/// Apparent magnitude used for the Moon whenever it is up.
pub const MOON_MAGNITUDE: f64 = -12.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CelestialObject {
    pub name: &'static str,
    pub ra_hours: f64,
    pub dec_deg: f64,
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Constellation {
    pub name: &'static str,
    pub ra_hours: f64,
    pub dec_deg: f64,
}

pub const BRIGHT_STARS: &[CelestialObject] = &[
    star("Sirius", 6.7525, -16.7161, -1.46),
    star("Canopus", 6.3992, -52.6956, -0.74),
    star("Arcturus", 14.2610, 19.1824, -0.05),
    star("Vega", 18.6156, 38.7837, 0.03),
    star("Capella", 5.2782, 45.9980, 0.08),
    star("Rigel", 5.2423, -8.2016, 0.18),
    star("Procyon", 7.6550, 5.2249, 0.40),
    star("Betelgeuse", 5.9195, 7.4071, 0.45),
];

pub const CONSTELLATIONS: &[Constellation] = &[
    constellation("Orion", 5.5, 5.0),
    constellation("Ursa Major", 11.0, 50.0),
    constellation("Cassiopeia", 1.0, 60.0),
    constellation("Cygnus", 20.5, 45.0),
    constellation("Lyra", 18.8, 36.8),
    constellation("Scorpius", 16.9, -30.0),
    constellation("Leo", 10.7, 13.0),
    constellation("Taurus", 4.5, 16.5),
];

const fn star(name: &'static str, ra_hours: f64, dec_deg: f64, magnitude: f64) -> CelestialObject {
    CelestialObject {
        name,
        ra_hours,
        dec_deg,
        magnitude,
    }
}

const fn constellation(name: &'static str, ra_hours: f64, dec_deg: f64) -> Constellation {
    Constellation {
        name,
        ra_hours,
        dec_deg,
    }
}

/// Altitude of a fixed RA/Dec position for an observer at `latitude_deg`
/// when the local sidereal time is `lst_hours`.
pub fn altitude_deg(lst_hours: f64, ra_hours: f64, dec_deg: f64, latitude_deg: f64) -> f64 {
    let hour_angle = ((lst_hours - ra_hours) * 15.0).to_radians();
    let dec = dec_deg.to_radians();
    let lat = latitude_deg.to_radians();

    let sin_alt = dec.sin() * lat.sin() + dec.cos() * lat.cos() * hour_angle.cos();
    sin_alt.clamp(-1.0, 1.0).asin().to_degrees()
}
