mod error;
mod observer;
mod pass_finder;
mod propagation;
mod types;
mod visibility;

pub use error::PassError;
pub use observer::Observer;
pub use pass_finder::{horizon_from_hours, next_pass, PassSearch};
pub use propagation::{gmst_rad, look_angles, EARTH_RADIUS_KM};
pub use types::{PassEvent, SatellitePosition};
pub use visibility::visible_objects;

#[cfg(test)]
pub(crate) use propagation::{inertial_to_ecef, propagate};
#[cfg(test)]
pub(crate) use types::Illumination;
