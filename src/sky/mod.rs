mod engine;
mod ephemeris;
mod error;
mod reference;
mod snapshot;
mod table;

pub use engine::SkyEngine;
pub use ephemeris::EphemerisSource;
pub use error::ReferenceError;
pub use snapshot::SkySnapshot;
pub use table::EphemerisTable;
