use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("planetary reference data {path} could not be read: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("planetary reference data is corrupt: {0}")]
    Corrupt(String),
    #[error("{instant} is outside the planetary reference data span {start} to {end}")]
    OutOfRange {
        instant: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("planetary reference loader failed: {0}")]
    Loader(String),
}
