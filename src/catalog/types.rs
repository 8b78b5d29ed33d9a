use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sgp4::{Constants, Elements};

use crate::catalog::error::{CatalogError, CatalogParseError};

/// Orbital elements of one tracked object, parsed once and never mutated.
pub struct OrbitalElements {
    pub norad_id: u32,
    pub name: String,
    #[allow(dead_code)]
    pub line1: String,
    #[allow(dead_code)]
    pub line2: String,
    pub elements: Elements,
    pub constants: Constants,
}

impl fmt::Debug for OrbitalElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalElements")
            .field("norad_id", &self.norad_id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An immutable view of the catalog, keyed by catalog identifier.
#[derive(Debug)]
pub struct CatalogSnapshot {
    entries: HashMap<u32, OrbitalElements>,
    captured_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            captured_at: None,
        }
    }

    pub fn new(entries: Vec<OrbitalElements>, captured_at: DateTime<Utc>) -> Self {
        let entries = entries.into_iter().map(|e| (e.norad_id, e)).collect();
        Self {
            entries,
            captured_at: Some(captured_at),
        }
    }

    pub fn get(&self, norad_id: u32) -> Option<&OrbitalElements> {
        self.entries.get(&norad_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &OrbitalElements> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` until the first successful refresh.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.captured_at.map(|t| now - t)
    }
}

/// What a call to `refresh` did.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// Snapshot was younger than the cache lifetime; no fetch happened.
    Cached { entries: usize, age: Duration },
    /// A new snapshot replaced the old one.
    Refreshed {
        entries: usize,
        skipped: Vec<CatalogParseError>,
    },
    /// The refresh failed but an older snapshot is still being served.
    Stale {
        entries: usize,
        error: CatalogError,
    },
}

impl RefreshOutcome {
    pub fn entries(&self) -> usize {
        match self {
            RefreshOutcome::Cached { entries, .. }
            | RefreshOutcome::Refreshed { entries, .. }
            | RefreshOutcome::Stale { entries, .. } => *entries,
        }
    }

    #[cfg(test)]
    pub fn is_stale(&self) -> bool {
        matches!(self, RefreshOutcome::Stale { .. })
    }

    pub fn report(&self) -> RefreshReport {
        let mut report = RefreshReport {
            status: "cached",
            entries: self.entries(),
            age_seconds: None,
            skipped: Vec::new(),
            warning: None,
        };
        match self {
            RefreshOutcome::Cached { age, .. } => report.age_seconds = Some(age.num_seconds()),
            RefreshOutcome::Refreshed { skipped, .. } => {
                report.status = "refreshed";
                report.skipped = skipped.iter().map(ToString::to_string).collect();
            }
            RefreshOutcome::Stale { error, .. } => {
                report.status = "stale";
                report.warning = Some(error.to_string());
            }
        }
        report
    }
}

/// Serializable summary of a refresh, for the command line.
#[derive(Debug, Serialize)]
pub struct RefreshReport {
    pub status: &'static str,
    pub entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
