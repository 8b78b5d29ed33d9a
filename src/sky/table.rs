//! Binary sun/moon position table.
//!
//! Layout, little endian:
//!
//! ```text
//! magic      8 bytes  "SKYEPH01"
//! start      i64      unix seconds of the first sample
//! step       u32      seconds between samples
//! count      u32      number of samples (>= 2)
//! samples    count * 6 * f64   sun x y z, moon x y z (km)
//! ```

use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use crate::sky::ephemeris::{moon_position_km, sun_position_km};
use crate::sky::error::ReferenceError;

const MAGIC: &[u8; 8] = b"SKYEPH01";
const HEADER_LEN: usize = 24;
const SAMPLE_LEN: usize = 6 * 8;

pub type Sample = [f64; 6];

#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisTable {
    start: DateTime<Utc>,
    step_seconds: u32,
    end: DateTime<Utc>,
    samples: Vec<Sample>,
}

impl EphemerisTable {
    /// Sample the built-in series every `step_seconds` from `start`.
    pub fn from_builtin(
        start: DateTime<Utc>,
        step_seconds: u32,
        count: u32,
    ) -> Result<Self, ReferenceError> {
        if step_seconds == 0 || count < 2 {
            return Err(ReferenceError::Corrupt(
                "a table needs a positive step and at least two samples".into(),
            ));
        }
        let end = sample_time(start, step_seconds, count - 1)
            .ok_or_else(|| ReferenceError::Corrupt("table span overflows".into()))?;
        let samples = (0..count)
            .map(|i| {
                let t = sample_time(start, step_seconds, i).unwrap_or(end);
                let sun = sun_position_km(t);
                let moon = moon_position_km(t);
                [sun[0], sun[1], sun[2], moon[0], moon[1], moon[2]]
            })
            .collect();
        Ok(Self {
            start,
            step_seconds,
            end,
            samples,
        })
    }

    pub fn read(path: &Path) -> Result<Self, ReferenceError> {
        let bytes = std::fs::read(path).map_err(|source| ReferenceError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReferenceError> {
        let corrupt = |msg: String| ReferenceError::Corrupt(msg);

        if bytes.len() < HEADER_LEN {
            return Err(corrupt(format!("{} bytes is shorter than the header", bytes.len())));
        }
        if &bytes[..8] != MAGIC {
            return Err(corrupt("bad magic".into()));
        }

        let start_secs = i64::from_le_bytes(le_array(&bytes[8..16]));
        let step_seconds = u32::from_le_bytes(le_array(&bytes[16..20]));
        let count = u32::from_le_bytes(le_array(&bytes[20..24]));

        if step_seconds == 0 {
            return Err(corrupt("zero step".into()));
        }
        if count < 2 {
            return Err(corrupt(format!("{} samples, need at least 2", count)));
        }
        let expected = (count as usize)
            .checked_mul(SAMPLE_LEN)
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| corrupt("sample count overflows".into()))?;
        if bytes.len() != expected {
            return Err(corrupt(format!(
                "expected {} bytes for {} samples, found {}",
                expected,
                count,
                bytes.len()
            )));
        }

        let start = DateTime::from_timestamp(start_secs, 0)
            .ok_or_else(|| corrupt(format!("start {} out of range", start_secs)))?;
        let end = sample_time(start, step_seconds, count - 1).ok_or_else(|| {
            corrupt(format!(
                "{} samples every {}s overflow the time range",
                count, step_seconds
            ))
        })?;

        let mut samples = Vec::with_capacity(count as usize);
        for chunk in bytes[HEADER_LEN..].chunks_exact(SAMPLE_LEN) {
            let mut sample = [0.0; 6];
            for (value, raw) in sample.iter_mut().zip(chunk.chunks_exact(8)) {
                *value = f64::from_le_bytes(le_array(raw));
            }
            if !sample.iter().all(|v| v.is_finite()) {
                return Err(corrupt("non-finite sample".into()));
            }
            samples.push(sample);
        }

        Ok(Self {
            start,
            step_seconds,
            end,
            samples,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.samples.len() * SAMPLE_LEN);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.start.timestamp().to_le_bytes());
        out.extend_from_slice(&self.step_seconds.to_le_bytes());
        out.extend_from_slice(&(self.samples.len() as u32).to_le_bytes());
        for sample in &self.samples {
            for value in sample {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Linear interpolation between the two samples around `instant`.
    pub fn interpolate(&self, instant: DateTime<Utc>) -> Result<Sample, ReferenceError> {
        let (start, end) = (self.start(), self.end());
        if instant < start || instant > end {
            return Err(ReferenceError::OutOfRange {
                instant,
                start,
                end,
            });
        }

        let offset = (instant - start).num_milliseconds() as f64 / 1000.0;
        let position = offset / f64::from(self.step_seconds);
        let index = position.floor() as usize;
        if index >= self.samples.len() - 1 {
            return Ok(self.samples[self.samples.len() - 1]);
        }
        let frac = position - index as f64;

        let (a, b) = (&self.samples[index], &self.samples[index + 1]);
        let mut out = [0.0; 6];
        for i in 0..6 {
            out[i] = a[i] + (b[i] - a[i]) * frac;
        }
        Ok(out)
    }
}

/// Time of sample `index`, or `None` when it falls outside the representable range.
fn sample_time(start: DateTime<Utc>, step_seconds: u32, index: u32) -> Option<DateTime<Utc>> {
    let offset = i64::from(step_seconds).checked_mul(i64::from(index))?;
    start.checked_add_signed(Duration::try_seconds(offset)?)
}

fn le_array<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(raw);
    out
}
