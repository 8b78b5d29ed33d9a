use chrono::{DateTime, Duration, Utc};

use crate::catalog::CatalogSnapshot;
use crate::predict::error::{PassError, PropagationError};
use crate::predict::observer::Observer;
use crate::predict::propagation::propagate;
use crate::predict::types::{PassEvent, Topocentric};

const DEFAULT_COARSE_STEP: Duration = Duration::minutes(6);
const DEFAULT_FINE_STEP: Duration = Duration::minutes(1);
const DEFAULT_RESOLUTION: Duration = Duration::seconds(1);
const HORIZON_ELEVATION: f64 = 0.0;

/// Longest search horizon accepted, in hours.
pub const MAX_HORIZON_HOURS: f64 = 24.0 * 366.0;

/// Step-and-bisect horizon crossing search.
///
/// A coarse scan finds the first sample above the horizon that follows one
/// at or below it, the crossing is bisected down to `resolution`, then the
/// pass is followed with `fine_step` samples until the object drops to the
/// horizon again. An object already up at the start is not reported; the
/// search waits for it to set and looks for the following rise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSearch {
    coarse_step: Duration,
    fine_step: Duration,
    resolution: Duration,
}

impl Default for PassSearch {
    fn default() -> Self {
        Self {
            coarse_step: DEFAULT_COARSE_STEP,
            fine_step: DEFAULT_FINE_STEP,
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

/// Raw result of a crossing search, before catalog data is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassWindow {
    pub rise: Topocentric,
    pub set: Topocentric,
    pub peak: Topocentric,
    pub truncated: bool,
}

impl PassSearch {
    pub fn new(
        coarse_step: Duration,
        fine_step: Duration,
        resolution: Duration,
    ) -> Result<Self, PassError> {
        let zero = Duration::zero();
        if coarse_step <= zero || fine_step <= zero || resolution <= zero {
            return Err(PassError::InvalidStep);
        }
        Ok(Self {
            coarse_step,
            fine_step,
            resolution,
        })
    }

    /// Upper bound on elevation evaluations for one search over `horizon`.
    pub fn evaluation_limit(&self, horizon: Duration) -> usize {
        let coarse = steps_to_cover(horizon, self.coarse_step) + 1;
        let fine = steps_to_cover(horizon, self.fine_step);
        let rise_bisection = bisection_steps(self.coarse_step, self.resolution);
        let set_bisection = bisection_steps(self.fine_step, self.resolution);
        coarse + fine + rise_bisection + set_bisection
    }

    /// Find the first pass that rises within `horizon` of `start`.
    ///
    /// `sample` is called at most [`evaluation_limit`](Self::evaluation_limit)
    /// times.
    pub fn find<F>(
        &self,
        start: DateTime<Utc>,
        horizon: Duration,
        sample: F,
    ) -> Result<Option<PassWindow>, PassError>
    where
        F: FnMut(DateTime<Utc>) -> Result<Topocentric, PropagationError>,
    {
        let end = start + horizon;
        let mut sampler = Budget::new(self.evaluation_limit(horizon), sample);

        let Some((below, above)) = self.scan_for_rise(&mut sampler, start, end)? else {
            return Ok(None);
        };
        let rise = self.bisect(&mut sampler, below, above)?;
        let (set, peak, truncated) = self.follow_pass(&mut sampler, rise, end)?;

        Ok(Some(PassWindow {
            rise,
            set,
            peak,
            truncated,
        }))
    }

    fn scan_for_rise<F>(
        &self,
        sampler: &mut Budget<F>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<(Topocentric, Topocentric)>, PassError>
    where
        F: FnMut(DateTime<Utc>) -> Result<Topocentric, PropagationError>,
    {
        let mut prev = sampler.sample(start)?;

        while prev.timestamp < end {
            let next_time = (prev.timestamp + self.coarse_step).min(end);
            let next = sampler.sample(next_time)?;
            if !is_up(&prev) && is_up(&next) {
                return Ok(Some((prev, next)));
            }
            prev = next;
        }

        Ok(None)
    }

    /// Track the pass from `rise` until it sets or the horizon ends.
    fn follow_pass<F>(
        &self,
        sampler: &mut Budget<F>,
        rise: Topocentric,
        end: DateTime<Utc>,
    ) -> Result<(Topocentric, Topocentric, bool), PassError>
    where
        F: FnMut(DateTime<Utc>) -> Result<Topocentric, PropagationError>,
    {
        let mut peak = rise;
        let mut last_up = rise;

        while last_up.timestamp < end {
            let next_time = (last_up.timestamp + self.fine_step).min(end);
            let next = sampler.sample(next_time)?;
            if !is_up(&next) {
                let set = self.bisect(sampler, next, last_up)?;
                return Ok((set, peak, false));
            }
            if next.elevation_deg > peak.elevation_deg {
                peak = next;
            }
            last_up = next;
        }

        Ok((last_up, peak, true))
    }

    /// Narrow a horizon crossing between two samples on opposite sides.
    ///
    /// Returns the first sample after the crossing, in time order: the
    /// first one up for a rise, the first one down for a set.
    fn bisect<F>(
        &self,
        sampler: &mut Budget<F>,
        down: Topocentric,
        up: Topocentric,
    ) -> Result<Topocentric, PassError>
    where
        F: FnMut(DateTime<Utc>) -> Result<Topocentric, PropagationError>,
    {
        let rising = down.timestamp < up.timestamp;
        let (mut low, mut high) = if rising { (down, up) } else { (up, down) };

        while high.timestamp - low.timestamp > self.resolution {
            let mid_time = low.timestamp + (high.timestamp - low.timestamp) / 2;
            let mid = sampler.sample(mid_time)?;
            if is_up(&mid) == is_up(&high) {
                high = mid;
            } else {
                low = mid;
            }
        }

        Ok(high)
    }
}

/// Next pass of `norad_id` starting within `horizon_hours` of `start`.
pub fn next_pass(
    search: &PassSearch,
    snapshot: &CatalogSnapshot,
    observer: &Observer,
    norad_id: u32,
    start: DateTime<Utc>,
    horizon_hours: f64,
) -> Result<Option<PassEvent>, PassError> {
    let horizon = horizon_from_hours(horizon_hours)?;
    let entry = snapshot
        .get(norad_id)
        .ok_or(PassError::UnknownObject(norad_id))?;

    let window = search.find(start, horizon, |t| propagate(entry, observer, t))?;

    Ok(window.map(|w| PassEvent {
        norad_id,
        name: entry.name.clone(),
        rise: w.rise.timestamp,
        set: w.set.timestamp,
        peak_time: w.peak.timestamp,
        peak_elevation_deg: w.peak.elevation_deg,
        rise_azimuth_deg: w.rise.azimuth_deg,
        set_azimuth_deg: w.set.azimuth_deg,
        duration_seconds: (w.set.timestamp - w.rise.timestamp).num_seconds(),
        truncated: w.truncated,
    }))
}

pub fn horizon_from_hours(hours: f64) -> Result<Duration, PassError> {
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_HORIZON_HOURS {
        return Err(PassError::InvalidHorizon {
            hours,
            max: MAX_HORIZON_HOURS,
        });
    }
    Ok(Duration::milliseconds((hours * 3_600_000.0).round() as i64))
}

fn is_up(sample: &Topocentric) -> bool {
    sample.elevation_deg > HORIZON_ELEVATION
}

fn steps_to_cover(span: Duration, step: Duration) -> usize {
    let span = span.num_milliseconds().max(0) as u128;
    let step = step.num_milliseconds().max(1) as u128;
    span.div_ceil(step) as usize
}

/// Halvings needed to shrink `span` to `resolution`, rounding each half up.
fn bisection_steps(span: Duration, resolution: Duration) -> usize {
    let resolution = resolution.num_milliseconds().max(1);
    let mut span = span.num_milliseconds();
    let mut steps = 0;
    while span > resolution {
        span = span - span / 2;
        steps += 1;
    }
    steps
}

/// Wraps the sampling closure and refuses to go past a fixed number of calls.
struct Budget<F> {
    sample: F,
    remaining: usize,
    limit: usize,
}

impl<F> Budget<F>
where
    F: FnMut(DateTime<Utc>) -> Result<Topocentric, PropagationError>,
{
    fn new(limit: usize, sample: F) -> Self {
        Self {
            sample,
            remaining: limit,
            limit,
        }
    }

    fn sample(&mut self, t: DateTime<Utc>) -> Result<Topocentric, PassError> {
        if self.remaining == 0 {
            return Err(PassError::BudgetExhausted { limit: self.limit });
        }
        self.remaining -= 1;
        Ok((self.sample)(t)?)
    }
}
