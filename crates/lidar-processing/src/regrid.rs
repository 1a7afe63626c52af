//! Resampling of an irregular profile series onto a uniform time grid.
//!
//! The grid step is the spacing of the first two profiles. Each grid time is
//! matched to the nearest original profile within one step. The next
//! unconsumed profile is tried first and kept only while it is at least as
//! close as its neighbours; otherwise all profiles are searched. Grid times
//! with no profile within one step become NaN rows, which makes acquisition
//! gaps visible as gaps.

use chrono::{DateTime, Duration, Utc};
use lidar_common::{ChannelArray, Dataset, DatasetParts};
use tracing::{debug, warn};

use crate::error::Result;

/// Grid times and, for each, the index of the source profile (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct RegridPlan {
    pub step: Duration,
    pub grid: Vec<DateTime<Utc>>,
    pub matches: Vec<Option<usize>>,
}

impl RegridPlan {
    /// Grid times left without a source profile.
    pub fn gap_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_none()).count()
    }
}

fn abs_diff(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    let d = a - b;
    if d < Duration::zero() {
        -d
    } else {
        d
    }
}

/// Spacing between the first two profiles.
///
/// When those share a timestamp (or run backwards) the first positive
/// spacing further along is used instead. `None` if there is no positive
/// spacing at all.
pub fn nominal_step(timestamps: &[DateTime<Utc>]) -> Option<Duration> {
    timestamps
        .windows(2)
        .map(|w| w[1] - w[0])
        .find(|d| *d > Duration::zero())
}

/// Nearest profile to `target`; ties go to the earlier index.
fn nearest(timestamps: &[DateTime<Utc>], target: DateTime<Utc>) -> Option<(usize, Duration)> {
    let mut best: Option<(usize, Duration)> = None;
    for (i, &t) in timestamps.iter().enumerate() {
        let diff = abs_diff(t, target);
        if best.map_or(true, |(_, b)| diff < b) {
            best = Some((i, diff));
        }
    }
    best
}

/// No neighbour of `index` is strictly closer to `target`.
///
/// On a non-decreasing series this makes `index` a nearest profile, so a
/// gap or a repeated timestamp cannot shift the matching by one row.
fn is_local_nearest(timestamps: &[DateTime<Utc>], index: usize, target: DateTime<Utc>, diff: Duration) -> bool {
    let closer = |i: usize| timestamps.get(i).is_some_and(|&t| abs_diff(t, target) < diff);
    !(index.checked_sub(1).is_some_and(closer) || closer(index + 1))
}

/// Build the uniform grid and its profile matches.
///
/// Returns `None` when fewer than two profiles exist or no positive step
/// can be derived; such series are left as they are.
pub fn regrid_plan(timestamps: &[DateTime<Utc>]) -> Option<RegridPlan> {
    if timestamps.len() < 2 {
        return None;
    }
    let step = nominal_step(timestamps)?;
    if step != timestamps[1] - timestamps[0] {
        warn!(step = %step, "First profiles share a timestamp, using next positive spacing");
    }

    let start = timestamps[0];
    let end = timestamps.iter().copied().max()?;

    let mut grid = vec![start];
    let mut current = start;
    while current < end {
        current = current + step;
        grid.push(current);
    }

    let mut matches = Vec::with_capacity(grid.len());
    let mut next = 0usize;
    for &target in &grid {
        let sequential = timestamps
            .get(next)
            .map(|&t| (next, abs_diff(t, target)))
            .filter(|&(i, diff)| diff <= step && is_local_nearest(timestamps, i, target, diff));

        let (index, diff) = match sequential.or_else(|| nearest(timestamps, target)) {
            Some(found) => found,
            None => {
                matches.push(None);
                continue;
            }
        };
        next = index + 1;
        matches.push(if diff <= step { Some(index) } else { None });
    }

    Some(RegridPlan {
        step,
        grid,
        matches,
    })
}

/// Apply a plan to one channel.
fn resample(data: &ChannelArray, plan: &RegridPlan) -> Result<ChannelArray> {
    let mut out = ChannelArray::with_bins(data.n_bins());
    for matched in &plan.matches {
        match matched.and_then(|i| data.row(i)) {
            Some(row) => out.push_row(row)?,
            None => out.push_nan_rows(1),
        }
    }
    Ok(out)
}

/// Resample every channel of a dataset onto a uniform time grid.
pub fn regrid(dataset: Dataset) -> Result<Dataset> {
    let Some(plan) = regrid_plan(dataset.timestamps()) else {
        debug!(profiles = dataset.n_profiles(), "Nothing to regrid");
        return Ok(dataset);
    };

    let parts = dataset.into_parts();
    let mut channels = parts.channels;
    for data in channels.values_mut() {
        *data = resample(data, &plan)?;
    }

    debug!(
        original = parts.timestamps.len(),
        regridded = plan.grid.len(),
        gaps = plan.gap_count(),
        step_ms = plan.step.num_milliseconds(),
        "Regridded dataset"
    );

    Ok(Dataset::from_parts(DatasetParts {
        timestamps: plan.grid,
        channels,
        ..parts
    })?)
}
