//! Folding per-file datasets into one.
//!
//! Files of a campaign are merged in lexical file name order. The merge
//! concatenates along the time axis; channels that exist on one side only are
//! carried over with NaN rows for the other side, so every channel keeps one
//! row per timestamp.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lidar_common::{ChannelArray, Dataset, DatasetParts, FailurePolicy};
use tracing::{debug, warn};

use crate::error::{ProcessingError, Result};

/// Sort paths into merge order: lexical by file name, then by full path.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
}

/// Merge two optional datasets, `a` first.
///
/// `None` is the identity on either side. Fails with
/// [`ProcessingError::MergeInconsistency`] when the altitude grids differ in
/// length.
pub fn merge(a: Option<Dataset>, b: Option<Dataset>) -> Result<Option<Dataset>> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(a), None) => Ok(Some(a)),
        (None, Some(b)) => Ok(Some(b)),
        (Some(a), Some(b)) => concat(a, b).map(Some),
    }
}

/// Left fold of [`merge`] over datasets already in merge order.
pub fn merge_all<I>(datasets: I) -> Result<Option<Dataset>>
where
    I: IntoIterator<Item = Dataset>,
{
    let mut acc = None;
    for dataset in datasets {
        acc = merge(acc, Some(dataset))?;
    }
    Ok(acc)
}

/// Load every file with `load` in merge order and fold the results.
///
/// With [`FailurePolicy::Skip`] a file that fails to load is logged and left
/// out; otherwise its error is returned. `Ok(None)` means no file produced a
/// dataset.
pub fn merge_files<E, F>(
    mut paths: Vec<PathBuf>,
    policy: FailurePolicy,
    mut load: F,
) -> std::result::Result<Option<Dataset>, E>
where
    F: FnMut(&Path) -> std::result::Result<Dataset, E>,
    E: From<ProcessingError> + Display,
{
    sort_paths(&mut paths);
    let mut acc = None;
    for path in &paths {
        match load(path) {
            Ok(dataset) => {
                debug!(path = %path.display(), profiles = dataset.n_profiles(), "Merging file");
                acc = merge(acc, Some(dataset))?;
            }
            Err(e) if policy == FailurePolicy::Skip => {
                warn!(path = %path.display(), error = %e, "Skipping file that failed to decode");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(acc)
}

fn check_altitude(a: &Dataset, b: &Dataset) -> Result<()> {
    if a.n_bins() != b.n_bins() {
        return Err(ProcessingError::merge_inconsistency(format!(
            "altitude grids differ: {} bins vs {} bins",
            a.n_bins(),
            b.n_bins()
        )));
    }
    Ok(())
}

fn concat(a: Dataset, b: Dataset) -> Result<Dataset> {
    check_altitude(&a, &b)?;

    let n_bins = a.n_bins();
    let a_rows = a.n_profiles();
    let b_rows = b.n_profiles();

    let mut a = a.into_parts();
    let b = b.into_parts();

    let mut b_channels = b.channels;
    let mut channels = BTreeMap::new();

    for (name, mut data) in std::mem::take(&mut a.channels) {
        match b_channels.remove(&name) {
            Some(other) => {
                if other.n_bins() != data.n_bins() {
                    return Err(ProcessingError::merge_inconsistency(format!(
                        "channel '{}' has {} bins in one file and {} in the next",
                        name,
                        data.n_bins(),
                        other.n_bins()
                    )));
                }
                data.append(other)?;
            }
            None => data.push_nan_rows(b_rows),
        }
        channels.insert(name, data);
    }

    for (name, data) in b_channels {
        debug!(channel = %name, rows = a_rows, "Channel absent from earlier files, padding");
        let mut padded = ChannelArray::filled(a_rows, n_bins, f32::NAN);
        padded.append(data)?;
        channels.insert(name, padded);
    }

    let mut timestamps = a.timestamps;
    timestamps.extend(b.timestamps);

    Ok(Dataset::from_parts(DatasetParts {
        timestamps,
        altitude: a.altitude,
        channels,
        date: a.date.min(b.date),
        format: a.format,
        has_ratio: a.has_ratio || b.has_ratio,
    })?)
}

/// How often each timestamp occurs.
fn occurrences(timestamps: &[DateTime<Utc>]) -> BTreeMap<DateTime<Utc>, usize> {
    let mut counts = BTreeMap::new();
    for &t in timestamps {
        *counts.entry(t).or_default() += 1;
    }
    counts
}

/// Combine two datasets that observe the same period with different channel
/// sets, such as the two telescopes of the binary instrument.
///
/// Profiles are aligned on equal timestamps. The result carries the sorted
/// union of both time axes; a channel has NaN rows at the timestamps its side
/// did not record. A timestamp repeated within one side is aligned by
/// occurrence: its k-th profile on each side shares a row. Channel names must
/// be disjoint.
pub fn join_on_time(a: Option<Dataset>, b: Option<Dataset>) -> Result<Option<Dataset>> {
    let (a, b) = match (a, b) {
        (None, None) => return Ok(None),
        (Some(a), None) => return Ok(Some(a)),
        (None, Some(b)) => return Ok(Some(b)),
        (Some(a), Some(b)) => (a, b),
    };
    check_altitude(&a, &b)?;

    if let Some(name) = a.channels().keys().find(|k| b.channels().contains_key(*k)) {
        return Err(ProcessingError::merge_inconsistency(format!(
            "channel '{}' present on both sides of a time join",
            name
        )));
    }

    // a timestamp repeated within one side (overlapping files) keeps one
    // timeline slot per occurrence
    let mut counts: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    for side in [&a, &b] {
        for (t, n) in occurrences(side.timestamps()) {
            let slot = counts.entry(t).or_default();
            *slot = (*slot).max(n);
        }
    }
    let repeated = counts.values().filter(|&&n| n > 1).count();
    if repeated > 0 {
        warn!(repeated, "Repeated timestamps in a time join, aligning by occurrence");
    }
    let timeline: Vec<DateTime<Utc>> = counts
        .into_iter()
        .flat_map(|(t, n)| std::iter::repeat(t).take(n))
        .collect();

    let n_bins = a.n_bins();
    let a = a.into_parts();
    let b = b.into_parts();
    let mut channels = BTreeMap::new();

    for side in [&a, &b] {
        let mut seen: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
        let slots: Vec<usize> = side
            .timestamps
            .iter()
            .map(|t| {
                let nth = seen.entry(*t).or_default();
                let slot = timeline.partition_point(|x| x < t) + *nth;
                *nth += 1;
                slot
            })
            .collect();
        for (name, data) in &side.channels {
            let mut aligned = ChannelArray::filled(timeline.len(), n_bins, f32::NAN);
            for (row, &slot) in slots.iter().enumerate() {
                if let (Some(src), Some(dst)) = (data.row(row), aligned.row_mut(slot)) {
                    dst.copy_from_slice(src);
                }
            }
            channels.insert(name.clone(), aligned);
        }
    }

    debug!(
        profiles = timeline.len(),
        channels = channels.len(),
        "Joined datasets on time"
    );

    Ok(Some(Dataset::from_parts(DatasetParts {
        timestamps: timeline,
        altitude: a.altitude,
        channels,
        date: a.date.min(b.date),
        format: a.format,
        has_ratio: a.has_ratio || b.has_ratio,
    })?))
}
