//! Common helpers for lna-parser integration tests.

use std::path::{Path, PathBuf};

use test_utils::{vendor_names, LnaFileBuilder};

/// Samples per channel in generated campaign files.
pub const CAMPAIGN_BINS: usize = 20;

/// Write one hour of one-minute profiles for a telescope into `dir`.
///
/// Every sample holds the same count, so the corrected signal is zero.
pub fn write_hour_file(dir: &Path, system: i32, hour: i64) -> PathBuf {
    let tag = if system == 1 { "WF" } else { "NF" };
    let path = dir.join(format!("lna_0a_raw{}_20040319_{:02}.dat", tag, 8 + hour));
    LnaFileBuilder::new()
        .with_system(system)
        .with_channel(vendor_names::PARALLEL_532, CAMPAIGN_BINS)
        .with_channel(vendor_names::CROSSPOL_532, CAMPAIGN_BINS)
        .with_channel(vendor_names::IR_1064, CAMPAIGN_BINS)
        .with_minute_profiles(hour * 60, 60, |_, _| -5)
        .write_to(&path)
        .expect("write synthetic LNA file");
    path
}
