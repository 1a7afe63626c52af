//! Whole-file and folder decoding of LNA binary data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lidar_common::{
    fallback_date, list_files, ChannelArray, Dataset, FailurePolicy, FormatTag, Fov, RawProfile,
};
use lidar_processing::{join_on_time, merge_files, ChannelProcessor};
use tracing::{debug, info, warn};

use crate::error::{LnaError, LnaResult};
use crate::naming::{color_ratio_name, depolarization_name, ChannelRole};
use crate::sections::{
    parse_header, parse_noise_profile, parse_preamble, parse_profile, AcquisitionHeader,
    FieldReader, RawCounts,
};

/// File name prefix of binary files.
pub const FILE_PREFIX: &str = "lna_0a_raw";

/// File name extension of binary files.
pub const FILE_EXTENSION: &str = ".dat";

/// A binary file as stored, before any correction.
#[derive(Debug, Clone)]
pub struct LnaFile {
    pub header: AcquisitionHeader,
    /// Noise profile counts, one vector per header channel.
    pub noise: Vec<Vec<i16>>,
    pub profiles: Vec<RawCounts>,
}

impl LnaFile {
    /// Parse a complete file held in memory.
    pub fn parse(data: &[u8]) -> LnaResult<Self> {
        let offset = parse_preamble(data)?;
        let mut reader = FieldReader::new(&data[offset..]);

        let header = parse_header(&mut reader)?;
        let noise = parse_noise_profile(&mut reader, &header)?;

        let mut profiles = Vec::with_capacity(header.profile_count);
        for index in 0..header.profile_count {
            profiles.push(parse_profile(&mut reader, &header, index)?);
        }

        if reader.remaining() > 0 {
            debug!(
                trailing = reader.remaining(),
                consumed = offset + reader.consumed(),
                "Ignoring bytes after the last profile"
            );
        }

        Ok(Self {
            header,
            noise,
            profiles,
        })
    }

    pub fn n_profiles(&self) -> usize {
        self.profiles.len()
    }

    /// Range of every bin in metres.
    pub fn altitude_m(&self) -> Vec<f32> {
        (0..self.header.max_samples())
            .map(|i| i as f32 * self.header.spatial_resolution)
            .collect()
    }

    /// Apply the corrections and name the channels.
    ///
    /// Channels with fewer than two samples, or whose vendor token is not
    /// recognised, are dropped.
    pub fn into_raw_profile(self, processor: &ChannelProcessor) -> LnaResult<RawProfile> {
        let fov = self.header.fov;
        let altitude_m = self.altitude_m();
        let timestamps: Vec<_> = self.profiles.iter().map(|p| p.time).collect();

        let date = match timestamps.first() {
            Some(first) => first.date_naive(),
            None => {
                warn!("File has no data profiles, using fallback date");
                fallback_date()
            }
        };

        let mut channels = BTreeMap::new();
        for (index, info) in self.header.channels.iter().enumerate() {
            if info.samples < 2 {
                warn!(channel = %info.name, samples = info.samples, "Dropping channel with fewer than 2 samples");
                continue;
            }
            let Some(role) = ChannelRole::from_vendor(&info.name) else {
                warn!(channel = %info.name, "Dropping channel with unrecognised name");
                continue;
            };
            let name = role.display_name(fov);
            if channels.contains_key(&name) {
                return Err(LnaError::Channel(format!(
                    "'{}' expands to '{}', which an earlier channel already uses",
                    info.name, name
                )));
            }

            let noise: Vec<f32> = self.noise[index].iter().map(|&v| v as f32).collect();
            let baseline = processor.deviation(&noise);
            let bins = &altitude_m[..info.samples];

            let mut data = ChannelArray::with_bins(info.samples);
            for profile in &self.profiles {
                let raw: Vec<f32> = profile.samples[index].iter().map(|&v| v as f32).collect();
                let signal = processor.deviation(&raw);
                data.push_row(&processor.correct_profile(&signal, &baseline, bins)?)?;
            }
            debug!(vendor = %info.name, channel = %name, "Decoded channel");
            channels.insert(name, data);
        }

        let altitude_km = ChannelProcessor::to_kilometres(&altitude_m);
        let (altitude, channels) = processor.cut_off_altitude(altitude_km, channels)?;

        let mut raw = RawProfile {
            timestamps,
            altitude,
            channels: BTreeMap::new(),
            date,
            format: FormatTag::Binary,
            fov: Some(fov),
        };
        for (name, data) in channels {
            raw.insert_channel(name, data)?;
        }
        Ok(raw)
    }
}

/// Read and parse a binary file without applying corrections.
pub fn read_file(path: impl AsRef<Path>) -> LnaResult<LnaFile> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| LnaError::from(e).in_file(path))?;
    LnaFile::parse(&data).map_err(|e| e.in_file(path))
}

/// Decode a binary file into corrected, named channels.
pub fn decode_file(path: impl AsRef<Path>, processor: &ChannelProcessor) -> LnaResult<RawProfile> {
    let path = path.as_ref();
    let file = read_file(path)?;
    let raw = file
        .into_raw_profile(processor)
        .map_err(|e| e.in_file(path))?;

    info!(
        path = %path.display(),
        profiles = raw.n_profiles(),
        bins = raw.altitude.len(),
        channels = raw.channels.len(),
        fov = ?raw.fov,
        "Decoded LNA file"
    );
    Ok(raw)
}

/// Add the depolarization and colour ratios of one telescope.
///
/// The colour ratio divides by the total 532 nm signal (parallel plus
/// crosspol), or by the parallel channel alone when no crosspol channel
/// exists. Returns whether any ratio was added.
pub fn add_ratios(dataset: &mut Dataset, fov: Fov, processor: &ChannelProcessor) -> LnaResult<bool> {
    let parallel = ChannelRole::Parallel532.display_name(fov);
    let crosspol = ChannelRole::Crosspol532.display_name(fov);
    let infrared = ChannelRole::Infrared1064.display_name(fov);

    let mut added = false;
    if dataset.channel(&crosspol).is_some() {
        added |= processor.add_ratio(dataset, &depolarization_name(fov), &crosspol, &parallel)?;
        added |= processor.add_ratio_over_sum(
            dataset,
            &color_ratio_name(fov),
            &infrared,
            (&parallel, &crosspol),
        )?;
    } else {
        added |= processor.add_ratio(dataset, &color_ratio_name(fov), &infrared, &parallel)?;
    }
    Ok(added)
}

/// Decode a binary file and add its ratio channels.
pub fn load_file(path: impl AsRef<Path>, processor: &ChannelProcessor) -> LnaResult<Dataset> {
    let path = path.as_ref();
    let raw = decode_file(path, processor)?;
    let fov = raw.fov.unwrap_or(Fov::Narrow);
    let mut dataset = Dataset::from_profile(raw).map_err(|e| LnaError::from(e).in_file(path))?;
    add_ratios(&mut dataset, fov, processor).map_err(|e| e.in_file(path))?;
    Ok(dataset)
}

/// True for names like `lna_0a_rawNF_20040319_080000.dat`.
pub fn is_lna_file_name(name: &str) -> bool {
    name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION)
}

/// Telescope encoded in a binary file name, if any.
pub fn fov_of_file_name(name: &str) -> Option<Fov> {
    if !is_lna_file_name(name) {
        return None;
    }
    let rest = &name[FILE_PREFIX.len()..];
    Fov::all()
        .into_iter()
        .find(|fov| rest.starts_with(fov.file_tag()))
}

/// Binary files of one telescope in a folder, unsorted.
fn files_for(dir: &Path, fov: Fov) -> LnaResult<Vec<PathBuf>> {
    Ok(list_files(dir, |name| fov_of_file_name(name) == Some(fov))?)
}

/// Decode every binary file in a folder.
///
/// Narrow and wide field-of-view files form two groups, each merged in
/// file name order; the groups are then joined on their timestamps.
/// `Ok(None)` when the folder holds no binary file.
pub fn decode_folder(
    dir: impl AsRef<Path>,
    processor: &ChannelProcessor,
    policy: FailurePolicy,
) -> LnaResult<Option<Dataset>> {
    let dir = dir.as_ref();
    let mut groups = Vec::new();
    for fov in Fov::all() {
        let paths = files_for(dir, fov)?;
        if paths.is_empty() {
            continue;
        }
        info!(folder = %dir.display(), fov = %fov, files = paths.len(), "Decoding LNA file group");
        let merged = merge_files(paths, policy, |path| load_file(path, processor))?;
        groups.push(merged);
    }

    let mut joined = None;
    for group in groups {
        joined = join_on_time(joined, group)?;
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{nfov, vendor_names, wfov, LnaFileBuilder};

    #[test]
    fn test_file_name_detection() {
        assert!(is_lna_file_name("lna_0a_rawNF_20040319_080000.dat"));
        assert!(!is_lna_file_name("lna_0a_rawNF_20040319_080000.nc"));
        assert!(!is_lna_file_name("als450_20040319.dat"));
        assert_eq!(
            fov_of_file_name("lna_0a_rawWF_20040319.dat"),
            Some(Fov::Wide)
        );
        assert_eq!(
            fov_of_file_name("lna_0a_rawNF_20040319.dat"),
            Some(Fov::Narrow)
        );
        assert_eq!(fov_of_file_name("lna_0a_rawXX_20040319.dat"), None);
    }

    #[test]
    fn test_parse_counts_profiles() {
        let bytes = LnaFileBuilder::new()
            .with_channel(vendor_names::PARALLEL_532, 8)
            .with_minute_profiles(0, 5, |_, bin| bin as i16)
            .build();
        let file = LnaFile::parse(&bytes).unwrap();
        assert_eq!(file.header.profile_count, 5);
        assert_eq!(file.n_profiles(), 5);
        assert_eq!(file.header.channels[0].name, vendor_names::PARALLEL_532);
        assert_eq!(file.profiles[4].samples[0][7], 7);
        assert_eq!(file.altitude_m()[2], 30.0);
    }

    #[test]
    fn test_parse_truncated_profile() {
        let mut bytes = LnaFileBuilder::new()
            .with_channel(vendor_names::PARALLEL_532, 8)
            .with_minute_profiles(0, 3, |_, _| 1)
            .build();
        bytes.truncate(bytes.len() - 3);
        let err = LnaFile::parse(&bytes).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_header_declares_more_profiles_than_stored() {
        let bytes = LnaFileBuilder::new()
            .with_channel(vendor_names::PARALLEL_532, 4)
            .with_minute_profiles(0, 2, |_, _| 1)
            .with_declared_profiles(6)
            .build();
        assert!(LnaFile::parse(&bytes).unwrap_err().is_truncated());
    }

    #[test]
    fn test_zero_declared_profiles_is_invalid() {
        let bytes = LnaFileBuilder::new()
            .with_channel(vendor_names::PARALLEL_532, 4)
            .with_declared_profiles(0)
            .build();
        assert!(matches!(
            LnaFile::parse(&bytes),
            Err(LnaError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_invalid_profile_clock() {
        let mut bytes = LnaFileBuilder::new()
            .with_header_lines(&[])
            .with_channel(vendor_names::PARALLEL_532, 2)
            .with_minute_profiles(0, 1, |_, _| 0)
            .build();
        // month field of the single data profile
        let month = bytes.len() - 2 * 2 - 12 + 2;
        bytes[month] = 13;
        bytes[month + 1] = 0;
        assert!(matches!(
            LnaFile::parse(&bytes),
            Err(LnaError::InvalidTimestamp { profile: 0, .. })
        ));
    }

    #[test]
    fn test_wide_field_names() {
        let bytes = LnaFileBuilder::new()
            .with_system(1)
            .with_channel(vendor_names::PARALLEL_532, 4)
            .with_channel(vendor_names::IR_1064, 4)
            .with_minute_profiles(0, 2, |_, _| 0)
            .build();
        let raw = LnaFile::parse(&bytes)
            .unwrap()
            .into_raw_profile(&ChannelProcessor::default())
            .unwrap();
        assert_eq!(raw.fov, Some(Fov::Wide));
        let names: Vec<_> = raw.channels.keys().map(String::as_str).collect();
        assert_eq!(names, vec![wfov::PARALLEL_532, wfov::IR_1064]);
    }

    #[test]
    fn test_drops_short_and_unknown_channels() {
        let bytes = LnaFileBuilder::new()
            .with_channel(vendor_names::PARALLEL_532, 4)
            .with_channel(vendor_names::CROSSPOL_532, 1)
            .with_channel(vendor_names::UNKNOWN, 4)
            .with_minute_profiles(0, 2, |_, _| 0)
            .build();
        let raw = LnaFile::parse(&bytes)
            .unwrap()
            .into_raw_profile(&ChannelProcessor::default())
            .unwrap();
        assert_eq!(raw.channels.len(), 1);
        assert!(raw.channels.contains_key(nfov::PARALLEL_532));
    }

    #[test]
    fn test_duplicate_expanded_name() {
        let bytes = LnaFileBuilder::new()
            .with_channel("532 paral", 4)
            .with_channel("532", 4)
            .with_minute_profiles(0, 1, |_, _| 0)
            .build();
        let err = LnaFile::parse(&bytes)
            .unwrap()
            .into_raw_profile(&ChannelProcessor::default())
            .unwrap_err();
        assert!(matches!(err, LnaError::Channel(_)));
    }

    #[test]
    fn test_no_profiles_uses_fallback_date() {
        let bytes = LnaFileBuilder::new()
            .with_channel(vendor_names::PARALLEL_532, 4)
            .build();
        let raw = LnaFile::parse(&bytes)
            .unwrap()
            .into_raw_profile(&ChannelProcessor::default())
            .unwrap();
        assert_eq!(raw.n_profiles(), 0);
        assert_eq!(raw.date, fallback_date());
    }
}
