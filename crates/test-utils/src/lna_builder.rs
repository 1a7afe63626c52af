//! Synthetic LNA binary files.
//!
//! Creates small files with the exact byte layout of the instrument output:
//! an ASCII preamble, the little-endian acquisition header, a leading noise
//! profile and then the data profiles.

use std::io;
use std::path::Path;

use bytes::BufMut;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::generators::campaign_start;

/// One channel of a synthetic file.
#[derive(Debug, Clone)]
pub struct LnaChannelSpec {
    pub name: String,
    pub samples: usize,
    /// Raw counts of the noise profile.
    pub noise: Vec<i16>,
}

/// Build a minimal LNA binary file with the specified content.
#[derive(Debug, Clone)]
pub struct LnaFileBuilder {
    header_lines: Vec<String>,
    system: i32,
    frequency: i32,
    temporal_resolution: f32,
    spatial_resolution: f32,
    declared_profiles: Option<i32>,
    channels: Vec<LnaChannelSpec>,
    profiles: Vec<(DateTime<Utc>, Vec<Vec<i16>>)>,
}

impl Default for LnaFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LnaFileBuilder {
    /// Narrow field of view, 15 m bins, no channels.
    pub fn new() -> Self {
        Self {
            header_lines: vec![
                "site: Palaiseau SIRTA".to_string(),
                "instrument: LNA".to_string(),
            ],
            system: 0,
            frequency: 20,
            temporal_resolution: 60.0,
            spatial_resolution: 15.0,
            declared_profiles: None,
            channels: Vec::new(),
            profiles: Vec::new(),
        }
    }

    /// Select the telescope: 1 is the wide field of view.
    pub fn with_system(mut self, system: i32) -> Self {
        self.system = system;
        self
    }

    pub fn with_spatial_resolution(mut self, metres: f32) -> Self {
        self.spatial_resolution = metres;
        self
    }

    /// Extra ASCII preamble lines after the count line.
    pub fn with_header_lines(mut self, lines: &[&str]) -> Self {
        self.header_lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Override the profile count written to the header.
    pub fn with_declared_profiles(mut self, count: i32) -> Self {
        self.declared_profiles = Some(count);
        self
    }

    /// Add a channel with a flat (zero) noise profile.
    pub fn with_channel(mut self, name: &str, samples: usize) -> Self {
        self.channels.push(LnaChannelSpec {
            name: name.to_string(),
            samples,
            noise: vec![0; samples],
        });
        self
    }

    /// Replace the noise profile of the last added channel.
    pub fn with_noise(mut self, noise: Vec<i16>) -> Self {
        if let Some(channel) = self.channels.last_mut() {
            channel.noise = noise;
        }
        self
    }

    /// Append a profile; `data` holds one sample vector per channel.
    pub fn with_profile(mut self, time: DateTime<Utc>, data: Vec<Vec<i16>>) -> Self {
        self.profiles.push((time, data));
        self
    }

    /// Append `count` profiles one `step_seconds` apart, starting at
    /// `start`. Samples come from `sample(channel, bin)`.
    pub fn with_profiles<F>(mut self, start: DateTime<Utc>, count: usize, step_seconds: i64, sample: F) -> Self
    where
        F: Fn(usize, usize) -> i16,
    {
        for p in 0..count {
            let time = start + Duration::seconds(step_seconds * p as i64);
            let data = self
                .channels
                .iter()
                .enumerate()
                .map(|(c, spec)| (0..spec.samples).map(|bin| sample(c, bin)).collect())
                .collect();
            self.profiles.push((time, data));
        }
        self
    }

    /// Like [`with_profiles`](Self::with_profiles) with minute spacing from
    /// the campaign start.
    pub fn with_minute_profiles<F>(self, start_minute: i64, count: usize, sample: F) -> Self
    where
        F: Fn(usize, usize) -> i16,
    {
        let start = campaign_start() + Duration::minutes(start_minute);
        self.with_profiles(start, count, 60, sample)
    }

    /// Build the complete file bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();

        // ASCII preamble: "#N" where N counts every preamble line
        out.put_slice(format!("#{} LNA raw data\n", self.header_lines.len() + 1).as_bytes());
        for line in &self.header_lines {
            out.put_slice(line.as_bytes());
            out.put_u8(b'\n');
        }

        let declared = self
            .declared_profiles
            .unwrap_or(self.profiles.len() as i32 + 1);
        out.put_i32_le(declared);
        out.put_i32_le(self.system);
        out.put_i32_le(self.frequency);
        out.put_f32_le(self.temporal_resolution);
        out.put_f32_le(self.spatial_resolution);
        out.put_i32_le(0); // pretrigger
        out.put_i32_le(1000); // shots averaged
        out.put_i32_le(1000); // noise shots averaged
        out.put_i32_le(self.channels.len() as i32);

        for channel in &self.channels {
            let mut name = [0u8; 10];
            let bytes = channel.name.as_bytes();
            let n = bytes.len().min(10);
            name[..n].copy_from_slice(&bytes[..n]);
            out.put_slice(&name);
        }
        for channel in &self.channels {
            out.put_i32_le(channel.samples as i32);
        }
        for _ in &self.channels {
            out.put_i32_le(12); // coding bits
        }
        for _ in 0..4 {
            // gain, offset, external gain, external offset
            for _ in &self.channels {
                out.put_f32_le(1.0);
            }
        }
        out.put_bytes(0, 128);

        // noise profile
        put_time(&mut out, campaign_start());
        for channel in &self.channels {
            for &v in &channel.noise {
                out.put_i16_le(v);
            }
        }

        for (time, data) in &self.profiles {
            put_time(&mut out, *time);
            for (spec, samples) in self.channels.iter().zip(data) {
                if spec.samples == 0 {
                    continue;
                }
                for &v in samples {
                    out.put_i16_le(v);
                }
            }
        }

        out
    }

    /// Write the file to disk.
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.build())
    }
}

/// Profile clock: day, month, year, hour, minute, second.
fn put_time(out: &mut Vec<u8>, time: DateTime<Utc>) {
    out.put_u16_le(time.day() as u16);
    out.put_u16_le(time.month() as u16);
    out.put_u16_le(time.year() as u16);
    out.put_u16_le(time.hour() as u16);
    out.put_u16_le(time.minute() as u16);
    out.put_u16_le(time.second() as u16);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_layout_size() {
        let bytes = LnaFileBuilder::new()
            .with_header_lines(&[])
            .with_channel("532 paral", 4)
            .with_minute_profiles(0, 2, |_, _| 0)
            .build();

        let preamble = "#1 LNA raw data\n".len();
        let header = 9 * 4 + 10 + 6 * 4 + 128;
        let noise = 12 + 4 * 2;
        let profiles = 2 * (12 + 4 * 2);
        assert_eq!(bytes.len(), preamble + header + noise + profiles);
    }

    #[test]
    fn test_declared_profiles_default() {
        let bytes = LnaFileBuilder::new()
            .with_header_lines(&[])
            .with_channel("532 paral", 1)
            .with_minute_profiles(0, 3, |_, _| 0)
            .build();
        let start = "#1 LNA raw data\n".len();
        let declared = i32::from_le_bytes(bytes[start..start + 4].try_into().unwrap());
        assert_eq!(declared, 4);
    }
}
