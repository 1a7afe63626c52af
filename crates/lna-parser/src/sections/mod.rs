//! LNA file section parsing.
//!
//! A file is laid out as:
//!
//! ```text
//! ASCII preamble      "#N ..." then N-1 more text lines
//! acquisition header  3 x i32, 2 x f32, 4 x i32, n x 10-byte names,
//!                     six n-length channel arrays, 128 reserved bytes
//! noise profile       6 x u16 clock, then every channel's samples (i16)
//! data profiles       6 x u16 clock, then samples of channels with n > 0
//! ```
//!
//! All binary fields are little-endian.

use bytes::Buf;
use chrono::{DateTime, Utc};
use lidar_common::{timestamp_from_fields, Fov};

use crate::error::{LnaError, LnaResult};

/// Reserved block closing the acquisition header.
pub const RESERVED_BYTES: usize = 128;

/// Width of a channel name field.
pub const CHANNEL_NAME_LEN: usize = 10;

/// Bytes of the clock ahead of every profile.
pub const PROFILE_CLOCK_LEN: usize = 12;

/// Per-channel acquisition settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    /// Vendor token with padding removed, e.g. `532 paral`.
    pub name: String,
    pub samples: usize,
    pub coding_bits: i32,
    pub gain: f32,
    pub offset: f32,
    pub external_gain: f32,
    pub external_offset: f32,
}

/// Binary acquisition header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionHeader {
    /// Data profiles in the file, excluding the leading noise profile.
    pub profile_count: usize,
    pub system: i32,
    pub fov: Fov,
    pub frequency: i32,
    /// Seconds per profile.
    pub temporal_resolution: f32,
    /// Metres per range bin.
    pub spatial_resolution: f32,
    pub pretrigger: i32,
    pub shots: i32,
    pub noise_shots: i32,
    pub channels: Vec<ChannelInfo>,
}

impl AcquisitionHeader {
    /// Largest per-channel sample count, which sizes the altitude grid.
    pub fn max_samples(&self) -> usize {
        self.channels.iter().map(|c| c.samples).max().unwrap_or(0)
    }

    /// Bytes one data profile occupies.
    pub fn profile_len(&self) -> usize {
        PROFILE_CLOCK_LEN + self.channels.iter().map(|c| c.samples * 2).sum::<usize>()
    }
}

/// Raw counts of one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCounts {
    pub time: DateTime<Utc>,
    /// One vector per header channel; empty for channels without samples.
    pub samples: Vec<Vec<i16>>,
}

/// Bounds-checked little-endian field reader.
pub(crate) struct FieldReader<'a> {
    buf: &'a [u8],
    consumed: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, consumed: 0 }
    }

    pub(crate) fn consumed(&self) -> usize {
        self.consumed
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, section: &str, needed: usize) -> LnaResult<()> {
        if self.buf.remaining() < needed {
            return Err(LnaError::Truncated {
                section: section.to_string(),
                needed,
                available: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn i32s(&mut self, section: &str, n: usize) -> LnaResult<Vec<i32>> {
        self.need(section, n * 4)?;
        self.consumed += n * 4;
        Ok((0..n).map(|_| self.buf.get_i32_le()).collect())
    }

    fn f32s(&mut self, section: &str, n: usize) -> LnaResult<Vec<f32>> {
        self.need(section, n * 4)?;
        self.consumed += n * 4;
        Ok((0..n).map(|_| self.buf.get_f32_le()).collect())
    }

    fn u16s(&mut self, section: &str, n: usize) -> LnaResult<Vec<u16>> {
        self.need(section, n * 2)?;
        self.consumed += n * 2;
        Ok((0..n).map(|_| self.buf.get_u16_le()).collect())
    }

    fn i16s(&mut self, section: &str, n: usize) -> LnaResult<Vec<i16>> {
        self.need(section, n * 2)?;
        self.consumed += n * 2;
        Ok((0..n).map(|_| self.buf.get_i16_le()).collect())
    }

    fn bytes(&mut self, section: &str, n: usize) -> LnaResult<&'a [u8]> {
        self.need(section, n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        self.consumed += n;
        Ok(head)
    }
}

/// Parse the ASCII preamble and return the offset of the binary header.
///
/// The first token of the first line, minus its one-character prefix, is
/// the total number of preamble lines.
pub fn parse_preamble(data: &[u8]) -> LnaResult<usize> {
    let first_end = data
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| LnaError::InvalidPreamble("no line break in file".to_string()))?;

    let first_line = String::from_utf8_lossy(&data[..first_end]);
    let token = first_line
        .split_whitespace()
        .next()
        .ok_or_else(|| LnaError::InvalidPreamble("empty first line".to_string()))?;

    let count: usize = token
        .get(1..)
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| {
            LnaError::InvalidPreamble(format!("cannot read line count from '{}'", token))
        })?;
    if count == 0 {
        return Err(LnaError::InvalidPreamble("line count is zero".to_string()));
    }

    let mut offset = first_end + 1;
    for line in 1..count {
        let rest = &data[offset.min(data.len())..];
        let end = rest.iter().position(|&b| b == b'\n').ok_or_else(|| {
            LnaError::InvalidPreamble(format!(
                "expected {} preamble lines, file ends after {}",
                count, line
            ))
        })?;
        offset += end + 1;
    }

    Ok(offset)
}

/// Parse the acquisition header.
pub(crate) fn parse_header(reader: &mut FieldReader<'_>) -> LnaResult<AcquisitionHeader> {
    const SECTION: &str = "acquisition header";

    let head = reader.i32s(SECTION, 3)?;
    let (declared, system, frequency) = (head[0], head[1], head[2]);
    if declared < 1 {
        return Err(LnaError::InvalidHeader(format!(
            "profile count {} leaves no room for the noise profile",
            declared
        )));
    }

    let resolution = reader.f32s(SECTION, 2)?;
    let settings = reader.i32s(SECTION, 4)?;
    let n_channels = settings[3];
    if n_channels < 0 {
        return Err(LnaError::InvalidHeader(format!(
            "negative channel count {}",
            n_channels
        )));
    }
    let n = n_channels as usize;

    let names: Vec<String> = (0..n)
        .map(|_| reader.bytes(SECTION, CHANNEL_NAME_LEN).map(decode_name))
        .collect::<LnaResult<_>>()?;
    let samples = reader.i32s(SECTION, n)?;
    let coding_bits = reader.i32s(SECTION, n)?;
    let gains = reader.f32s(SECTION, n)?;
    let offsets = reader.f32s(SECTION, n)?;
    let external_gains = reader.f32s(SECTION, n)?;
    let external_offsets = reader.f32s(SECTION, n)?;
    reader.bytes(SECTION, RESERVED_BYTES)?;

    let mut channels = Vec::with_capacity(n);
    for i in 0..n {
        if samples[i] < 0 {
            return Err(LnaError::InvalidHeader(format!(
                "channel '{}' has negative sample count {}",
                names[i], samples[i]
            )));
        }
        channels.push(ChannelInfo {
            name: names[i].clone(),
            samples: samples[i] as usize,
            coding_bits: coding_bits[i],
            gain: gains[i],
            offset: offsets[i],
            external_gain: external_gains[i],
            external_offset: external_offsets[i],
        });
    }

    Ok(AcquisitionHeader {
        profile_count: (declared - 1) as usize,
        system,
        fov: Fov::from_system(system),
        frequency,
        temporal_resolution: resolution[0],
        spatial_resolution: resolution[1],
        pretrigger: settings[0],
        shots: settings[1],
        noise_shots: settings[2],
        channels,
    })
}

fn decode_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// Parse the noise profile. Its clock is not meaningful and is skipped.
pub(crate) fn parse_noise_profile(
    reader: &mut FieldReader<'_>,
    header: &AcquisitionHeader,
) -> LnaResult<Vec<Vec<i16>>> {
    const SECTION: &str = "noise profile";
    reader.u16s(SECTION, 6)?;
    header
        .channels
        .iter()
        .map(|c| reader.i16s(SECTION, c.samples))
        .collect()
}

/// Parse data profile number `index` (0-based).
pub(crate) fn parse_profile(
    reader: &mut FieldReader<'_>,
    header: &AcquisitionHeader,
    index: usize,
) -> LnaResult<RawCounts> {
    let section = format!("profile {}", index);
    let clock = reader.u16s(&section, 6)?;
    let time = timestamp_from_fields(clock[0], clock[1], clock[2], clock[3], clock[4], clock[5])
        .map_err(|e| LnaError::InvalidTimestamp {
            profile: index,
            reason: e.to_string(),
        })?;

    let mut samples = Vec::with_capacity(header.channels.len());
    for channel in &header.channels {
        if channel.samples == 0 {
            samples.push(Vec::new());
            continue;
        }
        samples.push(reader.i16s(&section, channel.samples)?);
    }

    Ok(RawCounts { time, samples })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preamble_skips_declared_lines() {
        let data = b"#3 header\nline two\nline three\n\x01\x02";
        let offset = parse_preamble(data).unwrap();
        assert_eq!(&data[offset..], b"\x01\x02");
    }

    #[test]
    fn test_parse_preamble_single_line() {
        let data = b"#1\nBIN";
        assert_eq!(parse_preamble(data).unwrap(), 3);
    }

    #[test]
    fn test_parse_preamble_rejects_garbage() {
        assert!(matches!(
            parse_preamble(b"#x header\n"),
            Err(LnaError::InvalidPreamble(_))
        ));
        assert!(matches!(
            parse_preamble(b"#0 header\n"),
            Err(LnaError::InvalidPreamble(_))
        ));
        assert!(matches!(
            parse_preamble(b"#4 header\nonly two\n"),
            Err(LnaError::InvalidPreamble(_))
        ));
        assert!(matches!(parse_preamble(b"no newline"), Err(LnaError::InvalidPreamble(_))));
    }

    #[test]
    fn test_decode_name_strips_padding() {
        assert_eq!(decode_name(b"532 paral\0"), "532 paral");
        assert_eq!(decode_name(b"1,064     "), "1,064");
    }

    #[test]
    fn test_field_reader_truncation() {
        let data = [1u8, 0, 0];
        let mut reader = FieldReader::new(&data);
        let err = reader.i32s("test", 1).unwrap_err();
        match err {
            LnaError::Truncated { needed, available, .. } => {
                assert_eq!(needed, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_field_reader_little_endian() {
        let data = [0x01u8, 0x00, 0x00, 0x00, 0xff, 0xff];
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.i32s("t", 1).unwrap(), vec![1]);
        assert_eq!(reader.i16s("t", 1).unwrap(), vec![-1]);
        assert_eq!(reader.consumed(), 6);
        assert_eq!(reader.remaining(), 0);
    }
}
