//! Catalog-driven decoding of columnar lidar files.
//!
//! Nothing about the layout is hard-coded: the catalog names the time and
//! range variables and describes, per format, which attributes identify
//! each channel variable.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use lidar_common::{
    fallback_date, hours_of_day_to_timestamp, list_files, ChannelArray, ChannelDefinition, Dataset,
    FailurePolicy, FormatCatalog, FormatTag, RawProfile,
};
use lidar_processing::{merge_files, ChannelProcessor};
use tracing::{debug, info, warn};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{
    attr_value, global_attr_value, read_f32, read_f64, shape, silence_hdf5_errors, AttrValue,
};

/// File name extension of columnar files.
pub const FILE_EXTENSION: &str = ".nc";

/// Attribute marking samples that were not measured.
const MISSING_VALUE_ATTR: &str = "missing_value";

/// Range values above this are taken to be metres.
const METRES_THRESHOLD: f64 = 1000.0;

/// First variable, in file order, whose name satisfies `is_role`.
fn find_role_variable<'f>(
    file: &'f netcdf::File,
    is_role: impl Fn(&str) -> bool,
) -> Option<netcdf::Variable<'f>> {
    file.variables().find(|var| is_role(&var.name()))
}

/// Does the variable carry every attribute of the definition, with an
/// equal value?
fn matches_definition(var: &netcdf::Variable, definition: &ChannelDefinition) -> bool {
    definition
        .properties
        .iter()
        .all(|(attr, expected)| match attr_value(var, attr) {
            Some(AttrValue::Text(text)) => expected.matches_text(&text),
            Some(AttrValue::Number(value)) => expected.matches_number(value),
            Some(AttrValue::Other) | None => false,
        })
}

/// Acquisition date from the `year`, `month` and `day` global attributes.
///
/// Some writers store the year in `day` and the day in `year`; a day above
/// 1900 is taken as that swap.
fn read_date(file: &netcdf::File) -> NetCdfResult<NaiveDate> {
    let field = |name: &str| global_attr_value(file, name).and_then(|v| v.as_f64());

    let (Some(mut year), Some(month), Some(mut day)) = (field("year"), field("month"), field("day"))
    else {
        warn!(date = %fallback_date(), "No date attributes, using fallback date");
        return Ok(fallback_date());
    };

    if day > 1900.0 {
        warn!(year, day, "Day attribute holds the year, swapping");
        std::mem::swap(&mut year, &mut day);
    }

    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32).ok_or_else(|| {
        NetCdfError::InvalidFormat(format!(
            "date attributes {}-{}-{} are not a calendar date",
            year, month, day
        ))
    })
}

/// Altitude grid in km.
fn read_altitude(var: &netcdf::Variable) -> NetCdfResult<Vec<f32>> {
    let mut altitude = read_f64(var)?;
    let max = altitude.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > METRES_THRESHOLD {
        debug!(variable = %var.name(), max, "Converting range from metres to km");
        for a in &mut altitude {
            *a /= 1000.0;
        }
    }
    Ok(altitude.into_iter().map(|a| a as f32).collect())
}

/// Channel samples with `missing_value` replaced by NaN.
fn read_channel(
    var: &netcdf::Variable,
    n_profiles: usize,
    n_bins: usize,
) -> NetCdfResult<ChannelArray> {
    let found = shape(var);
    if found != [n_profiles, n_bins] {
        return Err(NetCdfError::ShapeMismatch {
            variable: var.name(),
            expected: (n_profiles, n_bins),
            found,
        });
    }

    let mut values = read_f32(var)?;
    if let Some(missing) = attr_value(var, MISSING_VALUE_ATTR).and_then(|v| v.as_f64()) {
        let missing = missing as f32;
        for v in values.iter_mut().filter(|v| **v == missing) {
            *v = f32::NAN;
        }
    }
    Ok(ChannelArray::new(n_profiles, n_bins, values)?)
}

fn decode_open_file(
    file: &netcdf::File,
    format_id: &str,
    catalog: &FormatCatalog,
) -> NetCdfResult<RawProfile> {
    let date = read_date(file)?;

    let time_var = find_role_variable(file, |name| catalog.is_horizontal(name)).ok_or_else(|| {
        NetCdfError::MissingData(format!(
            "time variable (one of {:?})",
            catalog.horizontal_variables()
        ))
    })?;
    let timestamps = read_f64(&time_var)?
        .into_iter()
        .map(|hours| hours_of_day_to_timestamp(date, hours))
        .collect::<Result<Vec<_>, _>>()?;

    let range_var = find_role_variable(file, |name| catalog.is_vertical(name)).ok_or_else(|| {
        NetCdfError::MissingData(format!(
            "range variable (one of {:?})",
            catalog.vertical_variables()
        ))
    })?;
    let altitude = read_altitude(&range_var)?;

    let mut raw = RawProfile {
        timestamps,
        altitude,
        channels: Default::default(),
        date,
        format: FormatTag::Columnar {
            format_id: format_id.to_string(),
        },
        fov: None,
    };
    let (n_profiles, n_bins) = (raw.timestamps.len(), raw.altitude.len());

    for definition in catalog.channels(format_id) {
        let Some(var) = file.variables().find(|var| matches_definition(var, definition)) else {
            warn!(channel = %definition.name, "No variable matches channel definition, skipping");
            continue;
        };
        debug!(channel = %definition.name, variable = %var.name(), "Matched channel");
        let data = read_channel(&var, n_profiles, n_bins)?;
        raw.insert_channel(definition.name.clone(), data)?;
    }

    Ok(raw)
}

/// Decode one columnar file of the given catalog format.
pub fn decode_file(
    path: impl AsRef<Path>,
    format_id: &str,
    catalog: &FormatCatalog,
) -> NetCdfResult<RawProfile> {
    let path = path.as_ref();
    if !catalog.is_supported(format_id) {
        return Err(NetCdfError::UnknownFormat(format_id.to_string()).in_file(path));
    }
    silence_hdf5_errors();

    let file = netcdf::open(path).map_err(|e| {
        NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)).in_file(path)
    })?;
    let raw = decode_open_file(&file, format_id, catalog).map_err(|e| e.in_file(path))?;

    info!(
        path = %path.display(),
        format = %format_id,
        profiles = raw.n_profiles(),
        bins = raw.altitude.len(),
        channels = raw.channels.len(),
        "Decoded columnar file"
    );
    Ok(raw)
}

/// Decode one file and add the catalog's ratio channels for its format.
pub fn load_file(
    path: impl AsRef<Path>,
    format_id: &str,
    catalog: &FormatCatalog,
    processor: &ChannelProcessor,
) -> NetCdfResult<Dataset> {
    let path = path.as_ref();
    let raw = decode_file(path, format_id, catalog)?;
    let mut dataset = Dataset::from_profile(raw).map_err(|e| NetCdfError::from(e).in_file(path))?;

    for ratio in catalog.ratios(format_id) {
        processor
            .add_ratio(&mut dataset, &ratio.name, &ratio.numerator, &ratio.denominator)
            .map_err(|e| NetCdfError::from(e).in_file(path))?;
    }
    Ok(dataset)
}

/// Files of a format in a folder: `{format_id}*.nc`.
pub fn files_for_format(dir: &Path, format_id: &str) -> NetCdfResult<Vec<PathBuf>> {
    Ok(list_files(dir, |name| {
        name.starts_with(format_id) && name.ends_with(FILE_EXTENSION)
    })?)
}

/// Decode every file of a format in a folder and merge them in file name
/// order. `Ok(None)` when no file of that format exists.
pub fn decode_folder(
    dir: impl AsRef<Path>,
    format_id: &str,
    catalog: &FormatCatalog,
    processor: &ChannelProcessor,
    policy: FailurePolicy,
) -> NetCdfResult<Option<Dataset>> {
    let dir = dir.as_ref();
    let paths = files_for_format(dir, format_id)?;
    info!(folder = %dir.display(), format = %format_id, files = paths.len(), "Decoding columnar folder");
    merge_files(paths, policy, |path| load_file(path, format_id, catalog, processor))
}
