//! Thin helpers over the native netcdf library.
//!
//! Attribute probing goes through [`has_attr`] first: asking libnetcdf for
//! an attribute that does not exist makes HDF5 print diagnostics to stderr,
//! even though the miss is handled.

use std::sync::Once;

use netcdf::AttributeValue;

use crate::error::{NetCdfError, NetCdfResult};

/// Turn off HDF5's automatic stderr report.
///
/// Matching catalog channels probes attributes that most variables lack, and
/// each miss would otherwise print an HDF5 error stack. Runs once per process.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: a None handler with a null client pointer is the documented
        // way to disable the default error stack printer.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Value of an attribute that is present.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Text(String),
    /// Present, but neither a scalar number nor text (e.g. a numeric array).
    Other,
}

impl AttrValue {
    fn from_netcdf(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Str(s) => AttrValue::Text(s),
            AttributeValue::Strs(parts) => AttrValue::Text(parts.join("")),
            other => f64::try_from(other)
                .map(AttrValue::Number)
                .unwrap_or(AttrValue::Other),
        }
    }

    /// Numeric reading, also for numbers stored as text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) => Some(*v),
            AttrValue::Text(s) => s
                .trim_matches(|c: char| c.is_whitespace() || c == '\0')
                .parse()
                .ok(),
            AttrValue::Other => None,
        }
    }
}

/// Check if a variable has an attribute with the given name.
pub fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Variable attribute; `None` when absent or unreadable.
pub fn attr_value(var: &netcdf::Variable, name: &str) -> Option<AttrValue> {
    if !has_attr(var, name) {
        return None;
    }
    let value = var.attribute_value(name)?.ok()?;
    Some(AttrValue::from_netcdf(value))
}

/// Global (file) attribute; `None` when absent or unreadable.
pub fn global_attr_value(file: &netcdf::File, name: &str) -> Option<AttrValue> {
    if !file.attributes().any(|attr| attr.name() == name) {
        return None;
    }
    let value = file.attribute(name)?.value().ok()?;
    Some(AttrValue::from_netcdf(value))
}

/// Lengths of the variable's dimensions.
pub fn shape(var: &netcdf::Variable) -> Vec<usize> {
    var.dimensions().iter().map(|d| d.len()).collect()
}

/// All values of a numeric variable as `f64`, whatever its stored type.
///
/// The stored type is found by trying the common numeric types in turn,
/// since reads are only accepted for the matching element type.
pub fn read_f64(var: &netcdf::Variable) -> NetCdfResult<Vec<f64>> {
    macro_rules! try_as {
        ($t:ty) => {
            if let Ok(values) = var.get_values::<$t, _>(..) {
                return Ok(values.into_iter().map(|x| x as f64).collect());
            }
        };
    }

    try_as!(f64);
    try_as!(f32);
    try_as!(i32);
    try_as!(i16);
    try_as!(i64);
    try_as!(u16);
    try_as!(u32);
    try_as!(i8);
    try_as!(u8);

    Err(NetCdfError::InvalidFormat(format!(
        "variable '{}' is not numeric",
        var.name()
    )))
}

/// All values of a numeric variable as `f32`.
pub fn read_f32(var: &netcdf::Variable) -> NetCdfResult<Vec<f32>> {
    if let Ok(values) = var.get_values::<f32, _>(..) {
        return Ok(values);
    }
    Ok(read_f64(var)?.into_iter().map(|v| v as f32).collect())
}
