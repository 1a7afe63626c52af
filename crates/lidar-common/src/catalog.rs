//! Declarative per-instrument channel and ratio definitions.
//!
//! The catalog tells the columnar decoder how to find each channel inside a
//! file (by matching variable attributes) and which derived ratios to build.
//! It is loaded once, never mutated, and passed by reference to every decode
//! call.
//!
//! ```yaml
//! lidar_variables:
//!   lna:
//!     "p01 - Pr2 532nm NFOV": { wavelength: "532", polarization: "parallel", telescope: "NFOV" }
//! lidar_ratios:
//!   lna:
//!     "p07 - Depolarization Ratio 532nm NFOV":
//!       numerator: "p03 - Pr2 532nm crosspol NFOV"
//!       denominator: "p01 - Pr2 532nm NFOV"
//! horizontal: [time]
//! vertical: [range, altitude]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LidarError, LidarResult};

/// Catalog compiled into the binary, used when no resource is configured.
const BUILTIN_CATALOG: &str = include_str!("../assets/formats.yaml");

/// Environment variable naming an alternative catalog resource.
pub const CATALOG_ENV_VAR: &str = "LIDAR_FORMAT_CATALOG";

/// Expected value of one variable attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    /// Compare against a text attribute. Surrounding blanks and NULs, which
    /// fixed-width attribute writers leave behind, are ignored.
    pub fn matches_text(&self, attr: &str) -> bool {
        let attr = attr.trim_matches(|c: char| c.is_whitespace() || c == '\0');
        match self {
            PropertyValue::Text(expected) => expected == attr,
            PropertyValue::Number(expected) => attr
                .parse::<f64>()
                .map(|v| v == *expected)
                .unwrap_or(false),
        }
    }

    /// Compare against a numeric attribute.
    pub fn matches_number(&self, attr: f64) -> bool {
        match self {
            PropertyValue::Number(expected) => *expected == attr,
            PropertyValue::Text(expected) => expected
                .trim()
                .parse::<f64>()
                .map(|v| v == attr)
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(v) => write!(f, "{}", v),
            PropertyValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// One measured channel: display name plus the attributes that identify it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDefinition {
    pub name: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// A derived channel computed as `numerator / denominator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioDefinition {
    #[serde(skip)]
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

/// On-disk layout of the catalog resource.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    lidar_variables: Option<BTreeMap<String, BTreeMap<String, BTreeMap<String, PropertyValue>>>>,
    #[serde(default)]
    lidar_ratios: BTreeMap<String, BTreeMap<String, RatioDefinition>>,
    horizontal: Option<Vec<String>>,
    vertical: Option<Vec<String>>,
}

/// Immutable set of format definitions.
#[derive(Debug, Clone)]
pub struct FormatCatalog {
    channels: BTreeMap<String, Vec<ChannelDefinition>>,
    ratios: BTreeMap<String, Vec<RatioDefinition>>,
    horizontal: Vec<String>,
    vertical: Vec<String>,
}

impl FormatCatalog {
    /// Load a catalog resource. `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> LidarResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LidarError::config(format!("cannot read catalog {}: {}", path.display(), e))
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let catalog = if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
        .map_err(|e| LidarError::config(format!("{}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            formats = ?catalog.supported_formats(),
            "Loaded format catalog"
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> LidarResult<Self> {
        let file: CatalogFile = serde_json::from_str(content)
            .map_err(|e| LidarError::config(format!("malformed JSON: {}", e)))?;
        Self::from_file(file)
    }

    pub fn from_yaml_str(content: &str) -> LidarResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)
            .map_err(|e| LidarError::config(format!("malformed YAML: {}", e)))?;
        Self::from_file(file)
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> LidarResult<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Load from the path in `LIDAR_FORMAT_CATALOG`, or fall back to the
    /// builtin catalog when the variable is unset.
    pub fn from_env() -> LidarResult<Self> {
        match std::env::var(CATALOG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::load(path),
            _ => {
                debug!("Using builtin format catalog");
                Self::builtin()
            }
        }
    }

    fn from_file(file: CatalogFile) -> LidarResult<Self> {
        let variables = file
            .lidar_variables
            .ok_or_else(|| LidarError::config("missing required key 'lidar_variables'"))?;
        let horizontal = file
            .horizontal
            .ok_or_else(|| LidarError::config("missing required key 'horizontal'"))?;
        let vertical = file
            .vertical
            .ok_or_else(|| LidarError::config("missing required key 'vertical'"))?;

        if horizontal.is_empty() || vertical.is_empty() {
            return Err(LidarError::config(
                "'horizontal' and 'vertical' must list at least one variable name",
            ));
        }

        let mut channels = BTreeMap::new();
        for (format_id, defs) in variables {
            let mut list = Vec::with_capacity(defs.len());
            for (name, properties) in defs {
                if properties.is_empty() {
                    return Err(LidarError::config(format!(
                        "channel '{}' of format '{}' has no properties to match",
                        name, format_id
                    )));
                }
                list.push(ChannelDefinition { name, properties });
            }
            channels.insert(format_id, list);
        }

        let mut ratios = BTreeMap::new();
        for (format_id, defs) in file.lidar_ratios {
            let declared = channels.get(&format_id).ok_or_else(|| {
                LidarError::config(format!(
                    "ratios declared for unknown format '{}'",
                    format_id
                ))
            })?;
            let mut list = Vec::with_capacity(defs.len());
            for (name, mut def) in defs {
                for input in [&def.numerator, &def.denominator] {
                    if !declared.iter().any(|c| &c.name == input) {
                        return Err(LidarError::config(format!(
                            "ratio '{}' of format '{}' uses undeclared channel '{}'",
                            name, format_id, input
                        )));
                    }
                }
                def.name = name;
                list.push(def);
            }
            ratios.insert(format_id, list);
        }

        Ok(Self {
            channels,
            ratios,
            horizontal,
            vertical,
        })
    }

    /// Channel definitions of a format, empty if the format is unknown.
    pub fn channels(&self, format_id: &str) -> &[ChannelDefinition] {
        self.channels
            .get(format_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ratio definitions of a format, empty if none are declared.
    pub fn ratios(&self, format_id: &str) -> &[RatioDefinition] {
        self.ratios.get(format_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sorted identifiers of the columnar formats this catalog describes.
    pub fn supported_formats(&self) -> Vec<&str> {
        self.channels.keys().map(String::as_str).collect()
    }

    pub fn is_supported(&self, format_id: &str) -> bool {
        self.channels.contains_key(format_id)
    }

    /// Candidate names of the time variable.
    pub fn horizontal_variables(&self) -> &[String] {
        &self.horizontal
    }

    /// Candidate names of the range variable.
    pub fn vertical_variables(&self) -> &[String] {
        &self.vertical
    }

    pub fn is_horizontal(&self, name: &str) -> bool {
        self.horizontal.iter().any(|v| v == name)
    }

    pub fn is_vertical(&self, name: &str) -> bool {
        self.vertical.iter().any(|v| v == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "lidar_variables": {
            "als450": { "p01 - Pr2 355nm": { "wavelength": 355 } }
        },
        "horizontal": ["time"],
        "vertical": ["range", "alt"]
    }"#;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = FormatCatalog::builtin().unwrap();
        assert_eq!(catalog.supported_formats(), vec!["als450", "lna"]);
        assert_eq!(catalog.channels("lna").len(), 6);
        assert_eq!(catalog.ratios("lna").len(), 4);
        assert!(catalog.is_horizontal("time"));
        assert!(catalog.is_vertical("range"));
    }

    #[test]
    fn test_minimal_json() {
        let catalog = FormatCatalog::from_json_str(MINIMAL).unwrap();
        assert!(catalog.is_supported("als450"));
        assert!(!catalog.is_supported("lna"));
        assert!(catalog.ratios("als450").is_empty());
        assert!(catalog.channels("unknown").is_empty());

        let def = &catalog.channels("als450")[0];
        assert!(def.properties["wavelength"].matches_number(355.0));
        assert!(def.properties["wavelength"].matches_text("355"));
    }

    #[test]
    fn test_missing_required_key() {
        let err = FormatCatalog::from_json_str(r#"{"horizontal": ["time"], "vertical": ["range"]}"#)
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("lidar_variables"));

        let err = FormatCatalog::from_json_str(r#"{"lidar_variables": {}, "horizontal": ["time"]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("vertical"));
    }

    #[test]
    fn test_malformed_resource() {
        assert!(FormatCatalog::from_json_str("{ not json").unwrap_err().is_config());
        assert!(FormatCatalog::from_yaml_str("lidar_variables: [").unwrap_err().is_config());
    }

    #[test]
    fn test_ratio_with_undeclared_channel() {
        let content = r#"
lidar_variables:
  lna:
    a: { wavelength: "532" }
lidar_ratios:
  lna:
    r: { numerator: a, denominator: b }
horizontal: [time]
vertical: [range]
"#;
        let err = FormatCatalog::from_yaml_str(content).unwrap_err();
        assert!(err.to_string().contains("undeclared channel 'b'"));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("dataformats");
        std::fs::write(&json, MINIMAL).unwrap();
        assert!(FormatCatalog::load(&json).unwrap().is_supported("als450"));

        let missing = dir.path().join("absent.yaml");
        assert!(FormatCatalog::load(&missing).unwrap_err().is_config());
    }

    #[test]
    fn test_text_match_ignores_padding() {
        let value = PropertyValue::Text("NFOV".to_string());
        assert!(value.matches_text("NFOV\0\0"));
        assert!(value.matches_text(" NFOV "));
        assert!(!value.matches_text("WFOV"));
    }
}
