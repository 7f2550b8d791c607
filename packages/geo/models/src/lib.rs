#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Boundary and joined-table record types for the LSOA dashboard.
//!
//! The 2021 census extract attaches several dozen attribute columns to
//! each LSOA (deprivation dimensions, qualifications, ethnicity,
//! economic activity, population, total crime count). Rather than one
//! struct field per census column, attributes are carried as a named
//! map of [`AttributeValue`]s keyed by the source column name.

use std::collections::BTreeMap;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Property key for the LSOA code on boundary features.
pub const LSOA_CODE_KEY: &str = "LSOA21CD";
/// Property key for the LSOA name on boundary features.
pub const LSOA_NAME_KEY: &str = "LSOA21NM";
/// Property key for the ward ONS code on ward boundary features.
pub const WARD_CODE_KEY: &str = "ONSWardCode";
/// Property key for the ward name on ward boundary features.
pub const WARD_NAME_KEY: &str = "WardName";

/// One census attribute value: most columns are counts, a few are
/// free-text classifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Numeric column (counts, population, crime totals).
    Number(f64),
    /// Categorical/text column.
    Text(String),
}

impl AttributeValue {
    /// Returns the numeric value, or `None` for text attributes.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Map of census attribute columns keyed by source column name.
///
/// `BTreeMap` keeps column iteration order stable, which keeps joined
/// output and correlation panels deterministic across runs.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A Lower-layer Super Output Area boundary with its census attributes.
///
/// Immutable once loaded; the geometry is only consulted during the
/// spatial join and never reaches the joined table.
#[derive(Debug, Clone, PartialEq)]
pub struct SmallArea {
    /// ONS LSOA code (e.g. `"E01000123"`).
    pub code: String,
    /// Human-readable LSOA name (e.g. `"Barnet 001A"`).
    pub name: String,
    /// Boundary polygon(s), WGS84 lon/lat degrees.
    pub geometry: MultiPolygon<f64>,
    /// Census attribute columns from the boundary document properties.
    pub attributes: AttributeMap,
}

/// An electoral ward boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Ward {
    /// ONS ward code.
    pub code: String,
    /// Ward name.
    pub name: String,
    /// Boundary polygon(s), WGS84 lon/lat degrees.
    pub geometry: MultiPolygon<f64>,
}

/// One row of the joined LSOA/ward table.
///
/// Left-join semantics: an LSOA intersecting no ward keeps `None` ward
/// fields; an LSOA intersecting several wards appears once per match
/// with identical attribute values. Geometry is dropped at this point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedRecord {
    /// ONS LSOA code.
    pub area_code: String,
    /// LSOA name.
    pub area_name: String,
    /// ONS code of the intersecting ward, if any.
    pub ward_code: Option<String>,
    /// Name of the intersecting ward, if any.
    pub ward_name: Option<String>,
    /// Census attributes carried over unaltered from the [`SmallArea`].
    pub attributes: AttributeMap,
}

impl JoinedRecord {
    /// Returns the named attribute as a number, or `None` if the column
    /// is absent or textual.
    #[must_use]
    pub fn numeric(&self, attribute: &str) -> Option<f64> {
        self.attributes.get(attribute).and_then(AttributeValue::as_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_lookup_skips_text_attributes() {
        let mut attributes = AttributeMap::new();
        attributes.insert("Population".to_string(), AttributeValue::Number(1800.0));
        attributes.insert("Class".to_string(), AttributeValue::Text("urban".to_string()));

        let record = JoinedRecord {
            area_code: "E01000001".to_string(),
            area_name: "Barnet 001A".to_string(),
            ward_code: None,
            ward_name: None,
            attributes,
        };

        assert_eq!(record.numeric("Population"), Some(1800.0));
        assert_eq!(record.numeric("Class"), None);
        assert_eq!(record.numeric("Missing"), None);
    }

    #[test]
    fn attribute_value_serializes_untagged() {
        let n = serde_json::to_string(&AttributeValue::Number(3.0)).unwrap();
        assert_eq!(n, "3.0");
        let t = serde_json::to_string(&AttributeValue::from("urban")).unwrap();
        assert_eq!(t, "\"urban\"");
    }
}
