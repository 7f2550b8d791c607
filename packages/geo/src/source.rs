//! Remote `GeoJSON` boundary loading.
//!
//! The LSOA document carries the census attribute columns in its feature
//! properties; the ward document only carries ward identity. Both are
//! fetched once at startup. Decoding is strict: a feature without a
//! geometry or without its identity properties fails the whole document
//! load so that no partial table ever reaches the join.

use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson};
use lsoa_dash_geo_models::{
    AttributeMap, AttributeValue, LSOA_CODE_KEY, LSOA_NAME_KEY, SmallArea, WARD_CODE_KEY,
    WARD_NAME_KEY, Ward,
};

use crate::GeoError;

/// CRS label assumed when a document declares none. `GeoJSON` without a
/// `crs` member is WGS84 by definition.
const DEFAULT_CRS: &str = "EPSG:4326";

/// Fetches and decodes both boundary documents.
///
/// The declared coordinate reference systems of the two documents must
/// agree before the join may run; a mismatch is an explicit error, never
/// an assumption.
///
/// # Errors
///
/// Returns [`GeoError`] if either fetch fails, either document is not a
/// well-formed feature collection, any feature is malformed, either
/// collection is empty, or the declared CRSs differ.
pub async fn load_boundaries(
    client: &reqwest::Client,
    lsoa_url: &str,
    wards_url: &str,
) -> Result<(Vec<SmallArea>, Vec<Ward>), GeoError> {
    log::info!("Loading LSOA boundaries from {lsoa_url}");
    let lsoa_text = client.get(lsoa_url).send().await?.error_for_status()?.text().await?;
    log::info!("Loading ward boundaries from {wards_url}");
    let wards_text = client.get(wards_url).send().await?.error_for_status()?.text().await?;

    let lsoa_fc = parse_feature_collection(&lsoa_text)?;
    let wards_fc = parse_feature_collection(&wards_text)?;
    ensure_common_crs(&lsoa_fc, &wards_fc)?;

    let small_areas = decode_small_areas(&lsoa_fc)?;
    let wards = decode_wards(&wards_fc)?;
    log::info!(
        "Loaded {} LSOA boundaries and {} ward boundaries",
        small_areas.len(),
        wards.len()
    );

    Ok((small_areas, wards))
}

/// Parses a `GeoJSON` string into a [`FeatureCollection`].
///
/// # Errors
///
/// Returns [`GeoError`] if the string is not valid `GeoJSON` or is a
/// bare geometry/feature rather than a collection.
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection, GeoError> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(GeoError::Malformed {
            message: "expected a FeatureCollection document".to_string(),
        }),
    }
}

/// Returns the CRS a feature collection declares via its legacy `crs`
/// foreign member, normalized; absent means WGS84.
#[must_use]
pub fn declared_crs(fc: &FeatureCollection) -> String {
    let name = fc
        .foreign_members
        .as_ref()
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(serde_json::Value::as_str);

    match name {
        None => DEFAULT_CRS.to_string(),
        Some(name) if name.contains("CRS84") || name.contains("4326") => DEFAULT_CRS.to_string(),
        Some(name) => name.to_string(),
    }
}

/// Verifies both documents share one CRS.
fn ensure_common_crs(lsoa: &FeatureCollection, wards: &FeatureCollection) -> Result<(), GeoError> {
    let lsoa_crs = declared_crs(lsoa);
    let wards_crs = declared_crs(wards);
    if lsoa_crs == wards_crs {
        if lsoa_crs != DEFAULT_CRS {
            log::warn!("Boundary documents share non-WGS84 CRS {lsoa_crs}");
        }
        Ok(())
    } else {
        Err(GeoError::CrsMismatch {
            lsoa: lsoa_crs,
            wards: wards_crs,
        })
    }
}

/// Decodes LSOA features into [`SmallArea`] records.
///
/// Every property other than the code/name identity keys becomes an
/// attribute column.
///
/// # Errors
///
/// Returns [`GeoError`] if the collection is empty or any feature lacks
/// a geometry, a polygonal geometry type, or its identity properties.
pub fn decode_small_areas(fc: &FeatureCollection) -> Result<Vec<SmallArea>, GeoError> {
    if fc.features.is_empty() {
        return Err(GeoError::EmptyCollection { label: "LSOA boundaries" });
    }

    fc.features
        .iter()
        .map(|feature| {
            let code = require_string_property(feature, LSOA_CODE_KEY)?;
            let name = require_string_property(feature, LSOA_NAME_KEY)?;
            let geometry = feature_multipolygon(feature, &code)?;
            let attributes = attribute_map(feature, &[LSOA_CODE_KEY, LSOA_NAME_KEY]);
            Ok(SmallArea {
                code,
                name,
                geometry,
                attributes,
            })
        })
        .collect()
}

/// Decodes ward features into [`Ward`] records.
///
/// # Errors
///
/// Returns [`GeoError`] if the collection is empty or any feature lacks
/// a geometry, a polygonal geometry type, or its identity properties.
pub fn decode_wards(fc: &FeatureCollection) -> Result<Vec<Ward>, GeoError> {
    if fc.features.is_empty() {
        return Err(GeoError::EmptyCollection { label: "ward boundaries" });
    }

    fc.features
        .iter()
        .map(|feature| {
            let code = require_string_property(feature, WARD_CODE_KEY)?;
            let name = require_string_property(feature, WARD_NAME_KEY)?;
            let geometry = feature_multipolygon(feature, &code)?;
            Ok(Ward {
                code,
                name,
                geometry,
            })
        })
        .collect()
}

/// Extracts a required string-valued property from a feature.
fn require_string_property(feature: &geojson::Feature, key: &str) -> Result<String, GeoError> {
    feature
        .properties
        .as_ref()
        .and_then(|props| props.get(key))
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| GeoError::Malformed {
            message: format!("feature is missing required property {key}"),
        })
}

/// Converts a feature's geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn feature_multipolygon(
    feature: &geojson::Feature,
    code: &str,
) -> Result<MultiPolygon<f64>, GeoError> {
    let geometry = feature.geometry.clone().ok_or_else(|| GeoError::Malformed {
        message: format!("feature {code} is missing its geometry"),
    })?;

    let geo_geom: geo::Geometry<f64> = geometry.try_into()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        other => Err(GeoError::Malformed {
            message: format!(
                "feature {code} has non-polygonal geometry {:?}",
                std::mem::discriminant(&other)
            ),
        }),
    }
}

/// Collects every non-identity property into the attribute map.
///
/// Numbers become [`AttributeValue::Number`], strings become
/// [`AttributeValue::Text`]; nulls and nested values are skipped.
fn attribute_map(feature: &geojson::Feature, exclude: &[&str]) -> AttributeMap {
    let mut attributes = AttributeMap::new();
    let Some(props) = feature.properties.as_ref() else {
        return attributes;
    };

    for (key, value) in props {
        if exclude.contains(&key.as_str()) {
            continue;
        }
        match value {
            serde_json::Value::Number(n) => {
                if let Some(n) = n.as_f64() {
                    attributes.insert(key.clone(), AttributeValue::Number(n));
                }
            }
            serde_json::Value::String(s) => {
                attributes.insert(key.clone(), AttributeValue::Text(s.clone()));
            }
            _ => {}
        }
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lsoa_doc() -> &'static str {
        r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {
                    "LSOA21CD": "E01000001",
                    "LSOA21NM": "Barnet 001A",
                    "Population": 1800,
                    "total_crime": 42,
                    "Class": "urban"
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                }
            }]
        }"#
    }

    #[test]
    fn decodes_small_area_with_attributes() {
        let fc = parse_feature_collection(lsoa_doc()).unwrap();
        let areas = decode_small_areas(&fc).unwrap();

        assert_eq!(areas.len(), 1);
        let area = &areas[0];
        assert_eq!(area.code, "E01000001");
        assert_eq!(area.name, "Barnet 001A");
        assert_eq!(area.attributes.get("Population"), Some(&AttributeValue::Number(1800.0)));
        assert_eq!(area.attributes.get("total_crime"), Some(&AttributeValue::Number(42.0)));
        assert_eq!(
            area.attributes.get("Class"),
            Some(&AttributeValue::Text("urban".to_string()))
        );
        // Identity keys are not duplicated into the attribute map.
        assert!(!area.attributes.contains_key(LSOA_CODE_KEY));
    }

    #[test]
    fn missing_geometry_fails_the_document() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"LSOA21CD": "E01000001", "LSOA21NM": "Barnet 001A"},
                "geometry": null
            }]
        }"#;
        let fc = parse_feature_collection(doc).unwrap();
        let err = decode_small_areas(&fc).unwrap_err();
        assert!(matches!(err, GeoError::Malformed { .. }));
    }

    #[test]
    fn empty_collection_is_an_error() {
        let fc = parse_feature_collection(r#"{"type": "FeatureCollection", "features": []}"#)
            .unwrap();
        assert!(matches!(
            decode_small_areas(&fc),
            Err(GeoError::EmptyCollection { .. })
        ));
    }

    #[test]
    fn non_collection_document_is_rejected() {
        let err = parse_feature_collection(
            r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GeoError::Malformed { .. }));
    }

    #[test]
    fn crs_defaults_to_wgs84_and_mismatch_is_detected() {
        let plain = parse_feature_collection(lsoa_doc()).unwrap();
        assert_eq!(declared_crs(&plain), "EPSG:4326");

        let projected = parse_feature_collection(
            r#"{
                "type": "FeatureCollection",
                "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::27700"}},
                "features": [{
                    "type": "Feature",
                    "properties": {"WardName": "Burnt Oak", "ONSWardCode": "E05000046"},
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                    }
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(declared_crs(&projected), "urn:ogc:def:crs:EPSG::27700");

        assert!(matches!(
            ensure_common_crs(&plain, &projected),
            Err(GeoError::CrsMismatch { .. })
        ));
    }
}
