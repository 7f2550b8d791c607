//! Left spatial join of LSOAs onto electoral wards.
//!
//! The predicate is topological intersection: an LSOA that merely
//! touches a ward boundary still matches. Ward envelopes are indexed in
//! an R-tree so each LSOA only runs the exact intersection test against
//! candidate wards whose bounding boxes overlap its own.

use geo::{BoundingRect, Intersects, MultiPolygon};
use lsoa_dash_geo_models::{JoinedRecord, SmallArea, Ward};
use rstar::{AABB, RTree, RTreeObject};

use crate::GeoError;

/// A ward polygon stored in the R-tree with its identity and original
/// input position.
struct WardEntry {
    /// Position in the input slice; match ordering key.
    index: usize,
    code: String,
    name: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for WardEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Joins every small area against the wards it intersects.
///
/// Left join with respect to small areas: an area with no intersecting
/// ward produces exactly one row with `None` ward fields; an area
/// intersecting several wards produces one row per match. Output order
/// is deterministic (small areas in input order, matches in ward input
/// order), so identical inputs always yield identical output.
///
/// # Errors
///
/// Returns [`GeoError::EmptyCollection`] if either input is empty; no
/// partial table is produced.
pub fn join(small_areas: &[SmallArea], wards: &[Ward]) -> Result<Vec<JoinedRecord>, GeoError> {
    if small_areas.is_empty() {
        return Err(GeoError::EmptyCollection { label: "LSOA boundaries" });
    }
    if wards.is_empty() {
        return Err(GeoError::EmptyCollection { label: "ward boundaries" });
    }

    let entries: Vec<WardEntry> = wards
        .iter()
        .enumerate()
        .map(|(index, ward)| WardEntry {
            index,
            code: ward.code.clone(),
            name: ward.name.clone(),
            envelope: compute_envelope(&ward.geometry),
            polygon: ward.geometry.clone(),
        })
        .collect();
    let tree = RTree::bulk_load(entries);

    let mut records = Vec::with_capacity(small_areas.len());
    for area in small_areas {
        let query_env = compute_envelope(&area.geometry);

        let mut matches: Vec<&WardEntry> = tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.intersects(&area.geometry))
            .collect();
        // R-tree iteration order is unspecified; restore input order.
        matches.sort_by_key(|entry| entry.index);

        if matches.is_empty() {
            records.push(record_for(area, None));
        } else {
            for entry in matches {
                records.push(record_for(area, Some(entry)));
            }
        }
    }

    log::info!(
        "Joined {} LSOAs against {} wards into {} rows",
        small_areas.len(),
        wards.len(),
        records.len()
    );
    Ok(records)
}

/// Builds one joined row, dropping geometry and carrying the attribute
/// map through unaltered.
fn record_for(area: &SmallArea, ward: Option<&WardEntry>) -> JoinedRecord {
    JoinedRecord {
        area_code: area.code.clone(),
        area_name: area.name.clone(),
        ward_code: ward.map(|w| w.code.clone()),
        ward_name: ward.map(|w| w.name.clone()),
        attributes: area.attributes.clone(),
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Polygon};
    use lsoa_dash_geo_models::{AttributeMap, AttributeValue};

    use super::*;

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
                (min_x, min_y),
            ]),
            vec![],
        )])
    }

    fn area(code: &str, geometry: MultiPolygon<f64>) -> SmallArea {
        let mut attributes = AttributeMap::new();
        attributes.insert("total_crime".to_string(), AttributeValue::Number(7.0));
        SmallArea {
            code: code.to_string(),
            name: format!("Barnet {code}"),
            geometry,
            attributes,
        }
    }

    fn ward(code: &str, name: &str, geometry: MultiPolygon<f64>) -> Ward {
        Ward {
            code: code.to_string(),
            name: name.to_string(),
            geometry,
        }
    }

    #[test]
    fn every_small_area_appears_at_least_once() {
        let areas = vec![
            area("E01000001", square(0.0, 0.0, 1.0, 1.0)),
            area("E01000002", square(50.0, 50.0, 51.0, 51.0)),
        ];
        let wards = vec![ward("E05000046", "Burnt Oak", square(0.5, 0.5, 2.0, 2.0))];

        let records = join(&areas, &wards).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.area_code == "E01000001"));
        assert!(records.iter().any(|r| r.area_code == "E01000002"));
    }

    #[test]
    fn area_without_ward_gets_one_row_with_null_ward_fields() {
        let areas = vec![area("E01000002", square(50.0, 50.0, 51.0, 51.0))];
        let wards = vec![ward("E05000046", "Burnt Oak", square(0.0, 0.0, 1.0, 1.0))];

        let records = join(&areas, &wards).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ward_code, None);
        assert_eq!(records[0].ward_name, None);
        // Attributes pass through the join unaltered.
        assert_eq!(records[0].numeric("total_crime"), Some(7.0));
    }

    #[test]
    fn area_spanning_two_wards_is_row_multiplied() {
        let areas = vec![area("E01000003", square(0.0, 0.0, 2.0, 1.0))];
        let wards = vec![
            ward("E05000046", "Burnt Oak", square(0.0, 0.0, 1.0, 1.0)),
            ward("E05000047", "Colindale", square(1.0, 0.0, 2.0, 1.0)),
        ];

        let records = join(&areas, &wards).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ward_name.as_deref(), Some("Burnt Oak"));
        assert_eq!(records[1].ward_name.as_deref(), Some("Colindale"));
        // Rows differ only in ward fields.
        assert_eq!(records[0].area_code, records[1].area_code);
        assert_eq!(records[0].attributes, records[1].attributes);
    }

    #[test]
    fn touching_boundary_counts_as_a_match() {
        let areas = vec![area("E01000004", square(0.0, 0.0, 1.0, 1.0))];
        // Shares only the edge x=1 with the area.
        let wards = vec![ward("E05000048", "Edgware", square(1.0, 0.0, 2.0, 1.0))];

        let records = join(&areas, &wards).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ward_name.as_deref(), Some("Edgware"));
    }

    #[test]
    fn join_is_deterministic() {
        let areas = vec![
            area("E01000001", square(0.0, 0.0, 2.0, 2.0)),
            area("E01000002", square(1.0, 1.0, 3.0, 3.0)),
        ];
        let wards = vec![
            ward("E05000046", "Burnt Oak", square(0.0, 0.0, 1.5, 1.5)),
            ward("E05000047", "Colindale", square(1.5, 1.5, 3.0, 3.0)),
        ];

        let first = join(&areas, &wards).unwrap();
        let second = join(&areas, &wards).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_inputs_fail_without_partial_output() {
        let areas = vec![area("E01000001", square(0.0, 0.0, 1.0, 1.0))];
        let wards = vec![ward("E05000046", "Burnt Oak", square(0.0, 0.0, 1.0, 1.0))];

        assert!(matches!(join(&[], &wards), Err(GeoError::EmptyCollection { .. })));
        assert!(matches!(join(&areas, &[]), Err(GeoError::EmptyCollection { .. })));
    }
}
