#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ranked bar, rank-lookup, and correlation computations over the
//! joined LSOA/ward table.
//!
//! The joined table is row-multiplied (one row per LSOA/ward match), so
//! every per-area statistic here deduplicates by LSOA code first; only
//! the bar views operate on raw rows. All functions are pure reads of
//! the immutable table.
//!
//! Asking for an attribute the loaded schema does not carry is a caller
//! bug and fails loudly with [`StatsError`], never an empty chart.

use std::collections::BTreeMap;

use lsoa_dash_geo_models::JoinedRecord;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by statistics computations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// The requested attribute is absent (or never numeric) in the
    /// loaded schema.
    #[error("Unknown numeric attribute {name}")]
    UnknownAttribute {
        /// The attribute that was requested.
        name: String,
    },

    /// The selection (table or ward filter) contains no rows.
    #[error("Empty selection: {context}")]
    EmptySelection {
        /// What was being selected.
        context: String,
    },
}

/// One bar of the per-LSOA bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRow {
    /// ONS LSOA code.
    pub area_code: String,
    /// LSOA name.
    pub area_name: String,
    /// Ward the row was joined to, if any.
    pub ward_name: Option<String>,
    /// Attribute value.
    pub value: f64,
}

/// One bar of the per-ward totals chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WardTotal {
    /// Ward name.
    pub ward_name: String,
    /// Sum of the attribute over the ward's joined rows.
    pub total: f64,
}

/// Rank information for one LSOA, for the name-lookup panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaInfo {
    /// LSOA name as stored.
    pub area_name: String,
    /// Ward the area belongs to, if any.
    pub ward_name: Option<String>,
    /// Attribute value for the area.
    pub value: f64,
    /// Descending min-method rank (1 = highest value).
    pub rank: usize,
    /// Number of distinct LSOAs ranked.
    pub total_areas: usize,
}

/// One scatter panel: an attribute correlated against the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPanel {
    /// The correlated attribute.
    pub attribute: String,
    /// Pearson correlation coefficient against the target.
    pub r: f64,
    /// Sample values of this attribute (x axis).
    pub xs: Vec<f64>,
    /// Paired target values (y axis).
    pub ys: Vec<f64>,
}

/// Rows sorted descending by `attribute`, for the LSOA bar chart.
///
/// Operates on raw joined rows: an LSOA in two wards contributes two
/// bars, matching the joined table the user sees.
///
/// # Errors
///
/// Returns [`StatsError`] if the table is empty or no row carries the
/// attribute as a number.
pub fn ranked_areas(
    records: &[JoinedRecord],
    attribute: &str,
) -> Result<Vec<RankedRow>, StatsError> {
    let rows = numeric_rows(records, attribute)?;

    let mut ranked: Vec<RankedRow> = rows
        .into_iter()
        .map(|(record, value)| RankedRow {
            area_code: record.area_code.clone(),
            area_name: record.area_name.clone(),
            ward_name: record.ward_name.clone(),
            value,
        })
        .collect();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    Ok(ranked)
}

/// One value per distinct LSOA, in table order, for choropleth
/// coloring.
///
/// Deduplicates by LSOA code so row multiplication from the join cannot
/// skew the percentile thresholds.
///
/// # Errors
///
/// Returns [`StatsError`] if the table is empty or no row carries the
/// attribute as a number.
pub fn area_values(
    records: &[JoinedRecord],
    attribute: &str,
) -> Result<Vec<RankedRow>, StatsError> {
    let unique = dedup_by_area(records);
    let rows = numeric_rows(&unique, attribute)?;

    Ok(rows
        .into_iter()
        .map(|(record, value)| RankedRow {
            area_code: record.area_code.clone(),
            area_name: record.area_name.clone(),
            ward_name: record.ward_name.clone(),
            value,
        })
        .collect())
}

/// Per-ward sums of `attribute`, descending, for the ward bar chart.
///
/// Rows that joined to no ward are skipped; they have no bar to land in.
///
/// # Errors
///
/// Returns [`StatsError`] if the table is empty or no row carries the
/// attribute as a number.
pub fn ward_totals(
    records: &[JoinedRecord],
    attribute: &str,
) -> Result<Vec<WardTotal>, StatsError> {
    let rows = numeric_rows(records, attribute)?;

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for (record, value) in rows {
        if let Some(ward) = record.ward_name.as_deref() {
            *totals.entry(ward).or_insert(0.0) += value;
        }
    }

    let mut out: Vec<WardTotal> = totals
        .into_iter()
        .map(|(ward_name, total)| WardTotal {
            ward_name: ward_name.to_string(),
            total,
        })
        .collect();
    out.sort_by(|a, b| b.total.total_cmp(&a.total));
    Ok(out)
}

/// Looks up one LSOA by case-insensitive name substring and ranks it.
///
/// Deduplicates by LSOA code before ranking, so row multiplication from
/// the join cannot inflate ranks. Rank is min-method descending: rank 1
/// is the highest value, ties share the smaller rank. `Ok(None)` means
/// the query matched no rankable area: either no name contains the
/// query, or the only matching area lacks the attribute and so has no
/// place in the ranking.
///
/// # Errors
///
/// Returns [`StatsError`] if the table is empty or no row carries the
/// attribute as a number.
pub fn area_rank(
    records: &[JoinedRecord],
    name_query: &str,
    attribute: &str,
) -> Result<Option<AreaInfo>, StatsError> {
    let unique = dedup_by_area(records);
    let rows = numeric_rows(&unique, attribute)?;

    let query = name_query.trim().to_lowercase();
    let Some((matched, value)) = rows
        .iter()
        .find(|(record, _)| record.area_name.to_lowercase().contains(&query))
        .map(|(record, value)| ((*record).clone(), *value))
    else {
        return Ok(None);
    };

    let rank = 1 + rows.iter().filter(|(_, v)| *v > value).count();

    Ok(Some(AreaInfo {
        area_name: matched.area_name,
        ward_name: matched.ward_name,
        value,
        rank,
        total_areas: rows.len(),
    }))
}

/// Top-`k` attributes most correlated with `target`, with paired sample
/// vectors for scatter plots.
///
/// Computed over deduplicated LSOA rows, optionally restricted to one
/// ward. The target itself is excluded; its self-correlation of 1.0
/// carries no information. Attributes with fewer than two paired
/// samples or an undefined coefficient (zero variance) are skipped.
///
/// # Errors
///
/// Returns [`StatsError`] if the ward filter matches no rows, or the
/// target attribute is unknown in the selection.
pub fn top_correlations(
    records: &[JoinedRecord],
    target: &str,
    ward_filter: Option<&str>,
    k: usize,
) -> Result<Vec<CorrelationPanel>, StatsError> {
    let selected: Vec<JoinedRecord> = match ward_filter {
        Some(ward) => records
            .iter()
            .filter(|r| r.ward_name.as_deref() == Some(ward))
            .cloned()
            .collect(),
        None => records.to_vec(),
    };
    if selected.is_empty() {
        return Err(StatsError::EmptySelection {
            context: ward_filter.map_or_else(
                || "joined table".to_string(),
                |ward| format!("ward {ward}"),
            ),
        });
    }

    let unique = dedup_by_area(&selected);
    // Verify the target exists before scanning other columns.
    numeric_rows(&unique, target)?;

    let mut candidates: Vec<&String> = unique
        .iter()
        .flat_map(|record| record.attributes.keys())
        .filter(|key| key.as_str() != target)
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    let mut panels = Vec::new();
    for attribute in candidates {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for record in &unique {
            if let (Some(x), Some(y)) = (record.numeric(attribute), record.numeric(target)) {
                xs.push(x);
                ys.push(y);
            }
        }
        if xs.len() < 2 {
            continue;
        }
        if let Some(r) = pearson(&xs, &ys) {
            panels.push(CorrelationPanel {
                attribute: attribute.clone(),
                r,
                xs,
                ys,
            });
        }
    }

    panels.sort_by(|a, b| b.r.total_cmp(&a.r));
    panels.truncate(k);
    Ok(panels)
}

/// Keeps the first joined row per LSOA code.
fn dedup_by_area(records: &[JoinedRecord]) -> Vec<JoinedRecord> {
    let mut seen = Vec::new();
    let mut unique = Vec::new();
    for record in records {
        if !seen.contains(&record.area_code) {
            seen.push(record.area_code.clone());
            unique.push(record.clone());
        }
    }
    unique
}

/// Pairs each row with its numeric value for `attribute`.
///
/// Rows without the attribute (or with a text value there) are skipped;
/// if that skips everything, the attribute is unknown to the schema.
fn numeric_rows<'a>(
    records: &'a [JoinedRecord],
    attribute: &str,
) -> Result<Vec<(&'a JoinedRecord, f64)>, StatsError> {
    if records.is_empty() {
        return Err(StatsError::EmptySelection {
            context: "joined table".to_string(),
        });
    }

    let rows: Vec<(&JoinedRecord, f64)> = records
        .iter()
        .filter_map(|record| record.numeric(attribute).map(|value| (record, value)))
        .collect();

    if rows.is_empty() {
        return Err(StatsError::UnknownAttribute {
            name: attribute.to_string(),
        });
    }
    Ok(rows)
}

/// Pearson correlation coefficient. `None` when either side has zero
/// variance or the result is not finite.
fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    debug_assert_eq!(xs.len(), ys.len());

    #[allow(clippy::cast_precision_loss)]
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return None;
    }
    let r = cov / denom;
    r.is_finite().then_some(r)
}
