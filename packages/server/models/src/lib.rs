#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the LSOA dashboard server.
//!
//! These types are serialized to JSON for the REST API. They are
//! separate from the pipeline record types to allow independent
//! evolution of the API contract.

use lsoa_dash_choropleth::ColorBucket;
use lsoa_dash_crime_models::{CrimeCategory, CrimeIncident};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// One colored region of a choropleth rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethRegion {
    /// ONS LSOA code.
    pub area_code: String,
    /// LSOA name.
    pub area_name: String,
    /// Attribute value for the area.
    pub value: f64,
    /// Assigned tier hex color.
    pub color: &'static str,
}

/// `GET /api/choropleth/{attribute}` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethResponse {
    /// The rendered attribute.
    pub attribute: String,
    /// Decile thresholds, ascending.
    pub thresholds: Vec<f64>,
    /// Legend tiers, lowest first.
    pub legend: Vec<ColorBucket>,
    /// One entry per distinct LSOA.
    pub regions: Vec<ChoroplethRegion>,
}

/// A live incident as returned by the API, flattened for the heatmap
/// layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLiveIncident {
    /// Street-crime category.
    pub category: CrimeCategory,
    /// Map marker color for the category.
    pub marker_color: &'static str,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

impl From<&CrimeIncident> for ApiLiveIncident {
    fn from(incident: &CrimeIncident) -> Self {
        Self {
            category: incident.category,
            marker_color: incident.category.marker_color(),
            latitude: incident.position.lat,
            longitude: incident.position.lon,
        }
    }
}

/// `GET /api/live-crimes` response.
///
/// `available` distinguishes a failed fetch from a genuinely empty
/// month; both carry an empty incident list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveCrimeResponse {
    /// The requested month.
    pub month: String,
    /// `false` when the upstream fetch failed.
    pub available: bool,
    /// Incidents for the month, filtered by category if requested.
    pub incidents: Vec<ApiLiveIncident>,
    /// Distinct categories present in the unfiltered result, for the
    /// category dropdown.
    pub categories: Vec<CrimeCategory>,
}

/// Query parameters for `GET /api/live-crimes`.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveCrimeParams {
    /// Month to fetch, `YYYY-MM`.
    pub month: String,
    /// Optional category label filter; absent means all crime.
    pub category: Option<String>,
}

/// Query parameters for `GET /api/area-info`.
#[derive(Debug, Clone, Deserialize)]
pub struct AreaInfoParams {
    /// Case-insensitive LSOA name substring.
    pub name: String,
    /// Attribute to report and rank by.
    pub attribute: String,
}

/// Query parameters for `GET /api/correlations`.
#[derive(Debug, Clone, Deserialize)]
pub struct CorrelationParams {
    /// Target attribute.
    pub attribute: String,
    /// Optional ward name restricting the sample; absent means the
    /// whole borough.
    pub ward: Option<String>,
}

#[cfg(test)]
mod tests {
    use lsoa_dash_crime_models::LatLon;

    use super::*;

    #[test]
    fn live_incident_carries_its_marker_color() {
        let incident = CrimeIncident {
            category: CrimeCategory::Burglary,
            position: LatLon { lat: 51.6, lon: -0.2 },
            month: Some("2024-01".to_string()),
        };
        let api: ApiLiveIncident = (&incident).into();
        assert_eq!(api.marker_color, "purple");
        assert!((api.latitude - 51.6).abs() < f64::EPSILON);
    }
}
