#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the LSOA dashboard.
//!
//! Loads the boundary documents and the historical crime extract once at
//! startup into an immutable [`AppContext`], then serves the joined
//! table, choropleth colorings, bar/correlation statistics, and the live
//! street-crime feed to the browser frontend. Each pipeline stage loads
//! independently: a failed stage leaves its slot `None` and the affected
//! endpoints answer "data unavailable" instead of crashing the process.

pub mod handlers;

use std::collections::BTreeSet;
use std::sync::Arc;

use lsoa_dash_crime::{indexer, police::LiveCrimeFetcher};
use lsoa_dash_crime_models::{CrimeCategory, CrimeIncident};
use lsoa_dash_diag::{Diagnostic, DiagnosticSink, Stage};
use lsoa_dash_geo::{join, source};
use lsoa_dash_geo_models::JoinedRecord;

/// Published LSOA boundary document with census attribute columns.
const DEFAULT_LSOA_URL: &str =
    "https://raw.githubusercontent.com/samab74/Barnet-Dashboard/main/lsoa_with_crime_counts.geojson";

/// Published electoral ward boundary document.
const DEFAULT_WARDS_URL: &str =
    "https://raw.githubusercontent.com/samab74/Barnet-Dashboard/main/OSBoundaryLine%20-%20BarnetWards.geojson";

/// Published historical crime extract.
const DEFAULT_CRIME_CSV_URL: &str =
    "https://raw.githubusercontent.com/samab74/Barnet-Dashboard/main/barnet_crimes.csv";

/// Dataset locations, overridable per deployment.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// LSOA boundary document URL.
    pub lsoa_url: String,
    /// Ward boundary document URL.
    pub wards_url: String,
    /// Historical crime CSV URL.
    pub crime_csv_url: String,
}

impl DashboardConfig {
    /// Reads dataset URLs from the environment, falling back to the
    /// published defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            lsoa_url: std::env::var("LSOA_GEOJSON_URL")
                .unwrap_or_else(|_| DEFAULT_LSOA_URL.to_string()),
            wards_url: std::env::var("WARDS_GEOJSON_URL")
                .unwrap_or_else(|_| DEFAULT_WARDS_URL.to_string()),
            crime_csv_url: std::env::var("CRIME_CSV_URL")
                .unwrap_or_else(|_| DEFAULT_CRIME_CSV_URL.to_string()),
        }
    }
}

/// The joined LSOA/ward table and its numeric attribute schema.
pub struct BoundaryData {
    /// The joined table, one row per LSOA/ward match.
    pub joined: Vec<JoinedRecord>,
    /// Numeric attribute columns available for maps and charts.
    pub attributes: Vec<String>,
}

/// The indexed historical crime extract.
pub struct HistoricalData {
    /// Incidents with parsed coordinates.
    pub incidents: Vec<CrimeIncident>,
    /// Distinct categories, first-appearance order.
    pub categories: Vec<CrimeCategory>,
}

/// Process-wide read-only state, built once at startup and shared by
/// reference into every handler. Never re-fetched or mutated per
/// request.
pub struct AppContext {
    /// Joined boundary table; `None` if the boundary stage failed.
    pub boundaries: Option<BoundaryData>,
    /// Historical incidents; `None` if the historical stage failed.
    pub historical: Option<HistoricalData>,
}

impl AppContext {
    /// Loads both pipeline stages.
    ///
    /// Stage failures are logged, reported to the sink, and leave the
    /// stage `None`; they never abort startup.
    pub async fn load(
        client: &reqwest::Client,
        config: &DashboardConfig,
        sink: &dyn DiagnosticSink,
    ) -> Self {
        let boundaries =
            match source::load_boundaries(client, &config.lsoa_url, &config.wards_url).await {
                Ok((small_areas, wards)) => match join::join(&small_areas, &wards) {
                    Ok(joined) => {
                        let attributes = numeric_attributes(&joined);
                        Some(BoundaryData { joined, attributes })
                    }
                    Err(e) => {
                        log::error!("Spatial join failed: {e}");
                        sink.record(Diagnostic::FetchFailure {
                            stage: Stage::BoundaryLoad,
                            message: e.to_string(),
                        });
                        None
                    }
                },
                Err(e) => {
                    log::error!("Boundary load failed: {e}");
                    sink.record(Diagnostic::FetchFailure {
                        stage: Stage::BoundaryLoad,
                        message: e.to_string(),
                    });
                    None
                }
            };

        let historical = match indexer::load_remote(client, &config.crime_csv_url, sink).await {
            Ok(incidents) => {
                let categories = indexer::categories(&incidents);
                Some(HistoricalData {
                    incidents,
                    categories,
                })
            }
            Err(e) => {
                log::error!("Historical crime load failed: {e}");
                sink.record(Diagnostic::FetchFailure {
                    stage: Stage::HistoricalIndex,
                    message: e.to_string(),
                });
                None
            }
        };

        Self {
            boundaries,
            historical,
        }
    }
}

/// Collects the union of numeric attribute columns across the joined
/// table, sorted by column name.
fn numeric_attributes(joined: &[JoinedRecord]) -> Vec<String> {
    let mut columns = BTreeSet::new();
    for record in joined {
        for (key, value) in &record.attributes {
            if value.as_number().is_some() {
                columns.insert(key.clone());
            }
        }
    }
    columns.into_iter().collect()
}

/// Shared application state.
pub struct AppState {
    /// Immutable pipeline output.
    pub context: Arc<AppContext>,
    /// Live street-crime client.
    pub fetcher: LiveCrimeFetcher,
    /// Diagnostic sink for per-request failures.
    pub sink: Arc<dyn DiagnosticSink>,
}
