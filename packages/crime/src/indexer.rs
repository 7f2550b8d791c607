//! Historical crime extract indexing.
//!
//! The borough extract is a CSV with (at least) `category` and
//! `location` columns. Rows whose location cannot be parsed are dropped
//! and reported to the diagnostic sink; a missing required column fails
//! the whole load.

use std::io::Read;

use lsoa_dash_crime_models::{CrimeCategory, CrimeIncident};
use lsoa_dash_diag::{Diagnostic, DiagnosticSink, Stage};

use crate::{CrimeError, location::parse_location};

/// Indexes the historical extract from any CSV reader.
///
/// # Errors
///
/// Returns [`CrimeError`] if the CSV cannot be read or lacks the
/// `category` or `location` column.
pub fn index_csv<R: Read>(
    reader: R,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<CrimeIncident>, CrimeError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let category_idx = headers
        .iter()
        .position(|h| h == "category")
        .ok_or(CrimeError::MissingColumn { name: "category" })?;
    let location_idx = headers
        .iter()
        .position(|h| h == "location")
        .ok_or(CrimeError::MissingColumn { name: "location" })?;

    let mut incidents = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let label = record.get(category_idx).unwrap_or_default();
        let raw_location = record.get(location_idx).unwrap_or_default();

        if let Some(position) = parse_location(raw_location) {
            incidents.push(CrimeIncident {
                category: CrimeCategory::from_label(label),
                position,
                month: None,
            });
        } else {
            sink.record(Diagnostic::DroppedRecord {
                stage: Stage::HistoricalIndex,
                detail: format!("unparseable location {raw_location:?}"),
            });
        }
    }

    log::info!("Indexed {} historical incidents", incidents.len());
    Ok(incidents)
}

/// Fetches the historical extract over HTTP and indexes it.
///
/// # Errors
///
/// Returns [`CrimeError`] if the download fails or the CSV is
/// malformed.
pub async fn load_remote(
    client: &reqwest::Client,
    url: &str,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<CrimeIncident>, CrimeError> {
    log::info!("Loading historical crime extract from {url}");
    let body = client.get(url).send().await?.error_for_status()?.bytes().await?;
    index_csv(body.as_ref(), sink)
}

/// Returns the distinct categories present in `incidents`, in first
/// appearance order. Feeds the category dropdown contract.
#[must_use]
pub fn categories(incidents: &[CrimeIncident]) -> Vec<CrimeCategory> {
    let mut seen = Vec::new();
    for incident in incidents {
        if !seen.contains(&incident.category) {
            seen.push(incident.category);
        }
    }
    seen
}
