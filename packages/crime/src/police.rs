//! Live street-crime fetcher for the police.uk API.
//!
//! One GET per call against the `crimes-street/all-crime` endpoint,
//! bounded to a fixed borough polygon. No retry, no backoff, no caching:
//! the dashboard re-fetches on every user request and the result lives
//! only for that render cycle. Failure is a tagged `Err`, never an empty
//! list, so callers can tell "no crime this month" from a broken fetch.

use lsoa_dash_crime_models::{CrimeCategory, CrimeIncident};
use lsoa_dash_diag::{Diagnostic, DiagnosticSink, Stage};
use serde::Deserialize;

use crate::{CrimeError, location::parse_location_value};

/// Default police.uk street-crime endpoint.
const STREET_CRIME_URL: &str = "https://data.police.uk/api/crimes-street/all-crime";

/// Closed five-vertex ring bounding the borough, `(lat, lon)` pairs.
pub const BOROUGH_RING: [(f64, f64); 5] = [
    (51.555_190_928_189_53, -0.305_573_834_437_980_25),
    (51.670_170_250_593_905, -0.305_573_834_437_980_25),
    (51.670_170_250_593_905, -0.129_094_064_021_380_46),
    (51.555_190_928_189_53, -0.129_094_064_021_380_46),
    (51.555_190_928_189_53, -0.305_573_834_437_980_25),
];

/// One incident as delivered by the live endpoint.
#[derive(Debug, Deserialize)]
struct RawLiveIncident {
    category: String,
    location: serde_json::Value,
}

/// Client for the live street-crime endpoint.
pub struct LiveCrimeFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl Default for LiveCrimeFetcher {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl LiveCrimeFetcher {
    /// Creates a fetcher against the production police.uk endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: STREET_CRIME_URL.to_string(),
        }
    }

    /// Creates a fetcher against an alternate endpoint (tests, mirrors).
    #[must_use]
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetches all street crimes inside the borough ring for one month.
    ///
    /// Incidents with unparseable coordinates are dropped and counted on
    /// the sink. `Ok(vec![])` is a genuine "no crime this month" result.
    ///
    /// # Errors
    ///
    /// Returns [`CrimeError::InvalidMonth`] before any network I/O if
    /// `month` is not a valid `YYYY-MM` stamp, [`CrimeError::Http`] on
    /// transport failure, and [`CrimeError::Status`] on a non-success
    /// response.
    pub async fn fetch(
        &self,
        month: &str,
        sink: &dyn DiagnosticSink,
    ) -> Result<Vec<CrimeIncident>, CrimeError> {
        validate_month(month)?;

        let url = format!("{}?poly={}&date={month}", self.base_url, poly_param());
        log::info!("Fetching live street crimes for {month}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrimeError::Status {
                status: status.as_u16(),
            });
        }

        let raw: Vec<RawLiveIncident> = response.json().await?;
        let mut incidents = Vec::with_capacity(raw.len());
        for incident in raw {
            if let Some(position) = parse_location_value(&incident.location) {
                incidents.push(CrimeIncident {
                    category: CrimeCategory::from_label(&incident.category),
                    position,
                    month: Some(month.to_string()),
                });
            } else {
                sink.record(Diagnostic::DroppedRecord {
                    stage: Stage::LiveFetch,
                    detail: format!("unparseable location for {}", incident.category),
                });
            }
        }

        log::info!("Live fetch for {month} returned {} incidents", incidents.len());
        Ok(incidents)
    }
}

/// Validates a `YYYY-MM` month stamp.
fn validate_month(month: &str) -> Result<(), CrimeError> {
    let well_formed = month.len() == 7
        && chrono::NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok();
    if well_formed {
        Ok(())
    } else {
        Err(CrimeError::InvalidMonth {
            month: month.to_string(),
        })
    }
}

/// Serializes the borough ring into the `poly` query parameter:
/// colon-separated `lat,lon` pairs.
fn poly_param() -> String {
    BOROUGH_RING
        .iter()
        .map(|(lat, lon)| format!("{lat},{lon}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, HttpServer, dev::ServerHandle, web};
    use lsoa_dash_diag::CountingSink;

    use super::*;

    /// Serves one canned response on an OS-assigned port and returns the
    /// endpoint URL plus a handle to stop the server.
    fn spawn_endpoint(responder: fn() -> HttpResponse) -> (String, ServerHandle) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = HttpServer::new(move || {
            App::new().default_service(web::to(move || async move { responder() }))
        })
        .listen(listener)
        .unwrap()
        .workers(1)
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://127.0.0.1:{port}/crimes"), handle)
    }

    #[actix_web::test]
    async fn fetch_decodes_incidents_and_counts_dropped_ones() {
        let (url, handle) = spawn_endpoint(|| {
            HttpResponse::Ok().json(serde_json::json!([
                {
                    "category": "burglary",
                    "location": {"latitude": "51.6", "longitude": "-0.2"}
                },
                {
                    "category": "drugs",
                    "location": {"latitude": null, "longitude": "-0.21"}
                }
            ]))
        });

        let fetcher = LiveCrimeFetcher::with_base_url(reqwest::Client::new(), url);
        let sink = CountingSink::new();
        let incidents = fetcher.fetch("2024-01", &sink).await.unwrap();

        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].category, CrimeCategory::Burglary);
        assert!((incidents[0].position.lat - 51.6).abs() < f64::EPSILON);
        assert_eq!(incidents[0].month.as_deref(), Some("2024-01"));
        assert_eq!(sink.dropped(Stage::LiveFetch), 1);

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn empty_response_is_a_genuine_no_crime_result() {
        let (url, handle) = spawn_endpoint(|| HttpResponse::Ok().json(serde_json::json!([])));

        let fetcher = LiveCrimeFetcher::with_base_url(reqwest::Client::new(), url);
        let sink = CountingSink::new();
        let incidents = fetcher.fetch("2024-01", &sink).await.unwrap();

        assert!(incidents.is_empty());
        assert_eq!(sink.dropped(Stage::LiveFetch), 0);

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn non_success_status_is_a_tagged_error() {
        let (url, handle) = spawn_endpoint(|| HttpResponse::BadGateway().finish());

        let fetcher = LiveCrimeFetcher::with_base_url(reqwest::Client::new(), url);
        let sink = CountingSink::new();
        let err = fetcher.fetch("2024-01", &sink).await.unwrap_err();

        assert!(matches!(err, CrimeError::Status { status: 502 }));

        handle.stop(true).await;
    }

    #[test]
    fn out_of_range_month_is_rejected_before_any_network_io() {
        let fetcher = LiveCrimeFetcher::default();
        let sink = CountingSink::new();

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let err = runtime.block_on(fetcher.fetch("2024-13", &sink)).unwrap_err();
        assert!(matches!(err, CrimeError::InvalidMonth { .. }));
    }

    #[test]
    fn malformed_month_stamps_are_rejected() {
        assert!(validate_month("2024-01").is_ok());
        assert!(validate_month("2024-12").is_ok());
        assert!(validate_month("2024-13").is_err());
        assert!(validate_month("2024-00").is_err());
        assert!(validate_month("2024-1").is_err());
        assert!(validate_month("not-a-month").is_err());
        assert!(validate_month("").is_err());
    }

    #[test]
    fn poly_param_is_a_closed_colon_separated_ring() {
        let poly = poly_param();
        let points: Vec<&str> = poly.split(':').collect();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], points[4]);
        assert!(points[0].starts_with("51.55519092818953,"));
    }
}
