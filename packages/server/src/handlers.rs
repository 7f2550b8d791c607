//! HTTP handler functions for the LSOA dashboard API.
//!
//! Input failures (unknown attribute, empty selection) come back as
//! 400s; endpoints whose pipeline stage never loaded answer 503.

use actix_web::{HttpResponse, web};
use lsoa_dash_choropleth::ColorScale;
use lsoa_dash_crime_models::CrimeCategory;
use lsoa_dash_diag::{Diagnostic, Stage};
use lsoa_dash_server_models::{
    ApiHealth, ApiLiveIncident, AreaInfoParams, ChoroplethRegion, ChoroplethResponse,
    CorrelationParams, LiveCrimeParams, LiveCrimeResponse,
};
use lsoa_dash_stats::{self as stats, StatsError};

use crate::{AppState, BoundaryData};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/attributes`
///
/// Lists the numeric attribute columns available for maps and charts.
pub async fn attributes(state: web::Data<AppState>) -> HttpResponse {
    match state.context.boundaries.as_ref() {
        Some(boundaries) => HttpResponse::Ok().json(&boundaries.attributes),
        None => unavailable("boundary"),
    }
}

/// `GET /api/choropleth/{attribute}`
///
/// Percentile-colored value per distinct LSOA, with the decile
/// thresholds and legend for the map layer.
pub async fn choropleth(state: web::Data<AppState>, attribute: web::Path<String>) -> HttpResponse {
    let Some(boundaries) = state.context.boundaries.as_ref() else {
        return unavailable("boundary");
    };

    let rows = match stats::area_values(&boundaries.joined, &attribute) {
        Ok(rows) => rows,
        Err(e) => return input_error(&e),
    };

    let values: Vec<f64> = rows.iter().map(|row| row.value).collect();
    let Ok(scale) = ColorScale::build(&values) else {
        return input_error(&StatsError::EmptySelection {
            context: "choropleth values".to_string(),
        });
    };

    let regions: Vec<ChoroplethRegion> = rows
        .into_iter()
        .map(|row| ChoroplethRegion {
            color: scale.color_for(row.value).color,
            area_code: row.area_code,
            area_name: row.area_name,
            value: row.value,
        })
        .collect();

    HttpResponse::Ok().json(ChoroplethResponse {
        attribute: attribute.into_inner(),
        thresholds: scale.thresholds().to_vec(),
        legend: ColorScale::legend(),
        regions,
    })
}

/// `GET /api/bars/{attribute}`
///
/// Joined rows sorted descending by the attribute, for the LSOA bar
/// chart.
pub async fn bars(state: web::Data<AppState>, attribute: web::Path<String>) -> HttpResponse {
    with_boundaries(&state, |boundaries| {
        stats::ranked_areas(&boundaries.joined, &attribute)
            .map(|rows| HttpResponse::Ok().json(rows))
    })
}

/// `GET /api/ward-bars/{attribute}`
///
/// Per-ward attribute totals, descending.
pub async fn ward_bars(state: web::Data<AppState>, attribute: web::Path<String>) -> HttpResponse {
    with_boundaries(&state, |boundaries| {
        stats::ward_totals(&boundaries.joined, &attribute)
            .map(|totals| HttpResponse::Ok().json(totals))
    })
}

/// `GET /api/area-info?name=...&attribute=...`
///
/// Value, rank, and ward for one LSOA looked up by name substring.
pub async fn area_info(
    state: web::Data<AppState>,
    params: web::Query<AreaInfoParams>,
) -> HttpResponse {
    with_boundaries(&state, |boundaries| {
        stats::area_rank(&boundaries.joined, &params.name, &params.attribute).map(|info| {
            info.map_or_else(
                || {
                    HttpResponse::NotFound().json(serde_json::json!({
                        "error": format!(
                            "no LSOA with attribute {:?} matches {:?}",
                            params.attribute, params.name
                        )
                    }))
                },
                |info| HttpResponse::Ok().json(info),
            )
        })
    })
}

/// `GET /api/correlations?attribute=...&ward=...`
///
/// The ten attributes most correlated with the target, with scatter
/// samples for each panel.
pub async fn correlations(
    state: web::Data<AppState>,
    params: web::Query<CorrelationParams>,
) -> HttpResponse {
    with_boundaries(&state, |boundaries| {
        stats::top_correlations(
            &boundaries.joined,
            &params.attribute,
            params.ward.as_deref(),
            10,
        )
        .map(|panels| HttpResponse::Ok().json(panels))
    })
}

/// `GET /api/crime-categories`
///
/// Distinct categories in the historical extract, for the dropdown.
pub async fn crime_categories(state: web::Data<AppState>) -> HttpResponse {
    match state.context.historical.as_ref() {
        Some(historical) => HttpResponse::Ok().json(&historical.categories),
        None => unavailable("historical crime"),
    }
}

/// `GET /api/live-crimes?month=YYYY-MM&category=...`
///
/// Fetches one month of street crime from the police.uk API. A failed
/// fetch (including an invalid month) answers with an empty
/// `available: false` payload plus a diagnostic; it never becomes a
/// 500.
pub async fn live_crimes(
    state: web::Data<AppState>,
    params: web::Query<LiveCrimeParams>,
) -> HttpResponse {
    let filter = match params.category.as_deref() {
        Some(label) => match label.parse::<CrimeCategory>() {
            Ok(category) => Some(category),
            Err(_) => {
                return HttpResponse::BadRequest().json(serde_json::json!({
                    "error": format!("unknown crime category {label:?}")
                }));
            }
        },
        None => None,
    };

    match state.fetcher.fetch(&params.month, state.sink.as_ref()).await {
        Ok(incidents) => {
            let mut categories = Vec::new();
            for incident in &incidents {
                if !categories.contains(&incident.category) {
                    categories.push(incident.category);
                }
            }

            let api_incidents: Vec<ApiLiveIncident> = incidents
                .iter()
                .filter(|incident| filter.is_none_or(|category| incident.category == category))
                .map(ApiLiveIncident::from)
                .collect();

            HttpResponse::Ok().json(LiveCrimeResponse {
                month: params.month.clone(),
                available: true,
                incidents: api_incidents,
                categories,
            })
        }
        Err(e) => {
            log::error!("Live crime fetch for {} failed: {e}", params.month);
            state.sink.record(Diagnostic::FetchFailure {
                stage: Stage::LiveFetch,
                message: e.to_string(),
            });
            HttpResponse::Ok().json(LiveCrimeResponse {
                month: params.month.clone(),
                available: false,
                incidents: Vec::new(),
                categories: Vec::new(),
            })
        }
    }
}

/// Runs a statistics computation against the boundary stage, mapping a
/// missing stage to 503 and input errors to 400.
fn with_boundaries(
    state: &web::Data<AppState>,
    compute: impl FnOnce(&BoundaryData) -> Result<HttpResponse, StatsError>,
) -> HttpResponse {
    match state.context.boundaries.as_ref() {
        Some(boundaries) => compute(boundaries).unwrap_or_else(|e| input_error(&e)),
        None => unavailable("boundary"),
    }
}

fn unavailable(what: &str) -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(serde_json::json!({
        "error": format!("{what} data unavailable")
    }))
}

fn input_error(error: &StatsError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": error.to_string()
    }))
}
