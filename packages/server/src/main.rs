#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server binary for the LSOA dashboard.
//!
//! Builds the immutable application context at startup, then serves the
//! REST API consumed by the browser frontend.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use lsoa_dash_crime::police::LiveCrimeFetcher;
use lsoa_dash_diag::LogSink;
use lsoa_dash_server::{AppContext, AppState, DashboardConfig, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = DashboardConfig::from_env();
    let sink = Arc::new(LogSink);
    let client = reqwest::Client::new();

    log::info!("Loading boundary and crime datasets...");
    let context = AppContext::load(&client, &config, sink.as_ref()).await;

    let state = web::Data::new(AppState {
        context: Arc::new(context),
        fetcher: LiveCrimeFetcher::new(client),
        sink,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/attributes", web::get().to(handlers::attributes))
                    .route(
                        "/choropleth/{attribute}",
                        web::get().to(handlers::choropleth),
                    )
                    .route("/bars/{attribute}", web::get().to(handlers::bars))
                    .route("/ward-bars/{attribute}", web::get().to(handlers::ward_bars))
                    .route("/area-info", web::get().to(handlers::area_info))
                    .route("/correlations", web::get().to(handlers::correlations))
                    .route(
                        "/crime-categories",
                        web::get().to(handlers::crime_categories),
                    )
                    .route("/live-crimes", web::get().to(handlers::live_crimes)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
