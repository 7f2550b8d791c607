#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Boundary document loading and the LSOA/ward spatial join.
//!
//! Two remote `GeoJSON` feature collections (LSOA boundaries with census
//! attributes, electoral ward boundaries) are decoded into typed records
//! and joined on geometric intersection into one analysis-ready table.

pub mod join;
pub mod source;

use thiserror::Error;

/// Errors that can occur while loading or joining boundary data.
///
/// All variants are document-level: a malformed feature fails the whole
/// load rather than producing a partial table.
#[derive(Debug, Error)]
pub enum GeoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A document or feature did not have the expected shape.
    #[error("Malformed boundary document: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },

    /// The two boundary documents declare different coordinate reference
    /// systems. Both sides must be geographic WGS84 before joining.
    #[error("CRS mismatch: LSOA document declares {lsoa}, ward document declares {wards}")]
    CrsMismatch {
        /// CRS declared by the LSOA document.
        lsoa: String,
        /// CRS declared by the ward document.
        wards: String,
    },

    /// An input collection was empty where at least one feature is
    /// required.
    #[error("Empty boundary collection: {label}")]
    EmptyCollection {
        /// Which collection was empty.
        label: &'static str,
    },
}
