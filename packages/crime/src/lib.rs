#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Historical crime CSV indexing and the live street-crime fetcher.
//!
//! Both paths share one coordinate parser: incident locations arrive as
//! serialized mappings (Python-repr strings in the historical extract,
//! JSON objects from the live API) and records whose coordinates cannot
//! be recovered are dropped and counted rather than defaulted.

pub mod indexer;
pub mod location;
pub mod police;

use thiserror::Error;

/// Errors that can occur during crime data operations.
#[derive(Debug, Error)]
pub enum CrimeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV reading failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The historical extract is missing a required column.
    #[error("Crime table is missing required column {name}")]
    MissingColumn {
        /// Name of the absent column.
        name: &'static str,
    },

    /// The requested month is not a valid `YYYY-MM` stamp.
    #[error("Invalid month {month}: expected YYYY-MM")]
    InvalidMonth {
        /// The rejected month string.
        month: String,
    },

    /// The live endpoint answered with a non-success status.
    #[error("Live crime endpoint returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
}
