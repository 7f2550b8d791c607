#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Street-crime category taxonomy and incident types.
//!
//! The category set is the fixed police.uk street-crime taxonomy. Labels
//! that do not match any known category fold into [`CrimeCategory::OtherCrime`]
//! rather than failing, since the upstream taxonomy has grown over time.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Street-crime categories as reported by the police.uk API and the
/// historical borough extract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CrimeCategory {
    /// Behaviour causing harassment, alarm or distress
    AntiSocialBehaviour,
    /// Theft of a pedal cycle
    BicycleTheft,
    /// Unlawful entry with intent to steal
    Burglary,
    /// Damage to property, including arson
    CriminalDamageArson,
    /// Drug possession and supply offences
    Drugs,
    /// Theft not covered by a more specific category
    OtherTheft,
    /// Unlawful possession of a weapon
    PossessionOfWeapons,
    /// Offences against public order
    PublicOrder,
    /// Theft with force or threat of force
    Robbery,
    /// Theft from shop premises
    Shoplifting,
    /// Theft directly from the victim without force
    TheftFromThePerson,
    /// Theft of or from a vehicle
    VehicleCrime,
    /// Violence against the person, including sexual offences
    ViolentCrime,
    /// Fallback for labels outside the known taxonomy
    OtherCrime,
}

impl CrimeCategory {
    /// Parses an upstream category label, folding unknown labels into
    /// [`Self::OtherCrime`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Self::OtherCrime)
    }

    /// Map marker color associated with this category on the heatmap
    /// layer.
    #[must_use]
    pub const fn marker_color(self) -> &'static str {
        match self {
            Self::AntiSocialBehaviour => "blue",
            Self::BicycleTheft => "beige",
            Self::Burglary => "purple",
            Self::CriminalDamageArson => "orange",
            Self::Drugs => "darkred",
            Self::OtherTheft => "green",
            Self::PossessionOfWeapons => "cadetblue",
            Self::PublicOrder => "lightred",
            Self::Robbery => "darkpurple",
            Self::Shoplifting => "lightblue",
            Self::TheftFromThePerson => "darkgreen",
            Self::VehicleCrime => "black",
            Self::ViolentCrime => "red",
            Self::OtherCrime => "gray",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::AntiSocialBehaviour,
            Self::BicycleTheft,
            Self::Burglary,
            Self::CriminalDamageArson,
            Self::Drugs,
            Self::OtherTheft,
            Self::PossessionOfWeapons,
            Self::PublicOrder,
            Self::Robbery,
            Self::Shoplifting,
            Self::TheftFromThePerson,
            Self::VehicleCrime,
            Self::ViolentCrime,
            Self::OtherCrime,
        ]
    }
}

/// A parsed geographic position, WGS84 degrees.
///
/// Values are not range-validated against real-world latitude/longitude
/// bounds; the upstream sources occasionally carry out-of-borough
/// coordinates and the dashboard plots whatever it is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// A single crime incident with a successfully parsed position.
///
/// Incidents whose location payload cannot be parsed are dropped by the
/// indexing layer (and counted), so every materialized incident carries
/// real coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeIncident {
    /// Street-crime category.
    pub category: CrimeCategory,
    /// Parsed incident position.
    pub position: LatLon,
    /// Year-month stamp (`"YYYY-MM"`) for live-fetched incidents;
    /// `None` for rows from the historical extract.
    pub month: Option<String>,
}
