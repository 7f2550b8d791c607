#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Decile percentile thresholds and choropleth color assignment.
//!
//! Given one numeric attribute across every LSOA, a [`ColorScale`]
//! computes ten percentile thresholds (10th, 20th, ... 100th) and maps
//! any value to the color of the first tier whose threshold it does not
//! exceed. The scale is pure data: building it twice from the same
//! values yields identical thresholds and identical color assignments.

use serde::Serialize;
use thiserror::Error;

/// Number of percentile tiers in the scale.
pub const TIER_COUNT: usize = 10;

/// Percentile bound of each tier, ascending.
pub const TIER_PERCENTILES: [u8; TIER_COUNT] = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100];

/// Hex color of each tier, darkest for the lowest decile.
pub const TIER_COLORS: [&str; TIER_COUNT] = [
    "#800026", "#BD0026", "#E31A1C", "#FC4E2A", "#FD8D3C", "#FEB24C", "#FED976", "#FFEDA0",
    "#FFFFCC", "#FFFFFF",
];

/// Errors that can occur while building a color scale.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    /// No values were supplied; there is no percentile of an empty set.
    /// This indicates a caller bug, not a data-quality issue.
    #[error("Cannot build a color scale from an empty value set")]
    EmptyInput,
}

/// One tier of the choropleth legend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorBucket {
    /// Zero-based tier index.
    pub tier: usize,
    /// Upper percentile bound of the tier (10..=100).
    pub percentile: u8,
    /// Fixed hex color bound to the tier.
    pub color: &'static str,
}

/// A built decile color scale for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    thresholds: [f64; TIER_COUNT],
}

impl ColorScale {
    /// Computes the decile thresholds for `values`.
    ///
    /// A single-element input degenerates: every threshold collapses to
    /// that value and every lookup maps to the first tier.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::EmptyInput`] if `values` is empty.
    pub fn build(values: &[f64]) -> Result<Self, ColorError> {
        if values.is_empty() {
            return Err(ColorError::EmptyInput);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut thresholds = [0.0; TIER_COUNT];
        for (slot, percentile) in thresholds.iter_mut().zip(TIER_PERCENTILES) {
            *slot = percentile_of_sorted(&sorted, f64::from(percentile));
        }

        Ok(Self { thresholds })
    }

    /// Returns the bucket for `value`: the first tier whose threshold is
    /// not below it, else the last tier.
    #[must_use]
    pub fn color_for(&self, value: f64) -> ColorBucket {
        let tier = self
            .thresholds
            .iter()
            .position(|threshold| value <= *threshold)
            .unwrap_or(TIER_COUNT - 1);
        bucket(tier)
    }

    /// The computed threshold array, ascending by tier.
    #[must_use]
    pub const fn thresholds(&self) -> &[f64; TIER_COUNT] {
        &self.thresholds
    }

    /// The full legend, lowest tier first.
    #[must_use]
    pub fn legend() -> Vec<ColorBucket> {
        (0..TIER_COUNT).map(bucket).collect()
    }
}

const fn bucket(tier: usize) -> ColorBucket {
    ColorBucket {
        tier,
        percentile: TIER_PERCENTILES[tier],
        color: TIER_COLORS[tier],
    }
}

/// Percentile with linear interpolation between order statistics:
/// `rank = p/100 * (n - 1)`, interpolated between the bracketing sorted
/// values. Matches the numpy default.
fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());

    #[allow(clippy::cast_precision_loss)]
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = rank - rank.floor();

    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to_hundred() -> Vec<f64> {
        (1..=100).map(f64::from).collect()
    }

    #[test]
    fn tenth_percentile_uses_linear_interpolation() {
        let scale = ColorScale::build(&one_to_hundred()).unwrap();
        let thresholds = scale.thresholds();
        assert!((thresholds[0] - 10.9).abs() < 1e-9);
        assert!((thresholds[9] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn lowest_value_maps_to_first_tier_and_highest_to_last() {
        let scale = ColorScale::build(&one_to_hundred()).unwrap();
        assert_eq!(scale.color_for(1.0).color, TIER_COLORS[0]);
        assert_eq!(scale.color_for(100.0).color, TIER_COLORS[9]);
    }

    #[test]
    fn value_above_every_threshold_falls_into_last_tier() {
        let scale = ColorScale::build(&one_to_hundred()).unwrap();
        assert_eq!(scale.color_for(1000.0).tier, TIER_COUNT - 1);
    }

    #[test]
    fn single_value_degenerates_to_first_tier() {
        let scale = ColorScale::build(&[5.0]).unwrap();
        assert!(scale.thresholds().iter().all(|t| (t - 5.0).abs() < f64::EPSILON));
        assert_eq!(scale.color_for(5.0).tier, 0);
        assert_eq!(scale.color_for(-3.0).tier, 0);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(ColorScale::build(&[]), Err(ColorError::EmptyInput));
    }

    #[test]
    fn identical_inputs_build_identical_scales() {
        let values = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let a = ColorScale::build(&values).unwrap();
        let b = ColorScale::build(&values).unwrap();
        assert_eq!(a, b);
        for v in &values {
            assert_eq!(a.color_for(*v), b.color_for(*v));
        }
    }

    #[test]
    fn legend_lists_all_ten_tiers_in_order() {
        let legend = ColorScale::legend();
        assert_eq!(legend.len(), TIER_COUNT);
        assert_eq!(legend[0].percentile, 10);
        assert_eq!(legend[9].percentile, 100);
        assert_eq!(legend[0].color, "#800026");
        assert_eq!(legend[9].color, "#FFFFFF");
    }
}
