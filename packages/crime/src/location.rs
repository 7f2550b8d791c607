//! Incident location parsing.
//!
//! The historical extract serializes each location as a Python-repr
//! mapping (`{'latitude': '51.55', ...}`, with `None` for missing
//! coordinates); the live API delivers proper JSON objects. Both funnel
//! through [`parse_location_value`]. Any shortfall (missing key, null
//! marker, unparseable or non-finite number, non-mapping payload)
//! yields `None` so the caller drops the record instead of inventing a
//! zero coordinate.

use lsoa_dash_crime_models::LatLon;
use serde_json::Value;

/// Parses a serialized location mapping into coordinates.
///
/// Accepts strict JSON first, then retries with Python-repr
/// normalization.
#[must_use]
pub fn parse_location(raw: &str) -> Option<LatLon> {
    let value = serde_json::from_str::<Value>(raw)
        .ok()
        .or_else(|| serde_json::from_str(&python_repr_to_json(raw)).ok())?;
    parse_location_value(&value)
}

/// Rewrites a Python-repr mapping into JSON.
///
/// Quote delimiters become double quotes and bare `None` becomes
/// `null`, but only outside string literals: a street name like
/// `"On or near St John's Road"` (which Python renders double-quoted
/// because of the apostrophe) passes through with its apostrophe
/// intact, and an inner double quote gets escaped for JSON.
fn python_repr_to_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    if inner == c {
                        break;
                    }
                    match inner {
                        // Python escapes the delimiter quote; JSON only
                        // needs the escape kept for double quotes.
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => {}
                        },
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            'N' if chars.clone().take(3).eq("one".chars()) => {
                chars.next();
                chars.next();
                chars.next();
                out.push_str("null");
            }
            other => out.push(other),
        }
    }

    out
}

/// Parses coordinates out of an already-decoded location value.
#[must_use]
pub fn parse_location_value(value: &Value) -> Option<LatLon> {
    let mapping = value.as_object()?;
    let lat = coordinate(mapping.get("latitude")?)?;
    let lon = coordinate(mapping.get("longitude")?)?;
    Some(LatLon { lat, lon })
}

/// Converts one coordinate field to a finite float. Upstream sends
/// coordinates as numeric strings, but plain numbers are accepted too.
fn coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}
