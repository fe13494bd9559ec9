//! Unit normalization for body and garment measurements.
//!
//! Everything downstream works in centimeters. Text scraped from size charts
//! may carry an explicit unit or be a bare number; bare numbers go through
//! the magnitude rule in [`bare_to_cm`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const CM_PER_INCH: f64 = 2.54;

/// Bare numbers below this are taken to be inches.
pub const BARE_INCH_CEILING: f64 = 50.0;

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*(\d+(?:\.\d+)?)")
        .expect("Invalid range regex pattern")
});

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:\.\d+)?").expect("Invalid number regex pattern")
});

/// The first number or range in a cell and the unit marker written right after it
static MEASURE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(\d+(?:\.\d+)?)(?:\s*(?:-|–|—|to)\s*(\d+(?:\.\d+)?))?\s*(cm|centimet\w*|inch(?:es)?\b|ins?\b|"|″|'')?"#,
    )
    .expect("Invalid measurement regex pattern")
});

/// Linear unit of a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Cm,
    Inches,
}

impl Unit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Cm => "cm",
            Unit::Inches => "in",
        }
    }
}

/// Read a unit marker such as "cm", "in" or `"`
fn unit_from_marker(marker: &str) -> Unit {
    if marker.to_lowercase().starts_with("c") {
        Unit::Cm
    } else {
        Unit::Inches
    }
}

/// Parse "NN-MM" style ranges to their midpoint, or the first number in the text
pub fn parse_range_or_single(text: &str) -> Option<f64> {
    if let Some(caps) = RANGE_RE.captures(text) {
        let low = caps[1].parse::<f64>().ok()?;
        let high = caps[2].parse::<f64>().ok()?;
        return Some((low + high) / 2.0);
    }

    NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Apply the bare-number rule: below 50 is inches, otherwise centimeters
pub fn bare_to_cm(value: f64) -> f64 {
    if value < BARE_INCH_CEILING {
        value * CM_PER_INCH
    } else {
        value
    }
}

/// Convert measurement text to centimeters.
///
/// The first number (or range midpoint) is converted using the unit written
/// right after it, so "34in / 86cm" reads as 34 inches. Without a marker the
/// value is assumed to be inches when it is below 50, which is wrong for very
/// small centimeter values and very large inch values.
pub fn to_cm(text: &str) -> Option<f64> {
    let caps = MEASURE_RE.captures(text)?;
    let low = caps[1].parse::<f64>().ok()?;
    let value = match caps.get(2) {
        Some(high) => (low + high.as_str().parse::<f64>().ok()?) / 2.0,
        None => low,
    };

    Some(match caps.get(3).map(|m| unit_from_marker(m.as_str())) {
        Some(Unit::Cm) => value,
        Some(Unit::Inches) => value * CM_PER_INCH,
        None => bare_to_cm(value),
    })
}

pub fn cm_to_inches(cm: f64) -> f64 {
    cm / CM_PER_INCH
}

pub fn inches_to_cm(inches: f64) -> f64 {
    inches * CM_PER_INCH
}

/// Format an inch value with an explicit marker so it survives [`to_cm`]
pub fn inches_to_text(inches: f64) -> String {
    format!("{:.2} in", inches)
}

/// Round to one decimal place for display
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Height bands (upper bound exclusive, cm) and the inseam they imply
const INSEAM_BANDS: [(f64, f64); 8] = [
    (155.0, 71.0),
    (160.0, 73.0),
    (165.0, 76.0),
    (170.0, 78.0),
    (175.0, 81.0),
    (180.0, 83.0),
    (185.0, 86.0),
    (190.0, 88.0),
];

const TALLEST_INSEAM_CM: f64 = 91.0;

/// Estimate inseam from height when the user did not supply one
pub fn estimate_inseam_from_height(height_cm: f64) -> f64 {
    INSEAM_BANDS
        .iter()
        .find(|(upper, _)| height_cm < *upper)
        .map(|(_, inseam)| *inseam)
        .unwrap_or(TALLEST_INSEAM_CM)
}
