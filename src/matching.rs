//! Size matching - picks the best size for a set of measurements
//!
//! Two sources can be matched against:
//!
//! - the page's own size selector, used only for bottoms, where waist and
//!   inseam map directly onto the retailer's inch-denominated options;
//! - a size chart (from the page, or the generic UK chart), scored by
//!   weighted mean absolute deviation over whichever axes the chart has.
//!
//! [`recommend`] tries the selector first and falls back to the chart.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::chart::{ChartSource, SizeChart, SizeChartEntry};
use crate::measurements::Measurements;
use crate::product_type::ProductType;
use crate::selector::{parse_waist_length, SizeOption, SizeSelector};
use crate::units;

const BUST_WEIGHT: f64 = 1.0;
const WAIST_WEIGHT: f64 = 1.2;
const HIPS_WEIGHT: f64 = 1.0;

/// Confidence lost per unit of chart score
const CHART_PENALTY: f64 = 2.0;
/// Confidence lost per unit of combined waist/length score
const COMBINED_PENALTY: f64 = 3.0;
/// Confidence reported for a direct waist selector match
const SELECTOR_CONFIDENCE: f64 = 90.0;

/// Chart warning thresholds in cm: (slight, very)
const WAIST_CM_THRESHOLDS: (f64, f64) = (3.0, 6.0);
const BUST_HIPS_CM_THRESHOLDS: (f64, f64) = (4.0, 8.0);

/// Selector warning thresholds in inches
const INCH_SLIGHT: f64 = 1.5;
const INCH_MODERATE: f64 = 3.0;
const INCH_VERY: f64 = 4.0;

/// Plausible inch values for selector options
const WAIST_INCHES: (f64, f64) = (24.0, 50.0);
const LENGTH_INCHES: (f64, f64) = (26.0, 40.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Bust,
    Waist,
    Hips,
}

impl Axis {
    pub fn label(&self) -> &'static str {
        match self {
            Axis::Bust => "Bust",
            Axis::Waist => "Waist",
            Axis::Hips => "Hips",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    Tight,
    Loose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Slight,
    Moderate,
    Very,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitWarning {
    pub axis: Axis,
    pub direction: Fit,
    pub severity: Severity,
    pub message: String,
}

impl FitWarning {
    fn new(axis: Axis, direction: Fit, severity: Severity) -> Self {
        let fit = match direction {
            Fit::Tight => "tight",
            Fit::Loose => "loose",
        };
        let message = match severity {
            Severity::Slight => format!("{} may be slightly {}", axis.label(), fit),
            Severity::Moderate => format!("{} may be {}", axis.label(), fit),
            Severity::Very => format!("{} may be very {}", axis.label(), fit),
        };
        Self {
            axis,
            direction,
            severity,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationKind {
    Standard,
    WaistOnly,
    WaistLength,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub size: String,
    pub kind: RecommendationKind,
    /// 0-100
    pub confidence: f64,
    pub warnings: Vec<FitWarning>,
    pub details: BTreeMap<String, String>,
}

/// Where a recommendation's sizes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Selector,
    PageChart,
    GenericChart,
}

impl MatchSource {
    pub fn describe(&self) -> &'static str {
        match self {
            MatchSource::Selector => "the page's size selector",
            MatchSource::PageChart => "the page's size chart",
            MatchSource::GenericChart => "a generic UK size chart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeMatch {
    pub recommendation: Recommendation,
    pub source: MatchSource,
}

fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Format an inch or cm value without a trailing ".0"
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Weighted mean absolute deviation over the axes the entry has
fn entry_score(m: &Measurements, entry: &SizeChartEntry) -> Option<f64> {
    let axes = [
        (m.bust_cm, entry.bust_cm, BUST_WEIGHT),
        (m.waist_cm, entry.waist_cm, WAIST_WEIGHT),
        (m.hips_cm, entry.hips_cm, HIPS_WEIGHT),
    ];

    let (total, compared) = axes
        .into_iter()
        .filter_map(|(measured, chart, weight)| chart.map(|c| (measured - c).abs() * weight))
        .fold((0.0, 0u32), |(sum, n), score| (sum + score, n + 1));

    (compared > 0).then(|| total / compared as f64)
}

/// Warning for a cm deviation (measured - chart), if past a threshold
fn cm_warning(axis: Axis, diff: f64, (slight, very): (f64, f64)) -> Option<FitWarning> {
    let direction = if diff > 0.0 { Fit::Tight } else { Fit::Loose };
    let magnitude = diff.abs();
    if magnitude > very {
        Some(FitWarning::new(axis, direction, Severity::Very))
    } else if magnitude > slight {
        Some(FitWarning::new(axis, direction, Severity::Slight))
    } else {
        None
    }
}

/// Warning for an inch deviation (measured - option), if past a threshold
pub fn inch_warning(axis: Axis, diff: f64) -> Option<FitWarning> {
    let direction = if diff > 0.0 { Fit::Tight } else { Fit::Loose };
    let magnitude = diff.abs();
    let severity = if magnitude > INCH_VERY {
        Severity::Very
    } else if magnitude > INCH_MODERATE {
        Severity::Moderate
    } else if magnitude > INCH_SLIGHT {
        Severity::Slight
    } else {
        return None;
    };
    Some(FitWarning::new(axis, direction, severity))
}

/// Best chart entry for the measurements; ties keep the earlier entry
pub fn match_from_chart(m: &Measurements, chart: &SizeChart) -> Option<Recommendation> {
    let mut best: Option<(&SizeChartEntry, f64)> = None;
    for entry in &chart.entries {
        let Some(score) = entry_score(m, entry) else {
            continue;
        };
        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((entry, score));
        }
    }

    let (entry, score) = best?;
    tracing::debug!(size = %entry.name, score, "chart match");

    let mut warnings = Vec::new();
    let mut details = BTreeMap::new();
    let axes = [
        (Axis::Bust, m.bust_cm, entry.bust_cm, BUST_HIPS_CM_THRESHOLDS),
        (Axis::Waist, m.waist_cm, entry.waist_cm, WAIST_CM_THRESHOLDS),
        (Axis::Hips, m.hips_cm, entry.hips_cm, BUST_HIPS_CM_THRESHOLDS),
    ];
    for (axis, measured, chart_value, thresholds) in axes {
        let Some(chart_value) = chart_value else {
            continue;
        };
        details.insert(
            axis.label().to_lowercase(),
            format!(
                "you {} cm, size {} cm",
                format_number(units::round1(measured)),
                format_number(units::round1(chart_value))
            ),
        );
        warnings.extend(cm_warning(axis, measured - chart_value, thresholds));
    }

    Some(Recommendation {
        size: entry.name.clone(),
        kind: RecommendationKind::Standard,
        confidence: clamp_confidence(100.0 - CHART_PENALTY * score),
        warnings,
        details,
    })
}

fn option_number(option: &SizeOption) -> Option<f64> {
    units::parse_range_or_single(&option.text).or_else(|| units::parse_range_or_single(&option.value))
}

/// Option closest to `target` among those whose number lies in `range`
fn closest_option(
    options: &[SizeOption],
    target: f64,
    (low, high): (f64, f64),
) -> Option<(&SizeOption, f64)> {
    let mut best: Option<(&SizeOption, f64)> = None;
    for option in options {
        let Some(value) = option_number(option) else {
            continue;
        };
        if value < low || value > high {
            continue;
        }
        if best.map_or(true, |(_, b)| (value - target).abs() < (b - target).abs()) {
            best = Some((option, value));
        }
    }
    best
}

fn match_waist_only(m: &Measurements, waist_options: &[SizeOption]) -> Option<Recommendation> {
    let waist_in = units::cm_to_inches(m.waist_cm);
    let (option, value) = closest_option(waist_options, waist_in, WAIST_INCHES)?;

    let mut details = BTreeMap::new();
    details.insert("waist".to_string(), format!("you {:.1} in", waist_in));

    Some(Recommendation {
        size: option.text.clone(),
        kind: RecommendationKind::WaistOnly,
        confidence: SELECTOR_CONFIDENCE,
        warnings: inch_warning(Axis::Waist, waist_in - value).into_iter().collect(),
        details,
    })
}

fn inseam_detail(m: &Measurements, inseam_in: f64) -> String {
    if m.inseam_estimated() {
        format!("you {:.1} in (estimated from height)", inseam_in)
    } else {
        format!("you {:.1} in", inseam_in)
    }
}

fn match_waist_length(
    m: &Measurements,
    waist_options: &[SizeOption],
    length_options: &[SizeOption],
) -> Option<Recommendation> {
    let waist_in = units::cm_to_inches(m.waist_cm);
    let inseam_in = units::cm_to_inches(m.effective_inseam_cm());
    let (_, waist) = closest_option(waist_options, waist_in, WAIST_INCHES)?;

    let length = closest_option(length_options, inseam_in, LENGTH_INCHES)
        .map(|(_, value)| value)
        .unwrap_or_else(|| inseam_in.round());

    let mut details = BTreeMap::new();
    details.insert("waist".to_string(), format!("you {:.1} in", waist_in));
    details.insert("inseam".to_string(), inseam_detail(m, inseam_in));

    Some(Recommendation {
        size: format!("{} x {}", format_number(waist), format_number(length)),
        kind: RecommendationKind::WaistLength,
        confidence: SELECTOR_CONFIDENCE,
        warnings: inch_warning(Axis::Waist, waist_in - waist).into_iter().collect(),
        details,
    })
}

fn match_combined(m: &Measurements, options: &[SizeOption]) -> Option<Recommendation> {
    let waist_in = units::cm_to_inches(m.waist_cm);
    let inseam_in = units::cm_to_inches(m.effective_inseam_cm());

    let mut best: Option<(&SizeOption, u32, f64)> = None;
    for option in options {
        let Some((waist, length)) = parse_waist_length(&option.text) else {
            continue;
        };
        let score = 2.0 * (waist_in - waist as f64).abs() + (inseam_in - length as f64).abs();
        if best.map_or(true, |(_, _, b)| score < b) {
            best = Some((option, waist, score));
        }
    }

    let (option, waist, score) = best?;
    tracing::debug!(size = %option.text, score, "combined waist/length match");

    let mut details = BTreeMap::new();
    details.insert("waist".to_string(), format!("you {:.1} in", waist_in));
    details.insert("inseam".to_string(), inseam_detail(m, inseam_in));

    Some(Recommendation {
        size: option.text.clone(),
        kind: RecommendationKind::WaistLength,
        confidence: clamp_confidence(100.0 - COMBINED_PENALTY * score),
        warnings: inch_warning(Axis::Waist, waist_in - waist as f64).into_iter().collect(),
        details,
    })
}

/// Match against the page's own selector; bottoms only
pub fn match_from_selector(
    m: &Measurements,
    selector: &SizeSelector,
    product_type: ProductType,
) -> Option<Recommendation> {
    if product_type != ProductType::Bottoms {
        tracing::debug!(product_type = product_type.as_str(), "selector matching skipped");
        return None;
    }

    match selector {
        SizeSelector::WaistOnly { waist_options } => match_waist_only(m, waist_options),
        SizeSelector::WaistLength {
            waist_options,
            length_options,
        } => match_waist_length(m, waist_options, length_options),
        SizeSelector::WaistLengthCombined { options } => match_combined(m, options),
        SizeSelector::Standard { .. } => None,
    }
}

/// Note which of the page's own sizes the chart recommendation corresponds to
fn annotate_availability(recommendation: &mut Recommendation, options: &[SizeOption]) {
    let wanted = recommendation.size.to_lowercase();
    let bare = wanted.trim_start_matches("uk").trim();
    let on_page = options.iter().find(|o| {
        let text = o.text.to_lowercase();
        text == wanted || text.trim_start_matches("uk").trim() == bare
    });
    let note = match on_page {
        Some(option) => format!("yes ({})", option.text),
        None => "not found among page sizes".to_string(),
    };
    recommendation.details.insert("on page".to_string(), note);
}

/// Selector match when one applies, else the chart (extracted only if needed)
pub fn recommend(
    m: &Measurements,
    selector: Option<&SizeSelector>,
    product_type: ProductType,
    chart: impl FnOnce() -> SizeChart,
) -> Option<SizeMatch> {
    if let Some(recommendation) = selector.and_then(|s| match_from_selector(m, s, product_type)) {
        return Some(SizeMatch {
            recommendation,
            source: MatchSource::Selector,
        });
    }

    let chart = chart();
    let source = match chart.source {
        ChartSource::Page => MatchSource::PageChart,
        ChartSource::Generic => MatchSource::GenericChart,
    };
    let mut recommendation = match_from_chart(m, &chart)?;

    if let Some(SizeSelector::Standard { options }) = selector {
        annotate_availability(&mut recommendation, options);
    }

    Some(SizeMatch {
        recommendation,
        source,
    })
}
