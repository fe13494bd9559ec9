//! The shopper's body measurements and the file store that holds them.
//!
//! The analysis core only ever reads a [`Measurements`] value; it is written
//! by `fitcheck measurements set` through [`MeasurementStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{FitError, Result};
use crate::units;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Female,
    Male,
}

impl std::str::FromStr for Gender {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" | "women" | "womens" | "women's" => Ok(Gender::Female),
            "male" | "m" | "men" | "mens" | "men's" => Ok(Gender::Male),
            other => Err(FitError::InvalidMeasurement(format!("unknown gender '{}'", other))),
        }
    }
}

/// Body measurements, always stored in centimeters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(default)]
    pub gender: Gender,
    pub bust_cm: f64,
    pub waist_cm: f64,
    pub hips_cm: f64,
    pub height_cm: f64,
    /// Inside leg, when the shopper supplied one
    #[serde(default)]
    pub inseam_cm: Option<f64>,
    #[serde(default)]
    pub inseam_is_estimated: bool,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Inclusive range accepted at entry time, in centimeters
#[derive(Debug, Clone, Copy)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

pub const BUST_RANGE: Range = Range { min: 50.0, max: 150.0 };
pub const WAIST_RANGE: Range = Range { min: 40.0, max: 150.0 };
pub const HIPS_RANGE: Range = Range { min: 50.0, max: 150.0 };
pub const HEIGHT_RANGE: Range = Range { min: 140.0, max: 220.0 };
pub const INSEAM_RANGE: Range = Range { min: 50.0, max: 110.0 };

/// Raw measurement text as typed by the user, before unit normalization
#[derive(Debug, Clone, Default)]
pub struct MeasurementInput {
    pub gender: Gender,
    pub bust: String,
    pub waist: String,
    pub hips: String,
    pub height: String,
    pub inseam: Option<String>,
}

impl Measurements {
    /// Normalize and validate raw input.
    ///
    /// Each value may carry a unit ("32in", "81 cm"); bare numbers follow the
    /// below-50-is-inches rule. When no inseam is given one is estimated from
    /// height and flagged as such.
    pub fn from_input(input: &MeasurementInput) -> Result<Self> {
        let bust_cm = parse_field("bust", &input.bust, BUST_RANGE)?;
        let waist_cm = parse_field("waist", &input.waist, WAIST_RANGE)?;
        let hips_cm = parse_field("hips", &input.hips, HIPS_RANGE)?;
        let height_cm = parse_field("height", &input.height, HEIGHT_RANGE)?;

        let supplied_inseam = match input.inseam.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(parse_field("inseam", text, INSEAM_RANGE)?),
            _ => None,
        };

        let (inseam_cm, inseam_is_estimated) = match supplied_inseam {
            Some(value) => (Some(value), false),
            None => (Some(units::estimate_inseam_from_height(height_cm)), true),
        };

        Ok(Self {
            gender: input.gender,
            bust_cm,
            waist_cm,
            hips_cm,
            height_cm,
            inseam_cm,
            inseam_is_estimated,
            saved_at: Some(Utc::now()),
        })
    }

    /// Inseam to use for length matching: supplied, or estimated from height
    pub fn effective_inseam_cm(&self) -> f64 {
        self.inseam_cm
            .unwrap_or_else(|| units::estimate_inseam_from_height(self.height_cm))
    }

    /// Whether the inseam used for matching is an estimate
    pub fn inseam_estimated(&self) -> bool {
        self.inseam_cm.is_none() || self.inseam_is_estimated
    }
}

fn parse_field(name: &str, text: &str, range: Range) -> Result<f64> {
    let value = units::to_cm(text).ok_or_else(|| {
        FitError::InvalidMeasurement(format!("{} '{}' contains no number", name, text.trim()))
    })?;

    if !range.contains(value) {
        return Err(FitError::InvalidMeasurement(format!(
            "{} of {:.1}cm is outside {}-{}cm - please check it",
            name, value, range.min, range.max
        )));
    }

    Ok(units::round1(value))
}

/// TOML file holding the saved measurements
#[derive(Debug, Clone)]
pub struct MeasurementStore {
    path: PathBuf,
}

impl MeasurementStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Open the store at the default location
    ///
    /// Supports FITCHECK_MEASUREMENTS environment variable for test isolation
    pub fn open_default() -> Result<Self> {
        if let Ok(path) = std::env::var("FITCHECK_MEASUREMENTS") {
            return Ok(Self::new(path));
        }
        Ok(Self::new(Config::data_dir()?.join("measurements.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved measurements; `None` when nothing has been saved yet
    pub fn load(&self) -> Result<Option<Measurements>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(toml::from_str(&content)?))
    }

    pub fn save(&self, measurements: &Measurements) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(measurements)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Remove saved measurements; returns whether anything was removed
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
