//! Size-chart extraction from page tables
//!
//! The first table that mentions a body measurement and a size/region word
//! is treated as the size chart. Column roles come from header keywords, and
//! measurement cells are normalized to centimeters. When no table yields
//! anything usable the generic UK chart is returned instead.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::page::{element_text, PageSnapshot};
use crate::units;

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Invalid table selector"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Invalid tr selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("Invalid cell selector"));

/// Region codes start a word and may run into a number ("uk8"), so "bust"
/// does not read as "us"
static REGION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(uk|us|eu)(?:\b|\d)").expect("Invalid region regex")
});

static BARE_INTEGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+$").expect("Invalid integer regex")
});

const MEASUREMENT_KEYWORDS: [&str; 4] = ["bust", "chest", "waist", "hip"];

/// A bare integer size name above this is really a measurement
const MAX_PLAUSIBLE_SIZE_NAME: u32 = 50;
/// A bare integer in the first cell above this is not a usable size name
const MAX_PLAUSIBLE_FIRST_CELL: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeChartEntry {
    pub name: String,
    pub bust_cm: Option<f64>,
    pub waist_cm: Option<f64>,
    pub hips_cm: Option<f64>,
}

impl SizeChartEntry {
    fn has_measurement(&self) -> bool {
        self.bust_cm.is_some() || self.waist_cm.is_some() || self.hips_cm.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSource {
    /// Parsed from a table on the page
    Page,
    /// Built-in generic UK sizing
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeChart {
    pub entries: Vec<SizeChartEntry>,
    pub source: ChartSource,
}

impl SizeChart {
    /// Generic UK women's sizing in centimeters
    pub fn generic() -> Self {
        let entries = (0..8)
            .map(|step| {
                let offset = 5.0 * step as f64;
                SizeChartEntry {
                    name: format!("UK {}", 6 + 2 * step),
                    bust_cm: Some(79.0 + offset),
                    waist_cm: Some(61.0 + offset),
                    hips_cm: Some(86.0 + offset),
                }
            })
            .collect();

        Self {
            entries,
            source: ChartSource::Generic,
        }
    }
}

/// Column indices for each role in a size table
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct ColumnRoles {
    size: Option<usize>,
    bust: Option<usize>,
    waist: Option<usize>,
    hips: Option<usize>,
}

impl ColumnRoles {
    fn claimed_by_measurement(&self, index: usize) -> bool {
        [self.bust, self.waist, self.hips].contains(&Some(index))
    }
}

/// Whether a table's text looks like a size chart
fn is_size_table(lower_text: &str) -> bool {
    let has_measurement = MEASUREMENT_KEYWORDS.iter().any(|k| lower_text.contains(k));
    let has_size_word = lower_text.contains("size") || REGION_RE.is_match(lower_text);
    has_measurement && has_size_word
}

fn has_measurement_keyword(text: &str) -> bool {
    MEASUREMENT_KEYWORDS.iter().any(|k| text.contains(k))
}

fn has_size_keyword(text: &str) -> bool {
    text.contains("size") || REGION_RE.is_match(text)
}

/// Assign column roles from lower-cased header texts
fn assign_roles(headers: &[String]) -> ColumnRoles {
    let mut roles = ColumnRoles::default();

    for (index, text) in headers.iter().enumerate() {
        if (text.contains("bust") || text.contains("chest")) && roles.bust.is_none() {
            roles.bust = Some(index);
        } else if text.contains("waist") && roles.waist.is_none() {
            roles.waist = Some(index);
        } else if text.contains("hip") && roles.hips.is_none() {
            roles.hips = Some(index);
        }
    }

    // "UK Bust" mentions a region but is a measurement column
    roles.size = headers
        .iter()
        .position(|text| has_size_keyword(text) && !has_measurement_keyword(text));

    if roles.size.is_none() {
        roles.size = (0..headers.len()).find(|&i| !roles.claimed_by_measurement(i));
    }

    roles
}

fn bare_integer(text: &str) -> Option<u32> {
    if BARE_INTEGER_RE.is_match(text) {
        text.parse().ok()
    } else {
        None
    }
}

/// Resolve a row's size name, rejecting numbers that are really measurements
fn resolve_name(cells: &[String], size_index: Option<usize>) -> Option<String> {
    let candidate = size_index.and_then(|i| cells.get(i))?.trim();

    let name = match bare_integer(candidate) {
        Some(n) if n > MAX_PLAUSIBLE_SIZE_NAME => {
            let first = cells.first()?.trim();
            match bare_integer(first) {
                Some(n) if n > MAX_PLAUSIBLE_FIRST_CELL => return None,
                _ => first,
            }
        }
        _ => candidate,
    };

    (!name.is_empty()).then(|| name.to_string())
}

fn cell_cm(cells: &[String], index: Option<usize>) -> Option<f64> {
    index.and_then(|i| cells.get(i)).and_then(|text| units::to_cm(text))
}

fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SELECTOR).map(element_text).collect()
}

/// Parse one qualifying table into chart entries
fn parse_table(table: ElementRef<'_>) -> Vec<SizeChartEntry> {
    let rows: Vec<ElementRef<'_>> = table.select(&ROW_SELECTOR).collect();

    let Some(header_row) = rows.first() else {
        return Vec::new();
    };

    let headers: Vec<String> = row_cells(*header_row)
        .into_iter()
        .map(|h| h.to_lowercase())
        .collect();
    let roles = assign_roles(&headers);
    tracing::debug!(?headers, ?roles, "size table columns");

    rows.iter()
        .skip(1)
        .filter_map(|row| {
            let cells = row_cells(*row);
            if cells.is_empty() {
                return None;
            }
            let entry = SizeChartEntry {
                name: resolve_name(&cells, roles.size)?,
                bust_cm: cell_cm(&cells, roles.bust),
                waist_cm: cell_cm(&cells, roles.waist),
                hips_cm: cell_cm(&cells, roles.hips),
            };
            entry.has_measurement().then_some(entry)
        })
        .collect()
}

/// Find and parse a size chart on the page, if one exists
pub fn find_chart(page: &PageSnapshot) -> Option<SizeChart> {
    let table = page
        .document()
        .select(&TABLE_SELECTOR)
        .find(|table| is_size_table(&element_text(*table).to_lowercase()))?;

    let entries = parse_table(table);
    if entries.is_empty() {
        tracing::debug!("size table found but no rows parsed");
        return None;
    }

    Some(SizeChart {
        entries,
        source: ChartSource::Page,
    })
}

/// Size chart from the page, or the generic chart when none parses
pub fn extract_chart(page: &PageSnapshot) -> SizeChart {
    match find_chart(page) {
        Some(chart) => {
            tracing::debug!(rows = chart.entries.len(), "parsed size chart from page");
            chart
        }
        None => {
            tracing::debug!("no usable size chart, using generic UK sizing");
            SizeChart::generic()
        }
    }
}
