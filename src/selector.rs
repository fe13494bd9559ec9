//! Size-selector detection
//!
//! Recovers the retailer's own purchasable sizes from `<select>` controls,
//! radio groups and button/label clusters, and works out which shape they
//! take: plain sizes, waist only, separate waist and length controls, or
//! combined "W32 L34" labels.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::page::{attr, class_and_id, element_text, PageSnapshot};

static SELECT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("select").expect("Invalid select selector"));
static OPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("option").expect("Invalid option selector"));
static RADIO_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"input[type="radio"]"#).expect("Invalid radio selector")
});
static LABEL_FOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("label[for]").expect("Invalid label selector"));

/// `W32 L34`, `w32l34`
static WAIST_LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bW\s*(\d{2})\s*L\s*(\d{2})\b").expect("Invalid waist-length regex pattern")
});
/// `W32/L34`, `W32 - L34`, `W32,L34`
static WAIST_SEP_LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bW\s*(\d{2})\s*[/,-]\s*L\s*(\d{2})\b")
        .expect("Invalid waist-length regex pattern")
});
/// `32x34`, `32 × 34`, `32/34`
static PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{2})\s*[x×/]\s*(\d{2})\b").expect("Invalid waist-length regex pattern")
});

static SIZE_LIKE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(xxs|xs|s|m|l|xl|xxl|xxxl|[2-5]xl|small|medium|large|x-large|xx-large|extra small|extra large|one size|(uk|eu|us)\s*\d{1,2}|w\s*\d{2}|\d{1,2}(\.5)?)$",
    )
    .expect("Invalid size-like regex pattern")
});

/// Combined labels outside these inch ranges are something else ("10/12")
const COMBINED_WAIST_RANGE: (u32, u32) = (22, 52);
const COMBINED_LENGTH_RANGE: (u32, u32) = (24, 40);

/// Option text at or past this many characters is not a size label
const MAX_OPTION_TEXT: usize = 20;

/// Controls named like this are never size axes
const EXCLUDED_DESCRIPTORS: &[&str] = &[
    "quantity", "qty", "colour", "color", "country", "currency", "language", "sort",
];

const LENGTH_DESCRIPTORS: &[&str] = &["length", "leg", "inseam"];

/// Shopify-style generic variant option names
const GENERIC_VARIANT_NAMES: &[&str] = &["option1", "option2"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOption {
    pub text: String,
    pub value: String,
}

impl SizeOption {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// The size options a page offers, by shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum SizeSelector {
    Standard {
        options: Vec<SizeOption>,
    },
    WaistOnly {
        waist_options: Vec<SizeOption>,
    },
    WaistLength {
        waist_options: Vec<SizeOption>,
        length_options: Vec<SizeOption>,
    },
    WaistLengthCombined {
        options: Vec<SizeOption>,
    },
}

impl SizeSelector {
    pub fn shape(&self) -> &'static str {
        match self {
            SizeSelector::Standard { .. } => "standard",
            SizeSelector::WaistOnly { .. } => "waist-only",
            SizeSelector::WaistLength { .. } => "waist-length",
            SizeSelector::WaistLengthCombined { .. } => "waist-length-combined",
        }
    }

    /// Every option the selector offers, in page order
    pub fn options(&self) -> Vec<&SizeOption> {
        match self {
            SizeSelector::Standard { options } | SizeSelector::WaistLengthCombined { options } => {
                options.iter().collect()
            }
            SizeSelector::WaistOnly { waist_options } => waist_options.iter().collect(),
            SizeSelector::WaistLength {
                waist_options,
                length_options,
            } => waist_options.iter().chain(length_options.iter()).collect(),
        }
    }
}

/// Parse a combined waist/length label into inches, e.g. "W32 L34" -> (32, 34)
pub fn parse_waist_length(text: &str) -> Option<(u32, u32)> {
    [&*WAIST_LENGTH_RE, &*WAIST_SEP_LENGTH_RE, &*PAIR_RE]
        .into_iter()
        .find_map(|re| {
            let caps = re.captures(text)?;
            let waist: u32 = caps[1].parse().ok()?;
            let length: u32 = caps[2].parse().ok()?;
            let plausible = (COMBINED_WAIST_RANGE.0..=COMBINED_WAIST_RANGE.1).contains(&waist)
                && (COMBINED_LENGTH_RANGE.0..=COMBINED_LENGTH_RANGE.1).contains(&length);
            plausible.then_some((waist, length))
        })
}

fn has_combined(options: &[SizeOption]) -> bool {
    options.iter().any(|o| parse_waist_length(&o.text).is_some())
}

/// Most option texts read as sizes
fn looks_size_like(options: &[SizeOption]) -> bool {
    let hits = options
        .iter()
        .filter(|o| SIZE_LIKE_RE.is_match(o.text.trim()))
        .count();
    hits > 0 && hits * 2 > options.len()
}

/// Which measurement axis a control picks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Size,
    Waist,
    Length,
}

/// Selector battery for button and label clusters
struct ClusterRule {
    platform: &'static str,
    selector: &'static str,
    control: Control,
}

const fn cluster(platform: &'static str, selector: &'static str, control: Control) -> ClusterRule {
    ClusterRule { platform, selector, control }
}

const CLUSTER_RULES: &[ClusterRule] = &[
    cluster("generic", r#"[class*="waist"] button, [class*="waist"] li"#, Control::Waist),
    cluster("generic", r#"[class*="length"] button, [class*="length"] li, [class*="inseam"] button"#, Control::Length),
    cluster("generic", r#"[class*="size-selector"] button, [class*="size-selector"] li, [class*="sizeSelector"] button"#, Control::Size),
    cluster("generic", r#"[class*="size-options"] button, [class*="size-list"] li, [class*="size-list"] button"#, Control::Size),
    cluster("generic", "button[data-size], li[data-size], [data-size-value]", Control::Size),
    cluster("zara", ".size-selector-list li, .product-detail-size-selector li", Control::Size),
    cluster("hm", ".product-sizes li, .product-sizes button", Control::Size),
    cluster("boohoo", ".swatches.size .swatch, .swatches.size a", Control::Size),
    cluster("shopify", "variant-radios label, .product-form__input label", Control::Size),
];

/// Candidate options collected from all sources
#[derive(Debug, Default)]
struct Findings {
    combined: Option<Vec<SizeOption>>,
    size: Option<Vec<SizeOption>>,
    waist: Option<Vec<SizeOption>>,
    length: Option<Vec<SizeOption>>,
}

impl Findings {
    /// Keep the candidate with the most distinct options; ties keep the first
    fn offer(&mut self, control: Control, options: Vec<SizeOption>) {
        if options.is_empty() {
            return;
        }
        if has_combined(&options) {
            self.combined.get_or_insert(options);
            return;
        }
        let slot = match control {
            Control::Size => &mut self.size,
            Control::Waist => &mut self.waist,
            Control::Length => &mut self.length,
        };
        if slot.as_ref().map_or(true, |current| options.len() > current.len()) {
            *slot = Some(options);
        }
    }

    fn resolve(self) -> Option<SizeSelector> {
        if let Some(options) = self.combined {
            return Some(SizeSelector::WaistLengthCombined { options });
        }
        match (self.waist, self.length, self.size) {
            (Some(waist_options), Some(length_options), _) => Some(SizeSelector::WaistLength {
                waist_options,
                length_options,
            }),
            (Some(waist_options), None, _) => Some(SizeSelector::WaistOnly { waist_options }),
            (None, _, Some(options)) => Some(SizeSelector::Standard { options }),
            _ => None,
        }
    }
}

/// Classify a control from its lower-cased label/name text and options
fn classify_control(descriptor: &str, options: &[SizeOption]) -> Option<Control> {
    if EXCLUDED_DESCRIPTORS.iter().any(|w| descriptor.contains(w)) {
        return None;
    }
    if descriptor.contains("waist") {
        return Some(Control::Waist);
    }
    if LENGTH_DESCRIPTORS.iter().any(|w| descriptor.contains(w)) {
        return Some(Control::Length);
    }
    (descriptor.contains("size") || looks_size_like(options)).then_some(Control::Size)
}

/// Visible text of every `label[for]`, keyed by the id it labels
fn labels_by_target(page: &PageSnapshot) -> HashMap<String, String> {
    page.document()
        .select(&LABEL_FOR_SELECTOR)
        .filter_map(|label| {
            let target = attr(&label, "for")?;
            Some((target.to_string(), element_text(label)))
        })
        .collect()
}

fn push_distinct(options: &mut Vec<SizeOption>, option: SizeOption) {
    if !options.iter().any(|o| o.text == option.text) {
        options.push(option);
    }
}

fn select_options(select: ElementRef<'_>) -> Vec<SizeOption> {
    let mut options = Vec::new();
    for option in select.select(&OPTION_SELECTOR) {
        if option.value().attr("disabled").is_some() {
            continue;
        }
        let text = element_text(option);
        let value = option
            .value()
            .attr("value")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| text.clone());
        if value.is_empty() || text.is_empty() {
            continue;
        }
        push_distinct(&mut options, SizeOption { text, value });
    }
    options
}

/// Label, aria-label, name, id and any size-ish ancestor, lower-cased
fn select_descriptor(select: ElementRef<'_>, labels: &HashMap<String, String>) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(label) = attr(&select, "id").and_then(|id| labels.get(id)) {
        parts.push(label.clone());
    }
    for name in ["aria-label", "name", "id"] {
        if let Some(value) = attr(&select, name) {
            parts.push(value.to_string());
        }
    }
    if let Some(container) = select
        .ancestors()
        .filter_map(ElementRef::wrap)
        .map(|el| class_and_id(&el))
        .find(|ident| ident.contains("size"))
    {
        parts.push(container);
    }

    parts.join(" ").to_lowercase()
}

/// Dropdowns; a combined control short-circuits the whole scan
fn scan_selects(
    page: &PageSnapshot,
    labels: &HashMap<String, String>,
    findings: &mut Findings,
) -> Option<SizeSelector> {
    for select in page.document().select(&SELECT_SELECTOR) {
        let options = select_options(select);
        if options.is_empty() {
            continue;
        }
        if has_combined(&options) {
            tracing::debug!(count = options.len(), "combined waist/length dropdown");
            return Some(SizeSelector::WaistLengthCombined { options });
        }
        let descriptor = select_descriptor(select, labels);
        if let Some(control) = classify_control(&descriptor, &options) {
            tracing::debug!(%descriptor, ?control, count = options.len(), "size dropdown");
            findings.offer(control, options);
        }
    }
    None
}

fn radio_label(radio: ElementRef<'_>, labels: &HashMap<String, String>) -> Option<String> {
    if let Some(text) = attr(&radio, "id").and_then(|id| labels.get(id)) {
        if !text.is_empty() {
            return Some(text.clone());
        }
    }
    radio
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "label")
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn scan_radios(page: &PageSnapshot, labels: &HashMap<String, String>, findings: &mut Findings) {
    let mut groups: Vec<(String, Vec<SizeOption>)> = Vec::new();

    for radio in page.document().select(&RADIO_SELECTOR) {
        let Some(name) = attr(&radio, "name") else {
            continue;
        };
        let value = attr(&radio, "value").unwrap_or_default().to_string();
        let text = radio_label(radio, labels).unwrap_or_else(|| value.clone());
        if text.is_empty() {
            continue;
        }
        let option = SizeOption { text, value };

        match groups.iter_mut().find(|(group, _)| group == name) {
            Some((_, options)) => push_distinct(options, option),
            None => groups.push((name.to_string(), vec![option])),
        }
    }

    for (name, options) in groups {
        let descriptor = name.to_lowercase();
        let control = classify_control(&descriptor, &options).or_else(|| {
            GENERIC_VARIANT_NAMES
                .contains(&descriptor.as_str())
                .then_some(Control::Size)
        });
        if let Some(control) = control {
            tracing::debug!(group = %name, ?control, count = options.len(), "size radio group");
            findings.offer(control, options);
        }
    }
}

/// Text for a size button, falling back to attributes when it is empty or long
fn cluster_text(element: ElementRef<'_>) -> String {
    let text = element_text(element);
    if !text.is_empty() && text.chars().count() <= MAX_OPTION_TEXT {
        return text;
    }
    ["aria-label", "data-value", "data-size"]
        .into_iter()
        .find_map(|name| attr(&element, name))
        .map(str::to_string)
        .unwrap_or(text)
}

fn cluster_value(element: ElementRef<'_>, text: &str) -> String {
    ["data-value", "data-size", "data-variant-id", "data-option-value", "value"]
        .into_iter()
        .find_map(|name| attr(&element, name))
        .unwrap_or(text)
        .to_string()
}

fn scan_clusters(page: &PageSnapshot, findings: &mut Findings) {
    for rule in CLUSTER_RULES {
        let mut options = Vec::new();
        for element in page.select_all(rule.selector) {
            let text = cluster_text(element);
            if text.is_empty() || text.chars().count() >= MAX_OPTION_TEXT {
                continue;
            }
            let value = cluster_value(element, &text);
            push_distinct(&mut options, SizeOption { text, value });
        }
        if !options.is_empty() {
            tracing::debug!(
                platform = rule.platform,
                control = ?rule.control,
                count = options.len(),
                "size button cluster"
            );
            findings.offer(rule.control, options);
        }
    }
}

/// Detect the page's own size selector, if it has one
pub fn detect_selector(page: &PageSnapshot) -> Option<SizeSelector> {
    let labels = labels_by_target(page);
    let mut findings = Findings::default();

    if let Some(combined) = scan_selects(page, &labels, &mut findings) {
        return Some(combined);
    }
    scan_radios(page, &labels, &mut findings);
    scan_clusters(page, &mut findings);

    let selector = findings.resolve();
    match &selector {
        Some(s) => tracing::debug!(shape = s.shape(), "size selector detected"),
        None => tracing::debug!("no size selector on page"),
    }
    selector
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> PageSnapshot {
        PageSnapshot::parse(
            "https://shop.example/products/1",
            &format!("<html><body>{}</body></html>", body),
        )
    }

    fn texts(options: &[SizeOption]) -> Vec<&str> {
        options.iter().map(|o| o.text.as_str()).collect()
    }

    #[test]
    fn test_parse_waist_length() {
        assert_eq!(parse_waist_length("W32 L34"), Some((32, 34)));
        assert_eq!(parse_waist_length("w30l32"), Some((30, 32)));
        assert_eq!(parse_waist_length("W34/L30"), Some((34, 30)));
        assert_eq!(parse_waist_length("32x34"), Some((32, 34)));
        assert_eq!(parse_waist_length("32X34"), Some((32, 34)));
        assert_eq!(parse_waist_length("36 × 32"), Some((36, 32)));
        assert_eq!(parse_waist_length("M"), None);
        // dual UK dress sizes, not waist/length
        assert_eq!(parse_waist_length("10/12"), None);
    }

    #[test]
    fn test_standard_dropdown_skips_placeholder_and_disabled() {
        let p = page(
            r#"
            <label for="size-select">Size</label>
            <select id="size-select">
                <option value="">Please select</option>
                <option value="s">S</option>
                <option value="m">M</option>
                <option value="l" disabled>L - Out of stock</option>
            </select>
            "#,
        );
        match detect_selector(&p) {
            Some(SizeSelector::Standard { options }) => {
                assert_eq!(texts(&options), vec!["S", "M"]);
                assert_eq!(options[0].value, "s");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_combined_dropdown_short_circuits() {
        let p = page(
            r#"
            <select name="waist"><option value="30">30</option></select>
            <select name="variant">
                <option value="1">W30 L32</option>
                <option value="2">W32 L32</option>
            </select>
            "#,
        );
        match detect_selector(&p) {
            Some(SizeSelector::WaistLengthCombined { options }) => assert_eq!(options.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_separate_waist_and_length() {
        let p = page(
            r#"
            <select name="waist" aria-label="Waist"><option value="30">30</option><option value="32">32</option></select>
            <select name="leg-length"><option value="30">30</option><option value="32">32</option></select>
            "#,
        );
        match detect_selector(&p) {
            Some(SizeSelector::WaistLength { waist_options, length_options }) => {
                assert_eq!(texts(&waist_options), vec!["30", "32"]);
                assert_eq!(length_options.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_waist_only() {
        let p = page(
            r#"<div class="waist-picker"><button>28</button><button>30</button><button>32</button></div>"#,
        );
        match detect_selector(&p) {
            Some(SizeSelector::WaistOnly { waist_options }) => {
                assert_eq!(texts(&waist_options), vec!["28", "30", "32"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_quantity_dropdown_ignored() {
        let p = page(
            r#"<select name="quantity"><option value="1">1</option><option value="2">2</option></select>"#,
        );
        assert_eq!(detect_selector(&p), None);
    }

    #[test]
    fn test_radio_group_prefers_most_options() {
        let p = page(
            r#"
            <input type="radio" name="option1" id="c1" value="Blue"><label for="c1">Blue</label>
            <input type="radio" name="Size" id="s1" value="S"><label for="s1">S</label>
            <input type="radio" name="Size" id="s2" value="M"><label for="s2">M</label>
            <label><input type="radio" name="Size" value="L"> L </label>
            <input type="radio" name="Size" value="XL">
            "#,
        );
        match detect_selector(&p) {
            Some(SizeSelector::Standard { options }) => {
                assert_eq!(texts(&options), vec!["S", "M", "L", "XL"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_button_text_falls_back_to_attributes() {
        let p = page(
            r#"
            <ul class="size-list">
                <li data-value="8"><span></span></li>
                <li aria-label="UK 10">UK 10 - only a few left in stock, order soon</li>
                <li>This size is currently unavailable everywhere</li>
            </ul>
            "#,
        );
        match detect_selector(&p) {
            Some(SizeSelector::Standard { options }) => {
                assert_eq!(texts(&options), vec!["8", "UK 10"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_selector() {
        let p = page("<p>Just a description</p>");
        assert_eq!(detect_selector(&p), None);
    }
}
