//! PageSnapshot - one parsed view of a product page
//!
//! Every heuristic in the crate reads from a snapshot: the URL, title, first
//! heading and visible text are pulled out once here so the classifiers and
//! extractors agree on what the page says.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Invalid whitespace regex pattern")
});

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Invalid body selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Invalid title selector"));
static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("Invalid heading selector"));

/// Elements whose text never reaches the shopper
const INVISIBLE_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// A parsed snapshot of a page at one point in time
pub struct PageSnapshot {
    url: String,
    html: String,
    document: Html,
}

impl PageSnapshot {
    pub fn parse(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            html: html.to_string(),
            document: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Host of the page URL, lower-cased
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }

    /// Check if raw HTML contains a pattern (case-insensitive)
    pub fn html_contains(&self, pattern: &str) -> bool {
        self.html.to_lowercase().contains(&pattern.to_lowercase())
    }

    pub fn title(&self) -> Option<String> {
        self.document
            .select(&TITLE_SELECTOR)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    }

    pub fn first_heading(&self) -> Option<String> {
        self.document
            .select(&HEADING_SELECTOR)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    }

    /// Visible body text with whitespace collapsed
    pub fn body_text(&self) -> String {
        match self.document.select(&BODY_SELECTOR).next() {
            Some(body) => visible_text(body),
            None => String::new(),
        }
    }

    /// Run a CSS selector, treating an unparseable selector as matching nothing
    pub fn select_all(&self, css: &str) -> Vec<ElementRef<'_>> {
        let Some(selector) = parse_selector(css) else {
            return Vec::new();
        };
        let found: Vec<ElementRef<'_>> = self.document.select(&selector).collect();
        found
    }

    /// First element matching a CSS selector
    pub fn select_first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = parse_selector(css)?;
        let first = self.document.select(&selector).next();
        first
    }
}

/// Parse a selector, logging and discarding invalid ones
pub fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!(selector = css, error = ?e, "skipping invalid selector");
            None
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// All text beneath an element, whitespace-collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text beneath an element, skipping script/style content
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .map(|name| INVISIBLE_TAGS.contains(&name.as_str()))
            .unwrap_or(false);
        if !hidden {
            let s: &str = &text.text;
            parts.push(s);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

/// Attribute lookup returning trimmed, non-empty values only
pub fn attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Lower-cased class and id of an element, for keyword matching
pub fn class_and_id(element: &ElementRef<'_>) -> String {
    let value = element.value();
    let mut parts: Vec<&str> = value.classes().collect();
    if let Some(id) = value.id() {
        parts.push(id);
    }
    parts.join(" ").to_lowercase()
}
