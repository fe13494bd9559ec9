//! Recommendation rendering: the card payload, its HTML, and its insertion
//! into a page document.

use std::collections::BTreeMap;

use colored::Colorize;
use html_escape::{encode_double_quoted_attribute, encode_text};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Serialize;

use crate::matching::{MatchSource, RecommendationKind, SizeMatch};
use crate::page::parse_selector;

/// Stable id of the injected card; at most one exists per document
pub const RECOMMENDATION_ID: &str = "fitcheck-recommendation";

static EXISTING_CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(&format!("#{}", RECOMMENDATION_ID)).expect("Invalid card selector")
});
static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Invalid body selector"));

/// Everything the renderer shows, already formatted for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationCard {
    pub size: String,
    /// Rounded to a whole percentage
    pub confidence: u8,
    pub kind: RecommendationKind,
    pub source: MatchSource,
    pub warnings: Vec<String>,
    pub details: BTreeMap<String, String>,
}

impl RecommendationCard {
    pub fn from_match(matched: &SizeMatch) -> Self {
        let rec = &matched.recommendation;
        Self {
            size: rec.size.clone(),
            confidence: rec.confidence.round().clamp(0.0, 100.0) as u8,
            kind: rec.kind,
            source: matched.source,
            warnings: rec.warnings.iter().map(|w| w.message.clone()).collect(),
            details: rec.details.clone(),
        }
    }

    fn kind_attr(&self) -> &'static str {
        match self.kind {
            RecommendationKind::Standard => "standard",
            RecommendationKind::WaistOnly => "waist-only",
            RecommendationKind::WaistLength => "waist-length",
        }
    }
}

/// The card as a self-contained HTML fragment
pub fn render_card_html(card: &RecommendationCard) -> String {
    let mut html = format!(
        r#"<div id="{}" class="fitcheck-card" data-kind="{}" data-confidence="{}">"#,
        RECOMMENDATION_ID,
        card.kind_attr(),
        card.confidence
    );

    html.push_str(&format!(
        r#"<div class="fitcheck-header"><span class="fitcheck-title">Recommended size</span><span class="fitcheck-size" title="{}">{}</span></div>"#,
        encode_double_quoted_attribute(&card.size),
        encode_text(&card.size)
    ));
    html.push_str(&format!(
        r#"<div class="fitcheck-confidence">{}% match</div>"#,
        card.confidence
    ));

    if !card.warnings.is_empty() {
        html.push_str(r#"<ul class="fitcheck-warnings">"#);
        for warning in &card.warnings {
            html.push_str(&format!("<li>{}</li>", encode_text(warning)));
        }
        html.push_str("</ul>");
    }

    if !card.details.is_empty() {
        html.push_str(r#"<dl class="fitcheck-details">"#);
        for (key, value) in &card.details {
            html.push_str(&format!(
                "<dt>{}</dt><dd>{}</dd>",
                encode_text(key),
                encode_text(value)
            ));
        }
        html.push_str("</dl>");
    }

    html.push_str(&format!(
        r#"<div class="fitcheck-source">Based on {}</div></div>"#,
        card.source.describe()
    ));
    html
}

/// Insert the card into a document, replacing any earlier card.
///
/// The card is prepended inside the first element matching
/// `insertion_selector`, else inside `<body>`, else at the document root.
/// Running it twice leaves exactly one card.
pub fn insert_recommendation(
    document: &mut Html,
    card: &RecommendationCard,
    insertion_selector: Option<&str>,
) {
    let stale: Vec<_> = document
        .select(&EXISTING_CARD_SELECTOR)
        .map(|el| el.id())
        .collect();
    for id in stale {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let site_target = insertion_selector
        .and_then(parse_selector)
        .and_then(|selector| document.select(&selector).next().map(|el| el.id()));
    let target = site_target
        .or_else(|| document.select(&BODY_SELECTOR).next().map(|el| el.id()))
        .unwrap_or_else(|| document.tree.root().id());
    if site_target.is_none() {
        tracing::debug!(?insertion_selector, "insertion point not found, using body");
    }

    let fragment = Html::parse_fragment(&render_card_html(card));
    let top_level: Vec<_> = fragment.root_element().children().map(|c| c.id()).collect();

    // (fragment node, copy in document) pairs whose children still need copying
    let mut pending = Vec::new();
    for src in top_level.into_iter().rev() {
        let (Some(node), Some(mut parent)) = (fragment.tree.get(src), document.tree.get_mut(target))
        else {
            continue;
        };
        let copied = parent.prepend(node.value().clone()).id();
        pending.push((src, copied));
    }

    while let Some((src, dst)) = pending.pop() {
        let Some(node) = fragment.tree.get(src) else {
            continue;
        };
        for child in node.children() {
            let Some(mut parent) = document.tree.get_mut(dst) else {
                break;
            };
            let copied = parent.append(child.value().clone()).id();
            pending.push((child.id(), copied));
        }
    }
}

/// The card for a terminal
pub fn render_terminal(card: &RecommendationCard) -> String {
    let confidence = format!("{}% match", card.confidence);
    let confidence = match card.confidence {
        80..=100 => confidence.green(),
        50..=79 => confidence.yellow(),
        _ => confidence.red(),
    };

    let mut lines = vec![
        format!("{} {}", "Recommended size:".bold(), card.size.cyan().bold()),
        format!("  {}", confidence),
    ];
    for warning in &card.warnings {
        lines.push(format!("  {} {}", "!".yellow().bold(), warning.yellow()));
    }
    for (key, value) in &card.details {
        lines.push(format!("  {}: {}", key.dimmed(), value));
    }
    lines.push(format!("  {}", format!("Based on {}", card.source.describe()).dimmed()));
    lines.join("\n")
}
