//! Garment classification: tops, bottoms, or unknown

use serde::Serialize;

use crate::page::PageSnapshot;

/// Checked before tops, so "denim shirt dress" style clashes resolve to bottoms
const BOTTOMS_KEYWORDS: &[&str] = &[
    "jeans", "trouser", "pant", "chino", "jogger", "cargo", "denim", "shorts", "skirt",
];

const TOPS_KEYWORDS: &[&str] = &[
    "shirt", "blouse", "tee", "top", "sweater", "jumper", "hoodie", "cardigan", "jacket",
    "coat", "dress", "jumpsuit", "polo", "vest",
];

/// Body-text phrases that only show up on bottoms pages
const BOTTOMS_PHRASES: &[&str] = &["waist size", "inseam", "leg length", "inside leg"];

/// How much visible text the last-resort scan reads
const BODY_SCAN_CHARS: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Tops,
    Bottoms,
    Unknown,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Tops => "tops",
            ProductType::Bottoms => "bottoms",
            ProductType::Unknown => "unknown",
        }
    }
}

/// Classify the product on a page from its URL, title, heading and text
pub fn classify_product(page: &PageSnapshot) -> ProductType {
    let identity = format!(
        "{} {} {}",
        page.url(),
        page.title().unwrap_or_default(),
        page.first_heading().unwrap_or_default()
    )
    .to_lowercase();

    if let Some(keyword) = BOTTOMS_KEYWORDS.iter().find(|k| identity.contains(*k)) {
        tracing::debug!(keyword, "bottoms keyword in url/title/heading");
        return ProductType::Bottoms;
    }
    if let Some(keyword) = TOPS_KEYWORDS.iter().find(|k| identity.contains(*k)) {
        tracing::debug!(keyword, "tops keyword in url/title/heading");
        return ProductType::Tops;
    }

    let body: String = page
        .body_text()
        .chars()
        .take(BODY_SCAN_CHARS)
        .collect::<String>()
        .to_lowercase();
    if let Some(phrase) = BOTTOMS_PHRASES.iter().find(|p| body.contains(*p)) {
        tracing::debug!(phrase, "bottoms phrase in page text");
        return ProductType::Bottoms;
    }

    ProductType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, title: &str, body: &str) -> PageSnapshot {
        PageSnapshot::parse(
            url,
            &format!("<html><head><title>{}</title></head><body>{}</body></html>", title, body),
        )
    }

    #[test]
    fn test_bottoms_from_url() {
        let p = page("https://shop.example/products/slim-jeans", "Item", "");
        assert_eq!(classify_product(&p), ProductType::Bottoms);
    }

    #[test]
    fn test_bottoms_checked_before_tops() {
        // "denim" and "jacket" both present
        let p = page("https://shop.example/p/1", "Denim Jacket", "");
        assert_eq!(classify_product(&p), ProductType::Bottoms);
    }

    #[test]
    fn test_tops_from_heading() {
        let p = page("https://shop.example/p/1", "Item 123", "<h1>Linen Blouse</h1>");
        assert_eq!(classify_product(&p), ProductType::Tops);
    }

    #[test]
    fn test_body_phrases_are_last_resort() {
        let p = page(
            "https://shop.example/p/1",
            "Item 123",
            "<h1>The Classic</h1><p>Model wears a 32 inseam.</p>",
        );
        assert_eq!(classify_product(&p), ProductType::Bottoms);
    }

    #[test]
    fn test_body_scan_is_bounded() {
        let filler = "lorem ipsum ".repeat(400);
        let p = page(
            "https://shop.example/p/1",
            "Item 123",
            &format!("<p>{}</p><p>inside leg 32</p>", filler),
        );
        assert_eq!(classify_product(&p), ProductType::Unknown);
    }

    #[test]
    fn test_unknown() {
        let p = page("https://shop.example/p/1", "Gift Card", "<h1>Gift Card</h1>");
        assert_eq!(classify_product(&p), ProductType::Unknown);
    }
}
