//! Size-selection UI detection
//!
//! Answers one question about a snapshot: does it currently show anything a
//! shopper would use to pick a size? Three independent signals are OR-ed:
//!
//! 1. the selector battery below, an ordered table of
//!    `(platform, selector, role)` rules - new storefronts are added here as
//!    data rather than code;
//! 2. a short size token (XS..3XL or a 1-2 digit number) as the whole text
//!    of an element sitting inside a "product" container;
//! 3. a size prompt ("select size") and a cart action ("add to cart") both
//!    appearing in the page text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::page::{element_text, PageSnapshot};

/// What a matching selector rule is evidence of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiRole {
    /// A container wrapping size controls
    SizeContainer,
    /// A size dropdown, radio or button
    SizeControl,
    /// A generic product-variant picker that usually carries sizes
    VariantPicker,
}

#[derive(Debug, Clone, Copy)]
pub struct SelectorRule {
    pub platform: &'static str,
    pub selector: &'static str,
    pub role: UiRole,
}

const fn rule(platform: &'static str, selector: &'static str, role: UiRole) -> SelectorRule {
    SelectorRule { platform, selector, role }
}

pub const SIZE_UI_RULES: &[SelectorRule] = &[
    // generic class/attribute patterns
    rule("generic", r#"[class*="size-selector"], [class*="sizeSelector"], [class*="size_selector"]"#, UiRole::SizeContainer),
    rule("generic", r#"[class*="size-picker"], [class*="sizePicker"], [class*="size-list"], [class*="size-options"]"#, UiRole::SizeContainer),
    rule("generic", r#"[data-testid*="size"], [data-test*="size"], [data-qa*="size"]"#, UiRole::SizeContainer),
    rule("generic", r#"select[name*="size"], select[name*="Size"], select[id*="size"], select[id*="Size"]"#, UiRole::SizeControl),
    rule("generic", r#"input[type="radio"][name*="size"], input[type="radio"][name*="Size"]"#, UiRole::SizeControl),
    rule("generic", r#"button[data-size], li[data-size], [data-size-value], [aria-label*="size"], [aria-label*="Size"]"#, UiRole::SizeControl),
    rule("generic", r#"select[name*="waist"], select[name*="length"], [class*="waist-selector"], [class*="length-selector"]"#, UiRole::SizeControl),
    // known storefronts
    rule("asos", r#"[data-testid="size-select"], #main-size-select-0"#, UiRole::SizeControl),
    rule("zara", ".product-detail-size-selector, .size-selector-list", UiRole::SizeContainer),
    rule("hm", r#".product-sizes, [data-testid="size-selector"]"#, UiRole::SizeContainer),
    rule("boohoo", ".swatches.size, .b-product_details-variations", UiRole::SizeContainer),
    rule("amazon", "#variation_size_name, #native_dropdown_selected_size_name", UiRole::SizeControl),
    rule("woocommerce", "select#pa_size, table.variations select", UiRole::SizeControl),
    // variant pickers
    rule("shopify", r#"variant-radios, variant-selects, .product-form__input, input[name="options[Size]"]"#, UiRole::VariantPicker),
    rule("shopify", r#"select[name="option1"], input[type="radio"][name="option1"], input[type="radio"][name="option2"]"#, UiRole::VariantPicker),
    rule("generic", r#"[class*="variant-selector"], [class*="swatch"][class*="size"], [class*="variation"] select"#, UiRole::VariantPicker),
];

static SIZE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(xxs|xs|s|m|l|xl|xxl|xxxl|[2-4]xl|\d{1,2})$").expect("Invalid size token regex")
});

/// Elements whose own text may be a bare size token
const TOKEN_CANDIDATES: &str = "button, label, li, span, a, option";

const SIZE_PROMPTS: &[&str] = &[
    "select size",
    "select a size",
    "select your size",
    "choose size",
    "choose a size",
    "choose your size",
    "pick a size",
];

const CART_ACTIONS: &[&str] = &[
    "add to cart",
    "add to bag",
    "add to basket",
    "buy now",
];

/// Which signal revealed the size UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum SizeUiSignal {
    Selector {
        platform: &'static str,
        role: UiRole,
        selector: &'static str,
    },
    SizeToken { token: String },
    Prompt { prompt: &'static str, action: &'static str },
}

/// Find the first signal that the page exposes size-selection UI
pub fn detect_size_ui(page: &PageSnapshot) -> Option<SizeUiSignal> {
    for rule in SIZE_UI_RULES {
        if page.select_first(rule.selector).is_some() {
            return Some(SizeUiSignal::Selector {
                platform: rule.platform,
                role: rule.role,
                selector: rule.selector,
            });
        }
    }

    if let Some(token) = find_size_token(page) {
        return Some(SizeUiSignal::SizeToken { token });
    }

    let text = page.body_text().to_lowercase();
    let prompt = SIZE_PROMPTS.iter().copied().find(|p| text.contains(p));
    let action = CART_ACTIONS.iter().copied().find(|a| text.contains(a));
    if let (Some(prompt), Some(action)) = (prompt, action) {
        return Some(SizeUiSignal::Prompt { prompt, action });
    }

    None
}

pub fn has_size_ui(page: &PageSnapshot) -> bool {
    detect_size_ui(page).is_some()
}

/// A bare size token inside an element with a "product" ancestor
fn find_size_token(page: &PageSnapshot) -> Option<String> {
    page.select_all(TOKEN_CANDIDATES)
        .into_iter()
        .find_map(|element| {
            let text = element_text(element);
            if !SIZE_TOKEN_RE.is_match(&text) {
                return None;
            }
            let in_product = element.ancestors().any(|node| {
                node.value().as_element().is_some_and(|el| {
                    el.name().contains("product")
                        || el.classes().any(|c| c.to_lowercase().contains("product"))
                })
            });
            in_product.then_some(text)
        })
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

    #[test]
    fn test_all_rules_parse() {
        for rule in SIZE_UI_RULES {
            assert!(
                scraper::Selector::parse(rule.selector).is_ok(),
                "bad selector: {}",
                rule.selector
            );
        }
    }

    #[test]
    fn test_selector_battery() {
        let p = page(r#"<div class="pdp-size-selector"><button>S</button></div>"#);
        match detect_size_ui(&p) {
            Some(SizeUiSignal::Selector { role, .. }) => assert_eq!(role, UiRole::SizeContainer),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_variant_picker() {
        let p = page(r#"<form><select name="option1"><option>Small</option></select></form>"#);
        assert!(matches!(
            detect_size_ui(&p),
            Some(SizeUiSignal::Selector { platform: "shopify", .. })
        ));
    }

    #[test]
    fn test_size_token_needs_product_ancestor() {
        let inside = page(r#"<section class="product-main"><ul><li>XL</li></ul></section>"#);
        assert_eq!(
            detect_size_ui(&inside),
            Some(SizeUiSignal::SizeToken { token: "XL".to_string() })
        );

        let outside = page(r#"<nav><ul><li>XL</li><li>12</li></ul></nav>"#);
        assert_eq!(detect_size_ui(&outside), None);
    }

    #[test]
    fn test_prompt_and_cart_phrases() {
        let both = page("<p>Please select a size</p><p>Add to bag</p>");
        assert!(matches!(detect_size_ui(&both), Some(SizeUiSignal::Prompt { .. })));

        let prompt_only = page("<p>Please select a size</p>");
        assert!(!has_size_ui(&prompt_only));
    }

    #[test]
    fn test_plain_page_has_no_size_ui() {
        let p = page("<article><h1>Blog</h1><p>Nothing to buy here.</p></article>");
        assert!(!has_size_ui(&p));
    }
}
