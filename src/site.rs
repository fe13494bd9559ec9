//! Known storefronts and their per-site selectors
//!
//! Sites we have markup knowledge for get a size-guide selector to wait on,
//! an insertion point for the recommendation card, and a flag saying whether
//! their product UI is rendered client-side (and so needs longer waits).
//! Most pages match no known site, which is fine.

use serde::Serialize;

use crate::page::PageSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownSite {
    Asos,
    Zara,
    Boohoo,
    PrettyLittleThing,
    HM,
    Shopify,
}

/// Host substrings identifying a known site
const SITE_HOSTS: &[(&str, KnownSite)] = &[
    ("asos.com", KnownSite::Asos),
    ("zara.com", KnownSite::Zara),
    ("boohoo.com", KnownSite::Boohoo),
    ("prettylittlething.com", KnownSite::PrettyLittleThing),
    ("hm.com", KnownSite::HM),
    ("myshopify.com", KnownSite::Shopify),
];

/// Markup that gives away a Shopify storefront on a custom domain
const SHOPIFY_SIGNATURES: &[&str] = &["cdn.shopify.com", "shopify.theme", "window.shopify"];

/// Per-site selectors: (site, size guide, insertion point)
const SITE_SELECTORS: &[(KnownSite, &str, &str)] = &[
    (
        KnownSite::Asos,
        r#".size-guide, .product-size, [data-testid="size-guide"]"#,
        r#".product-size, .product-details, [data-testid="product-size"]"#,
    ),
    (
        KnownSite::Zara,
        ".size-guide, .product-detail-size-info",
        ".product-detail-info, .product-size-info",
    ),
    (
        KnownSite::Boohoo,
        ".size-guide, .product-size-guide",
        ".product-size, .product-info",
    ),
    (
        KnownSite::PrettyLittleThing,
        ".size-guide, .size-selector",
        ".product-details, .size-selector",
    ),
    (
        KnownSite::HM,
        ".size-guide, .product-size-info",
        ".product-description, .product-size-info",
    ),
    (
        KnownSite::Shopify,
        "variant-radios, variant-selects, .product-form__input",
        ".product-form, .product__info-container",
    ),
];

const DEFAULT_SIZE_GUIDE_SELECTOR: &str = ".size-guide";

impl KnownSite {
    /// Identify a known site from its host name
    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.to_lowercase();
        SITE_HOSTS
            .iter()
            .find(|(pattern, _)| host.contains(pattern))
            .map(|(_, site)| *site)
    }

    /// Identify a known site from host, falling back to platform markup
    pub fn detect(page: &PageSnapshot) -> Option<Self> {
        if let Some(site) = page.host().as_deref().and_then(Self::from_host) {
            return Some(site);
        }

        SHOPIFY_SIGNATURES
            .iter()
            .any(|sig| page.html_contains(sig))
            .then_some(KnownSite::Shopify)
    }

    pub fn id(&self) -> &'static str {
        match self {
            KnownSite::Asos => "asos",
            KnownSite::Zara => "zara",
            KnownSite::Boohoo => "boohoo",
            KnownSite::PrettyLittleThing => "plt",
            KnownSite::HM => "hm",
            KnownSite::Shopify => "shopify",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            KnownSite::Asos => "ASOS",
            KnownSite::Zara => "Zara",
            KnownSite::Boohoo => "boohoo",
            KnownSite::PrettyLittleThing => "PrettyLittleThing",
            KnownSite::HM => "H&M",
            KnownSite::Shopify => "Shopify store",
        }
    }

    fn selectors(&self) -> Option<&'static (KnownSite, &'static str, &'static str)> {
        SITE_SELECTORS.iter().find(|(site, _, _)| site == self)
    }

    /// Selector for the element that signals the size guide has rendered
    pub fn size_guide_selector(&self) -> &'static str {
        self.selectors()
            .map(|(_, guide, _)| *guide)
            .unwrap_or(DEFAULT_SIZE_GUIDE_SELECTOR)
    }

    /// Selector for where the recommendation card should go
    pub fn insertion_selector(&self) -> Option<&'static str> {
        self.selectors().map(|(_, _, insert)| *insert)
    }

    /// Whether product UI arrives after the initial HTML
    pub fn is_client_rendered(&self) -> bool {
        matches!(self, KnownSite::Zara | KnownSite::HM | KnownSite::Shopify)
    }
}
