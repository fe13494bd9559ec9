//! Page eligibility - is this URL a shopping/product page worth analysing?
//!
//! Rules come from `assets/sites.toml` (or a user copy in the config
//! directory). Precedence is fixed: blocked domains, then known shopping
//! domains, then URL patterns. A known shop whose host also contains a
//! blocked substring is therefore excluded.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

use crate::config::Config;
use crate::error::{FitError, Result};

/// Raw rule lists as they appear in the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
struct RawSiteRules {
    #[serde(default)]
    blocked_domains: Vec<String>,
    #[serde(default)]
    shopping_domains: Vec<String>,
    #[serde(default)]
    url_patterns: Vec<String>,
}

/// Static eligibility configuration
#[derive(Debug, Clone, Default)]
pub struct SiteRules {
    pub blocked_domains: Vec<String>,
    pub shopping_domains: Vec<String>,
    url_patterns: Vec<(String, Regex)>,
}

/// Why a URL was or was not judged eligible
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "matched", rename_all = "snake_case")]
pub enum Eligibility {
    /// Not an http(s) URL, or not a URL at all
    Invalid,
    Blocked(String),
    KnownShop(String),
    UrlPattern(String),
    NotShopping,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::KnownShop(_) | Eligibility::UrlPattern(_))
    }

    pub fn describe(&self) -> String {
        match self {
            Eligibility::Invalid => "not an http(s) URL".to_string(),
            Eligibility::Blocked(domain) => format!("blocked domain ({})", domain),
            Eligibility::KnownShop(domain) => format!("known shopping site ({})", domain),
            Eligibility::UrlPattern(pattern) => format!("product URL pattern ({})", pattern),
            Eligibility::NotShopping => "no shopping signals in URL".to_string(),
        }
    }
}

impl SiteRules {
    /// Parse rules from TOML, compiling URL patterns case-insensitively
    pub fn parse_toml(content: &str) -> Result<Self> {
        let raw: RawSiteRules = toml::from_str(content)?;

        let mut url_patterns = Vec::with_capacity(raw.url_patterns.len());
        for pattern in raw.url_patterns {
            let re = Regex::new(&format!("(?i){}", pattern)).map_err(|e| {
                FitError::ConfigError(format!("Invalid URL pattern '{}': {}", pattern, e))
            })?;
            url_patterns.push((pattern, re));
        }

        Ok(Self {
            blocked_domains: lower_all(raw.blocked_domains),
            shopping_domains: lower_all(raw.shopping_domains),
            url_patterns,
        })
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Load rules from the user config directory or embedded defaults
    pub fn load_default() -> Self {
        if let Ok(dir) = Config::config_dir() {
            let user_rules = dir.join("sites.toml");
            if user_rules.exists() {
                match Self::load_from_file(&user_rules) {
                    Ok(rules) => return rules,
                    Err(e) => tracing::warn!(
                        path = %user_rules.display(),
                        error = %e,
                        "ignoring unreadable site rules, using defaults"
                    ),
                }
            }
        }

        Self::embedded_defaults()
    }

    /// Get embedded default rules
    pub fn embedded_defaults() -> Self {
        let defaults = include_str!("../assets/sites.toml");
        Self::parse_toml(defaults).unwrap_or_default()
    }

    pub fn url_patterns(&self) -> impl Iterator<Item = &str> {
        self.url_patterns.iter().map(|(p, _)| p.as_str())
    }
}

fn lower_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.to_lowercase()).collect()
}

/// Classify a URL, explaining the verdict
pub fn classify_url(url: &str, rules: &SiteRules) -> Eligibility {
    let parsed = match Url::parse(url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => u,
        _ => return Eligibility::Invalid,
    };
    let Some(host) = parsed.host_str().map(str::to_lowercase) else {
        return Eligibility::Invalid;
    };

    if let Some(blocked) = rules.blocked_domains.iter().find(|d| host.contains(d.as_str())) {
        return Eligibility::Blocked(blocked.clone());
    }

    if let Some(shop) = rules.shopping_domains.iter().find(|d| host.contains(d.as_str())) {
        return Eligibility::KnownShop(shop.clone());
    }

    let full = parsed.as_str();
    if let Some((pattern, _)) = rules.url_patterns.iter().find(|(_, re)| re.is_match(full)) {
        return Eligibility::UrlPattern(pattern.clone());
    }

    Eligibility::NotShopping
}

/// Whether a URL is a shopping/product page; fails closed
pub fn is_eligible_page(url: &str, rules: &SiteRules) -> bool {
    classify_url(url, rules).is_eligible()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SiteRules {
        SiteRules::embedded_defaults()
    }

    #[test]
    fn test_embedded_rules_parse() {
        let rules = rules();
        assert!(!rules.blocked_domains.is_empty());
        assert!(!rules.shopping_domains.is_empty());
        assert!(rules.url_patterns().count() > 5);
    }

    #[test]
    fn test_known_shop_is_eligible() {
        let verdict = classify_url("https://www.amazon.com/Levis-Jeans/dp/B0018OR118", &rules());
        assert_eq!(verdict, Eligibility::KnownShop("amazon.".to_string()));
        assert!(verdict.is_eligible());
    }

    #[test]
    fn test_blocked_beats_url_pattern() {
        let url = "https://mail.google.com/mail/u/0/products/123?sku=9";
        assert!(matches!(classify_url(url, &rules()), Eligibility::Blocked(_)));
        assert!(!is_eligible_page(url, &rules()));
    }

    #[test]
    fn test_blocked_beats_shopping_domain() {
        let rules = SiteRules::parse_toml(
            r#"
blocked_domains = ["amazon."]
shopping_domains = ["amazon.com"]
"#,
        )
        .unwrap();
        assert!(!is_eligible_page("https://www.amazon.com/dp/B01", &rules));
    }

    #[test]
    fn test_url_patterns() {
        let rules = rules();
        assert!(is_eligible_page("https://brand.example/products/slim-jeans", &rules));
        assert!(is_eligible_page("https://brand.example/catalog?SKU=12345", &rules));
        assert!(is_eligible_page("https://brand.example/en-gb/dress-p12345.html", &rules));
        assert!(!is_eligible_page("https://blog.example/posts/hello", &rules));
    }

    #[test]
    fn test_fails_closed() {
        let rules = rules();
        assert_eq!(classify_url("not a url", &rules), Eligibility::Invalid);
        assert_eq!(classify_url("ftp://asos.com/products/1", &rules), Eligibility::Invalid);
        assert_eq!(classify_url("file:///tmp/products/1", &rules), Eligibility::Invalid);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = SiteRules::parse_toml(r#"url_patterns = ["("]"#).unwrap_err();
        assert!(matches!(err, FitError::ConfigError(_)));
    }
}
