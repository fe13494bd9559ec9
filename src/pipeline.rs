//! The analysis pipeline for one page
//!
//! Order of operations:
//!
//! 1. single-shot guard: a context analyses its page at most once
//! 2. measurements must exist
//! 3. the URL must be eligible
//! 4. on a known storefront, wait (bounded) for its size guide element
//! 5. poll until size UI shows up, or give up
//! 6. selector detection, product type, then matching with chart fallback
//! 7. insert the recommendation card into the document
//!
//! Every early exit is an [`Outcome::Skipped`] with a reason; nothing in
//! here fails.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::chart;
use crate::config::Timing;
use crate::eligibility::{classify_url, Eligibility, SiteRules};
use crate::matching::{self, SizeMatch};
use crate::measurements::Measurements;
use crate::page::PageSnapshot;
use crate::product_type::{classify_product, ProductType};
use crate::render::{insert_recommendation, RecommendationCard};
use crate::selector::{detect_selector, SizeSelector};
use crate::site::KnownSite;
use crate::wait::{poll_until_size_ui, LiveDocument, WaitPolicy};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyStarted,
    NoMeasurements,
    Ineligible(Eligibility),
    NoSizeUi,
    NoMatch,
}

impl SkipReason {
    pub fn describe(&self) -> String {
        match self {
            SkipReason::AlreadyStarted => "analysis already ran for this page".to_string(),
            SkipReason::NoMeasurements => "no measurements saved".to_string(),
            SkipReason::Ineligible(verdict) => format!("not a product page: {}", verdict.describe()),
            SkipReason::NoSizeUi => "no size selection UI found on the page".to_string(),
            SkipReason::NoMatch => "no size could be matched".to_string(),
        }
    }
}

/// What was found on a page and the size picked from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub site: Option<KnownSite>,
    pub product_type: ProductType,
    pub selector: Option<SizeSelector>,
    #[serde(flatten)]
    pub size_match: SizeMatch,
    pub card: RecommendationCard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Recommended(Box<Analysis>),
    Skipped { reason: SkipReason },
}

impl Outcome {
    fn skipped(reason: SkipReason) -> Self {
        tracing::info!(reason = %reason.describe(), "analysis skipped");
        Outcome::Skipped { reason }
    }
}

/// Detection and matching over one snapshot, with no waiting
pub fn analyze_page(page: &PageSnapshot, m: &Measurements) -> Option<Analysis> {
    let selector = detect_selector(page);
    let product_type = classify_product(page);
    tracing::debug!(
        product_type = product_type.as_str(),
        shape = selector.as_ref().map(|s| s.shape()),
        "page classified"
    );

    let size_match = matching::recommend(m, selector.as_ref(), product_type, || {
        chart::extract_chart(page)
    })?;
    let card = RecommendationCard::from_match(&size_match);

    Some(Analysis {
        site: KnownSite::detect(page),
        product_type,
        selector,
        size_match,
        card,
    })
}

/// One page and its "analysis started" flag
pub struct PageContext {
    doc: LiveDocument,
    started: AtomicBool,
}

impl PageContext {
    pub fn new(doc: LiveDocument) -> Self {
        Self {
            doc,
            started: AtomicBool::new(false),
        }
    }

    pub fn document(&self) -> &LiveDocument {
        &self.doc
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Run the pipeline once; later calls are skipped
    pub async fn analyze(
        &self,
        measurements: Option<&Measurements>,
        rules: &SiteRules,
        timing: &Timing,
    ) -> Outcome {
        if self.started.swap(true, Ordering::SeqCst) {
            return Outcome::skipped(SkipReason::AlreadyStarted);
        }

        let Some(m) = measurements else {
            return Outcome::skipped(SkipReason::NoMeasurements);
        };

        let verdict = classify_url(self.doc.url(), rules);
        if !verdict.is_eligible() {
            return Outcome::skipped(SkipReason::Ineligible(verdict));
        }
        tracing::debug!(verdict = %verdict.describe(), "page eligible");

        let site = KnownSite::detect(&self.doc.snapshot());
        if let Some(site) = site {
            let guide = site.size_guide_selector();
            let found = self
                .doc
                .wait_for_element(guide, timing.element_timeout())
                .await;
            tracing::debug!(site = site.id(), found = found.is_some(), "size guide wait finished");
        }

        let policy = WaitPolicy::for_site(timing, site.is_some_and(|s| s.is_client_rendered()));
        if !poll_until_size_ui(&self.doc, policy).await {
            return Outcome::skipped(SkipReason::NoSizeUi);
        }

        let Some(analysis) = analyze_page(&self.doc.snapshot(), m) else {
            return Outcome::skipped(SkipReason::NoMatch);
        };

        let insertion = site.and_then(|s| s.insertion_selector());
        self.doc
            .modify(|document| insert_recommendation(document, &analysis.card, insertion));

        tracing::info!(
            size = %analysis.card.size,
            confidence = analysis.card.confidence,
            source = ?analysis.size_match.source,
            "recommendation ready"
        );
        Outcome::Recommended(Box::new(analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurements::Gender;
    use crate::render::RECOMMENDATION_ID;

    fn measurements() -> Measurements {
        Measurements {
            gender: Gender::Female,
            bust_cm: 94.0,
            waist_cm: 76.0,
            hips_cm: 101.0,
            height_cm: 168.0,
            inseam_cm: None,
            inseam_is_estimated: false,
            saved_at: None,
        }
    }

    const DRESS_PAGE: &str = r#"
        <html><head><title>Wrap Dress</title></head>
        <body>
            <h1>Wrap Dress</h1>
            <select name="size"><option value="">Select size</option><option value="10">UK 10</option><option value="12">UK 12</option></select>
        </body></html>
    "#;

    fn context(url: &str, html: &str) -> PageContext {
        PageContext::new(LiveDocument::new(url, html))
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_run_is_skipped() {
        let ctx = context("https://brand.example/products/wrap-dress", DRESS_PAGE);
        let rules = SiteRules::embedded_defaults();
        let m = measurements();

        let first = ctx.analyze(Some(&m), &rules, &Timing::default()).await;
        assert!(matches!(first, Outcome::Recommended(_)));

        let second = ctx.analyze(Some(&m), &rules, &Timing::default()).await;
        assert_eq!(second, Outcome::Skipped { reason: SkipReason::AlreadyStarted });
        assert_eq!(ctx.document().html().matches(RECOMMENDATION_ID).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_measurements_skip() {
        let ctx = context("https://brand.example/products/wrap-dress", DRESS_PAGE);
        let outcome = ctx
            .analyze(None, &SiteRules::embedded_defaults(), &Timing::immediate())
            .await;
        assert_eq!(outcome, Outcome::Skipped { reason: SkipReason::NoMeasurements });
        assert!(ctx.has_started());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ineligible_url_skips() {
        let ctx = context("https://blog.example/posts/what-to-wear", DRESS_PAGE);
        let outcome = ctx
            .analyze(Some(&measurements()), &SiteRules::embedded_defaults(), &Timing::immediate())
            .await;
        assert!(matches!(
            outcome,
            Outcome::Skipped { reason: SkipReason::Ineligible(Eligibility::NotShopping) }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_size_ui_skips() {
        let ctx = context(
            "https://brand.example/products/gift-card",
            "<html><body><h1>Gift card</h1></body></html>",
        );
        let outcome = ctx
            .analyze(Some(&measurements()), &SiteRules::embedded_defaults(), &Timing::default())
            .await;
        assert_eq!(outcome, Outcome::Skipped { reason: SkipReason::NoSizeUi });
    }

    #[test]
    fn test_analyze_page_uses_generic_chart_for_dress() {
        let page = PageSnapshot::parse("https://brand.example/products/wrap-dress", DRESS_PAGE);
        let analysis = analyze_page(&page, &measurements()).unwrap();

        assert_eq!(analysis.product_type, ProductType::Tops);
        assert_eq!(analysis.card.size, "UK 12");
        assert_eq!(analysis.size_match.source, matching::MatchSource::GenericChart);
        assert!(matches!(analysis.selector, Some(SizeSelector::Standard { .. })));
    }
}
