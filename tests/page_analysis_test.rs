//! Page-level behaviour: eligibility, waiting on client-rendered pages, the
//! single-shot guard and idempotent card insertion

use std::time::Duration;

use fitcheck::config::Timing;
use fitcheck::eligibility::{classify_url, is_eligible_page, Eligibility, SiteRules};
use fitcheck::matching::MatchSource;
use fitcheck::measurements::{Gender, Measurements};
use fitcheck::page::PageSnapshot;
use fitcheck::pipeline::{Outcome, PageContext, SkipReason};
use fitcheck::render::RECOMMENDATION_ID;
use fitcheck::site::KnownSite;
use fitcheck::size_ui::has_size_ui;
use fitcheck::wait::LiveDocument;

// ============================================================================
// Fixtures
// ============================================================================

const ZARA_URL: &str = "https://www.zara.com/uk/en/oversized-shirt-p01234567.html";

const ZARA_SHELL: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Oversized Shirt - ZARA United Kingdom</title></head>
<body><div id="app"></div></body>
</html>
"#;

const ZARA_RENDERED: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Oversized Shirt - ZARA United Kingdom</title></head>
<body>
    <div id="app">
        <h1>Oversized Shirt</h1>
        <div class="product-detail-info">
            <div class="product-detail-size-selector">
                <ul class="size-selector-list">
                    <li>XS</li><li>S</li><li>M</li><li>L</li><li>XL</li>
                </ul>
            </div>
            <div class="product-detail-size-info">Size guide</div>
        </div>
    </div>
</body>
</html>
"#;

const STATIC_SHIRT: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Poplin Shirt</title></head>
<body>
    <h1>Poplin Shirt</h1>
    <select name="size">
        <option value="">Select size</option>
        <option value="10">UK 10</option>
        <option value="12">UK 12</option>
        <option value="14">UK 14</option>
    </select>
    <button>Add to bag</button>
</body>
</html>
"#;

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

fn card_count(html: &str) -> usize {
    html.matches(&format!("id=\"{}\"", RECOMMENDATION_ID)).count()
}

// ============================================================================
// Eligibility
// ============================================================================

#[test]
fn test_amazon_product_page_is_eligible() {
    let rules = SiteRules::embedded_defaults();
    let url = "https://www.amazon.com/Levis-Womens-Straight-Jeans/dp/B07D4QYRTB";
    assert!(is_eligible_page(url, &rules));
    assert!(matches!(classify_url(url, &rules), Eligibility::KnownShop(_)));
}

#[test]
fn test_blocked_domain_never_eligible() {
    let rules = SiteRules::embedded_defaults();
    assert!(!is_eligible_page("https://mail.google.com/shop/products/123?sku=1", &rules));
    assert!(!is_eligible_page("https://www.youtube.com/watch?v=abc&sku=1", &rules));
}

#[test]
fn test_user_rules_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sites.toml");
    std::fs::write(&path, "shopping_domains = [\"tiny-boutique.example\"]\n").unwrap();

    let rules = SiteRules::load_from_file(&path).unwrap();
    assert!(is_eligible_page("https://tiny-boutique.example/anything", &rules));
    assert!(!is_eligible_page("https://www.asos.com/prd/123", &rules));
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_client_rendered_page_waits_for_size_ui() {
    let ctx = PageContext::new(LiveDocument::new(ZARA_URL, ZARA_SHELL));
    let rules = SiteRules::embedded_defaults();
    let m = measurements();

    let render_later = async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        ctx.document().publish(ZARA_RENDERED);
    };
    let timing = Timing::default();
    let (outcome, _) = tokio::join!(ctx.analyze(Some(&m), &rules, &timing), render_later);

    let Outcome::Recommended(analysis) = outcome else {
        panic!("expected a recommendation, got {:?}", outcome);
    };
    assert_eq!(analysis.site, Some(KnownSite::Zara));
    assert_eq!(analysis.card.size, "UK 12");
    assert_eq!(analysis.size_match.source, MatchSource::GenericChart);

    let html = ctx.document().html();
    assert_eq!(card_count(&html), 1);
    let page = PageSnapshot::parse(ZARA_URL, &html);
    assert!(page
        .select_first(&format!(".product-detail-info > #{}", RECOMMENDATION_ID))
        .is_some());
}

#[tokio::test(start_paused = true)]
async fn test_page_that_never_renders_is_skipped() {
    let ctx = PageContext::new(LiveDocument::new(ZARA_URL, ZARA_SHELL));
    let outcome = ctx
        .analyze(Some(&measurements()), &SiteRules::embedded_defaults(), &Timing::default())
        .await;
    assert_eq!(outcome, Outcome::Skipped { reason: SkipReason::NoSizeUi });
    assert_eq!(card_count(&ctx.document().html()), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_runs_analyse_once() {
    let ctx = PageContext::new(LiveDocument::new("https://brand.example/products/poplin-shirt", STATIC_SHIRT));
    let rules = SiteRules::embedded_defaults();
    let m = measurements();
    let timing = Timing::default();

    let (a, b) = tokio::join!(
        ctx.analyze(Some(&m), &rules, &timing),
        ctx.analyze(Some(&m), &rules, &timing)
    );

    let skipped = [&a, &b]
        .iter()
        .filter(|o| matches!(o, Outcome::Skipped { reason: SkipReason::AlreadyStarted }))
        .count();
    assert_eq!(skipped, 1);
    assert_eq!(card_count(&ctx.document().html()), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rerun_on_annotated_page_keeps_one_card() {
    let url = "https://brand.example/products/poplin-shirt";
    let rules = SiteRules::embedded_defaults();
    let m = measurements();

    let first = PageContext::new(LiveDocument::new(url, STATIC_SHIRT));
    first.analyze(Some(&m), &rules, &Timing::immediate()).await;
    let annotated = first.document().html();
    assert_eq!(card_count(&annotated), 1);

    let second = PageContext::new(LiveDocument::new(url, &annotated));
    let outcome = second.analyze(Some(&m), &rules, &Timing::immediate()).await;
    assert!(matches!(outcome, Outcome::Recommended(_)));
    assert_eq!(card_count(&second.document().html()), 1);
}

#[test]
fn test_static_page_has_size_ui() {
    let page = PageSnapshot::parse("https://brand.example/products/poplin-shirt", STATIC_SHIRT);
    assert!(has_size_ui(&page));
}
