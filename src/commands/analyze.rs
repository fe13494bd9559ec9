//! Page commands: analyze, eligible

use colored::Colorize;
use std::path::Path;

use fitcheck::config::{Config, Timing};
use fitcheck::eligibility::{classify_url, SiteRules};
use fitcheck::error::{FitError, Result};
use fitcheck::fetch;
use fitcheck::measurements::MeasurementStore;
use fitcheck::pipeline::{Analysis, Outcome, PageContext, SkipReason};
use fitcheck::render::render_terminal;
use fitcheck::selector::SizeSelector;
use fitcheck::site::KnownSite;
use fitcheck::wait::LiveDocument;

/// Analyze a product page and recommend a size
pub fn cmd_analyze(
    url: &str,
    file: Option<&Path>,
    json: bool,
    output: Option<&Path>,
    no_wait: bool,
) -> Result<()> {
    let config = Config::load()?;
    let measurements = MeasurementStore::open_default()?.load()?;
    let rules = SiteRules::load_default();
    let timing = if no_wait { Timing::immediate() } else { config.timing.clone() };

    let page = match file {
        Some(path) => fetch::read_page_file(path, url)?,
        None => {
            if !json {
                println!("\n{} {}", "Fetching".cyan().bold(), url);
            }
            fetch::fetch_page(url)?
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let ctx = PageContext::new(LiveDocument::new(&page.url, &page.html));
    let outcome = runtime.block_on(ctx.analyze(measurements.as_ref(), &rules, &timing));

    if let Outcome::Skipped { reason: SkipReason::NoMeasurements } = outcome {
        return Err(FitError::NoMeasurements);
    }

    if let Some(path) = output {
        std::fs::write(path, ctx.document().html().as_bytes())?;
        if !json {
            println!("{} Annotated page written to {}", "✓".green(), path.display());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome {
        Outcome::Recommended(analysis) => print_analysis(analysis),
        Outcome::Skipped { reason } => {
            println!("\n{} {}", "✗".red(), reason.describe());
        }
    }
    Ok(())
}

fn print_analysis(analysis: &Analysis) {
    println!();
    if let Some(site) = analysis.site {
        println!("  {} {}", "Site:".dimmed(), site.display_name());
    }
    println!("  {} {}", "Product:".dimmed(), analysis.product_type.as_str());
    match &analysis.selector {
        Some(selector) => println!(
            "  {} {} ({})",
            "Sizes on page:".dimmed(),
            summarize_selector(selector),
            selector.shape()
        ),
        None => println!("  {} {}", "Sizes on page:".dimmed(), "none found".dimmed()),
    }
    println!("{}", "─".repeat(60).dimmed());
    println!("{}", render_terminal(&analysis.card));
    println!();
}

fn summarize_selector(selector: &SizeSelector) -> String {
    const SHOWN: usize = 8;
    let options = selector.options();
    let mut names: Vec<&str> = options.iter().take(SHOWN).map(|o| o.text.as_str()).collect();
    if options.len() > SHOWN {
        names.push("…");
    }
    names.join(", ")
}

/// Show whether a URL would be analysed, and why
pub fn cmd_eligible(url: &str, json: bool) -> Result<()> {
    let rules = SiteRules::load_default();
    let verdict = classify_url(url, &rules);
    let site = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().and_then(KnownSite::from_host));

    if json {
        let out = serde_json::json!({
            "url": url,
            "eligible": verdict.is_eligible(),
            "verdict": verdict,
            "known_site": site,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if verdict.is_eligible() {
        println!("{} eligible: {}", "✓".green(), verdict.describe());
    } else {
        println!("{} not eligible: {}", "✗".red(), verdict.describe());
    }
    if let Some(site) = site {
        let rendering = if site.is_client_rendered() {
            "client-rendered, longer waits"
        } else {
            "server-rendered"
        };
        println!("  {} {} ({})", "Known site:".dimmed(), site.display_name(), rendering);
    }
    Ok(())
}
