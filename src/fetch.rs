//! Page loading: over HTTP with a shared agent, or from a saved HTML file

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use ureq::ResponseExt;
use url::Url;

use crate::error::{FitError, Result};

/// Default HTTP request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Storefronts serve stripped-down pages to obvious bots
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36 fitcheck/0.1";

/// Shared HTTP agent for connection pooling
static HTTP_AGENT: Lazy<ureq::Agent> = Lazy::new(|| {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
        .build()
        .into()
});

/// Raw HTML of a product page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub html: String,
}

/// Fetch a page over HTTP(S)
pub fn fetch_page(url: &str) -> Result<FetchedPage> {
    let parsed = Url::parse(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FitError::FetchError(format!(
            "unsupported scheme '{}' in {}",
            parsed.scheme(),
            url
        )));
    }

    tracing::info!(url, "fetching page");
    let response = HTTP_AGENT
        .get(parsed.as_str())
        .header("User-Agent", USER_AGENT)
        .header("Accept", "text/html,application/xhtml+xml")
        .header("Accept-Language", "en-GB,en;q=0.9")
        .call()?;

    let final_url = response.get_uri().to_string();
    let html = response.into_body().read_to_string()?;
    tracing::debug!(url = %final_url, bytes = html.len(), "page fetched");

    Ok(FetchedPage {
        url: final_url,
        html,
    })
}

/// Read a saved page from disk, attributing it to `url`
pub fn read_page_file(path: &Path, url: &str) -> Result<FetchedPage> {
    let html = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = html.len(), "page read from file");

    Ok(FetchedPage {
        url: url.to_string(),
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = fetch_page("ftp://shop.example/products/1").unwrap_err();
        assert!(matches!(err, FitError::FetchError(_)));
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_rejects_malformed_url() {
        assert!(matches!(fetch_page("not a url"), Err(FitError::UrlParseError(_))));
    }

    #[test]
    fn test_read_page_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><body><h1>Jeans</h1></body></html>").unwrap();

        let page = read_page_file(file.path(), "https://shop.example/p/1").unwrap();
        assert_eq!(page.url, "https://shop.example/p/1");
        assert!(page.html.contains("Jeans"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_page_file(Path::new("/nonexistent/page.html"), "https://x.example").unwrap_err();
        assert!(matches!(err, FitError::IoError(_)));
    }
}
