//! Live documents and waiting for them to settle
//!
//! A [`LiveDocument`] is a page whose HTML can change after load, the way a
//! client-rendered storefront fills in its size picker. Each change is a new
//! snapshot published on a `tokio::sync::watch` channel. Waiting for an
//! element subscribes to that channel; the subscription is dropped as soon
//! as the wait resolves, and a dropped document wakes every waiter with
//! "not found".

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tokio::sync::watch;

use crate::config::Timing;
use crate::page::{parse_selector, PageSnapshot};
use crate::size_ui;

/// A page whose HTML may change over time
pub struct LiveDocument {
    url: String,
    tx: watch::Sender<Arc<str>>,
}

impl LiveDocument {
    pub fn new(url: &str, html: &str) -> Self {
        let (tx, _) = watch::channel(Arc::from(html));
        Self {
            url: url.to_string(),
            tx,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Replace the page's HTML, waking anyone observing it
    pub fn publish(&self, html: &str) {
        self.tx.send_replace(Arc::from(html));
    }

    pub fn html(&self) -> Arc<str> {
        self.tx.borrow().clone()
    }

    /// Parse the current HTML
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot::parse(&self.url, &self.html())
    }

    pub fn observe(&self) -> DomObserver {
        DomObserver {
            rx: self.tx.subscribe(),
        }
    }

    /// Apply an edit to the parsed document and publish the result
    pub fn modify(&self, edit: impl FnOnce(&mut Html)) {
        let mut document = Html::parse_document(&self.html());
        edit(&mut document);
        self.publish(&document.html());
    }

    /// Wait for `css` to match, up to `timeout`
    pub async fn wait_for_element(&self, css: &str, timeout: Duration) -> Option<String> {
        self.observe().wait_for_element(css, timeout).await
    }
}

/// A subscription to a live document's changes
pub struct DomObserver {
    rx: watch::Receiver<Arc<str>>,
}

impl DomObserver {
    /// Resolve with the first matching element's HTML, or `None` on timeout
    /// or when the document goes away. Never errors.
    ///
    /// Consumes the observer, so the subscription ends when this returns.
    pub async fn wait_for_element(mut self, css: &str, timeout: Duration) -> Option<String> {
        let selector = parse_selector(css)?;

        let watch_changes = async {
            loop {
                let html = self.rx.borrow_and_update().clone();
                if let Some(found) = first_match(&html, &selector) {
                    return Some(found);
                }
                if self.rx.changed().await.is_err() {
                    tracing::debug!(selector = css, "document closed while waiting");
                    return None;
                }
            }
        };

        match tokio::time::timeout(timeout, watch_changes).await {
            Ok(found) => found,
            Err(_) => {
                tracing::debug!(selector = css, ?timeout, "element did not appear");
                None
            }
        }
    }
}

fn first_match(html: &str, selector: &scraper::Selector) -> Option<String> {
    let document = Html::parse_document(html);
    let found = document.select(selector).next().map(|el| el.html());
    found
}

/// How long to wait for size UI to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub initial_delay: Duration,
    /// Checks after the first
    pub retries: u32,
    pub retry_interval: Duration,
}

impl WaitPolicy {
    /// Client-rendered storefronts get a longer initial delay and more retries
    pub fn for_site(timing: &Timing, client_rendered: bool) -> Self {
        if client_rendered {
            Self {
                initial_delay: Duration::from_millis(timing.client_rendered_delay_ms),
                retries: timing.client_rendered_retries,
                retry_interval: Duration::from_millis(timing.retry_interval_ms),
            }
        } else {
            Self {
                initial_delay: Duration::from_millis(timing.initial_delay_ms),
                retries: timing.retries,
                retry_interval: Duration::from_millis(timing.retry_interval_ms),
            }
        }
    }
}

/// Poll until the page shows size UI or the retries run out
pub async fn poll_until_size_ui(doc: &LiveDocument, policy: WaitPolicy) -> bool {
    tokio::time::sleep(policy.initial_delay).await;

    for attempt in 0..=policy.retries {
        if attempt > 0 {
            tokio::time::sleep(policy.retry_interval).await;
        }
        if let Some(signal) = size_ui::detect_size_ui(&doc.snapshot()) {
            tracing::debug!(attempt, ?signal, "size UI found");
            return true;
        }
    }

    tracing::info!(url = doc.url(), retries = policy.retries, "no size UI after retries");
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &str = "<html><body><div id='app'></div></body></html>";
    const RENDERED: &str =
        "<html><body><div id='app'><div class='size-guide'>Size guide</div></div></body></html>";

    #[tokio::test(start_paused = true)]
    async fn test_wait_resolves_immediately_when_present() {
        let doc = LiveDocument::new("https://shop.example/p/1", RENDERED);
        let found = doc.wait_for_element(".size-guide", Duration::from_secs(10)).await;
        assert!(found.unwrap().contains("Size guide"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_resolves_on_mutation() {
        let doc = Arc::new(LiveDocument::new("https://shop.example/p/1", EMPTY));

        let publisher = Arc::clone(&doc);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            publisher.publish(RENDERED);
        });

        let found = doc.wait_for_element(".size-guide", Duration::from_secs(10)).await;
        assert!(found.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_with_none() {
        let doc = LiveDocument::new("https://shop.example/p/1", EMPTY);
        let start = tokio::time::Instant::now();
        let found = doc.wait_for_element(".size-guide", Duration::from_secs(10)).await;
        assert_eq!(found, None);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_ends_when_document_dropped() {
        let doc = LiveDocument::new("https://shop.example/p/1", EMPTY);
        let observer = doc.observe();
        drop(doc);
        let found = observer.wait_for_element(".size-guide", Duration::from_secs(10)).await;
        assert_eq!(found, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_released_after_resolution() {
        let doc = LiveDocument::new("https://shop.example/p/1", RENDERED);
        doc.wait_for_element(".size-guide", Duration::from_secs(1)).await;
        doc.wait_for_element(".missing", Duration::from_secs(1)).await;
        assert_eq!(doc.tx.receiver_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_selector_is_not_found() {
        let doc = LiveDocument::new("https://shop.example/p/1", RENDERED);
        assert_eq!(doc.wait_for_element("div[[[", Duration::from_secs(1)).await, None);
    }

    #[test]
    fn test_policy_for_site() {
        let timing = Timing::default();
        let generic = WaitPolicy::for_site(&timing, false);
        let rendered = WaitPolicy::for_site(&timing, true);
        assert_eq!(generic.retries, 3);
        assert_eq!(rendered.retries, 6);
        assert!(rendered.initial_delay > generic.initial_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_finds_late_size_ui() {
        let doc = Arc::new(LiveDocument::new("https://shop.example/p/1", EMPTY));
        let policy = WaitPolicy::for_site(&Timing::default(), false);

        let publisher = Arc::clone(&doc);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            publisher.publish(r#"<html><body><select name="size"><option>S</option></select></body></html>"#);
        });

        assert!(poll_until_size_ui(&doc, policy).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_gives_up() {
        let doc = LiveDocument::new("https://shop.example/p/1", EMPTY);
        let policy = WaitPolicy::for_site(&Timing::default(), false);
        let start = tokio::time::Instant::now();

        assert!(!poll_until_size_ui(&doc, policy).await);
        // initial delay plus three retry intervals
        assert!(start.elapsed() >= Duration::from_millis(4000));
    }

    #[test]
    fn test_modify_publishes() {
        let doc = LiveDocument::new("https://shop.example/p/1", EMPTY);
        let observer = doc.observe();
        doc.modify(|_| {});
        assert!(observer.rx.has_changed().unwrap());
    }
}
