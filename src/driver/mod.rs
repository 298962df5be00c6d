//! Browser driving for the collector.
//!
//! The site renders its observation tables client-side, so the collector
//! talks to a real browser through WebDriver and polls the rendered markup
//! until the content it needs has appeared.

mod client;
mod webdriver;

pub use client::PageDriver;
pub use webdriver::WebDriverClient;

use anyhow::{Result, bail};
use std::time::Duration;
use tracing::debug;

const POLL_START: Duration = Duration::from_millis(100);
const POLL_CAP: Duration = Duration::from_secs(2);

/// Navigates to `url` and polls the rendered markup until `ready` accepts
/// it. The poll interval starts at 100ms and doubles up to a 2s cap; once
/// `timeout` has elapsed the load fails instead of polling forever.
pub async fn load_page<D: PageDriver>(
    driver: &D,
    url: &str,
    ready: impl Fn(&str) -> bool,
    timeout: Duration,
) -> Result<String> {
    driver.goto(url).await?;

    let deadline = tokio::time::Instant::now() + timeout;
    let mut interval = POLL_START;
    loop {
        let source = driver.page_source().await?;
        if ready(&source) {
            return Ok(source);
        }
        if tokio::time::Instant::now() + interval > deadline {
            bail!("page at {url} did not finish loading within {timeout:?}");
        }
        debug!(url, interval_ms = interval.as_millis() as u64, "Page not ready, polling again");
        tokio::time::sleep(interval).await;
        interval = (interval * 2).min(POLL_CAP);
    }
}
