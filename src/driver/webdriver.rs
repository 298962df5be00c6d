use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;

use super::client::PageDriver;

/// Browser session backed by a WebDriver endpoint (chromedriver or
/// geckodriver).
pub struct WebDriverClient(Client);

impl WebDriverClient {
    /// Connects to the WebDriver endpoint and starts a Chrome session.
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let mut caps = serde_json::Map::new();
        let args = if headless {
            json!(["--headless=new"])
        } else {
            json!([])
        };
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .with_context(|| format!("connecting to WebDriver at {webdriver_url}"))?;
        Ok(Self(client))
    }

    /// Ends the browser session.
    pub async fn close(self) -> Result<()> {
        self.0.close().await.context("closing WebDriver session")
    }
}

#[async_trait]
impl PageDriver for WebDriverClient {
    async fn goto(&self, url: &str) -> Result<()> {
        self.0
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))
    }

    async fn page_source(&self) -> Result<String> {
        self.0.source().await.context("reading page source")
    }
}
