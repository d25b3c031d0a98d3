use crate::scraper::{PageDriver, PriceFragments, ScrapeError};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use log::{debug, info, warn};
use serde_json::{Map, Value, json};
use std::time::Duration;

pub const WINDOW_SIZE: &str = "--window-size=1920,1080";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Headless Chrome driven through a WebDriver server such as chromedriver.
/// Every call gets its own browser session.
pub struct WebDriverPage {
    webdriver_url: String,
}

impl WebDriverPage {
    pub fn new(webdriver_url: String) -> Self {
        Self { webdriver_url }
    }

    async fn connect(&self) -> Result<Client, ScrapeError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(chrome_capabilities());
        builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))
    }
}

pub fn chrome_capabilities() -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": [
                "--headless",
                "--disable-gpu",
                "--no-sandbox",
                WINDOW_SIZE,
                format!("user-agent={USER_AGENT}"),
            ]
        }),
    );
    caps
}

async fn read_fragments(
    client: &Client,
    url: &str,
    whole_selector: &str,
    fraction_selector: &str,
    timeout: Duration,
) -> Result<PriceFragments, ScrapeError> {
    client
        .goto(url)
        .await
        .map_err(|e| ScrapeError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let whole = read_text(client, whole_selector, timeout).await?;
    let fraction = read_text(client, fraction_selector, timeout).await?;

    Ok(PriceFragments { whole, fraction })
}

async fn read_text(client: &Client, selector: &str, timeout: Duration) -> Result<String, ScrapeError> {
    let element = client
        .wait()
        .at_most(timeout)
        .for_element(Locator::Css(selector))
        .await
        .map_err(|e| ScrapeError::ElementTimeout {
            selector: selector.to_string(),
            timeout,
            reason: e.to_string(),
        })?;

    element.text().await.map_err(|e| ScrapeError::Text {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn fetch_fragments(
        &self,
        url: &str,
        whole_selector: &str,
        fraction_selector: &str,
        timeout: Duration,
    ) -> Result<PriceFragments, ScrapeError> {
        let client = self.connect().await?;
        info!("Browser session started, loading {url}");

        let result = read_fragments(&client, url, whole_selector, fraction_selector, timeout).await;

        // The session owns a browser process; end it whatever happened above.
        match client.close().await {
            Ok(()) => debug!("Browser session closed"),
            Err(e) => warn!("Error closing browser session: {e}"),
        }

        result
    }
}
