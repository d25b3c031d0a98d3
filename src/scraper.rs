use crate::data::{Price, PriceError};
use async_trait::async_trait;
use log::{debug, error};
use std::time::Duration;
use thiserror::Error;

pub const WHOLE_SELECTOR: &str = ".a-price-whole";
pub const FRACTION_SELECTOR: &str = ".a-price-fraction";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("can't start browser session: {0}")]
    Session(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("element {selector} not found within {timeout:?}: {reason}")]
    ElementTimeout {
        selector: String,
        timeout: Duration,
        reason: String,
    },
    #[error("can't read text of {selector}: {reason}")]
    Text { selector: String, reason: String },
    #[error("can't parse price {raw:?}: {source}")]
    Parse {
        raw: String,
        #[source]
        source: PriceError,
    },
}

/// Raw text of the two elements that together display a price.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceFragments {
    pub whole: String,
    pub fraction: String,
}

/// Something that can render a page and hand back the text of two elements.
#[async_trait]
pub trait PageDriver {
    async fn fetch_fragments(
        &self,
        url: &str,
        whole_selector: &str,
        fraction_selector: &str,
        timeout: Duration,
    ) -> Result<PriceFragments, ScrapeError>;
}

#[async_trait]
pub trait Scraper {
    async fn get_price(&self, url: &str) -> Result<Price, ScrapeError>;
}

/// Composes `whole.fraction` into a price, dropping thousands separators and
/// non-breaking spaces from the whole part first.
pub fn parse_fragments(fragments: &PriceFragments) -> Result<Price, ScrapeError> {
    let whole: String = fragments
        .whole
        .chars()
        .filter(|c| !matches!(c, '.' | ',') && !c.is_whitespace())
        .collect();
    let fraction = fragments.fraction.trim();
    let raw = format!("{whole}.{fraction}");
    debug!("Raw price text (whole+fraction): {raw:?}");

    if whole.is_empty() || fraction.is_empty() {
        return Err(ScrapeError::Parse {
            source: PriceError::Invalid(raw.clone()),
            raw,
        });
    }

    Price::parse(&raw).map_err(|source| ScrapeError::Parse { raw, source })
}

pub struct BrowserScraper<D: PageDriver> {
    driver: D,
    timeout: Duration,
}

impl<D: PageDriver> BrowserScraper<D> {
    pub fn new(driver: D, timeout: Duration) -> Self {
        Self { driver, timeout }
    }
}

#[async_trait]
impl<D: PageDriver + Send + Sync> Scraper for BrowserScraper<D> {
    async fn get_price(&self, url: &str) -> Result<Price, ScrapeError> {
        let fragments = self
            .driver
            .fetch_fragments(url, WHOLE_SELECTOR, FRACTION_SELECTOR, self.timeout)
            .await
            .inspect_err(|e| error!("Error fetching price: {e}"))?;

        parse_fragments(&fragments).inspect_err(|e| error!("Error fetching price: {e}"))
    }
}
