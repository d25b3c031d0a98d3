use crate::config::Config;
use crate::data::Price;
use crate::notifier::Notifier;
use crate::persistence::{LedgerError, PriceRepository};
use crate::scraper::Scraper;
use log::{debug, error, info};
use std::fmt::{Display, Formatter};

pub const PRICE_DROPPED: &str = "🔥 Price dropped!";
pub const PRICE_ROSE: &str = "🤦‍♂️ Price went up!";

/// How a single run ended.
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome {
    MissingUrl,
    ScrapeFailed,
    FirstObservation(Price),
    Unchanged(Price),
    Dropped { previous: Price, current: Price },
    Rose { previous: Price, current: Price },
}

impl Display for RunOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::MissingUrl => write!(f, "no product URL configured"),
            RunOutcome::ScrapeFailed => write!(f, "price unavailable, ledger untouched"),
            RunOutcome::FirstObservation(price) => write!(f, "first recorded price {price}"),
            RunOutcome::Unchanged(price) => write!(f, "price unchanged at {price}"),
            RunOutcome::Dropped { previous, current } => {
                write!(f, "price dropped from {previous} to {current}")
            }
            RunOutcome::Rose { previous, current } => {
                write!(f, "price rose from {previous} to {current}")
            }
        }
    }
}

pub struct App<S: Scraper, N: Notifier, P: PriceRepository> {
    config: Config,
    scraper: S,
    notifier: N,
    repository: P,
}

impl<S: Scraper, N: Notifier, P: PriceRepository> App<S, N, P> {
    pub fn new(config: Config, scraper: S, notifier: N, repository: P) -> Self {
        Self {
            config,
            scraper,
            notifier,
            repository,
        }
    }

    /// Scrapes once, notifies on a change against the last recorded price and
    /// appends the current price. Only a ledger write failure is returned as an error.
    pub async fn run(&self) -> Result<RunOutcome, LedgerError> {
        let Some(url) = self.config.product_url.as_deref() else {
            error!("Product URL not configured");
            return Ok(RunOutcome::MissingUrl);
        };

        let current = match self.scraper.get_price(url).await {
            Ok(price) => price,
            Err(e) => {
                error!("Couldn't get the price: {e}");
                return Ok(RunOutcome::ScrapeFailed);
            }
        };

        let previous = self.repository.last_price().unwrap_or_else(|e| {
            error!("Error reading last price: {e}");
            None
        });
        info!(
            "Last price: {} Current price: {current}",
            previous.as_ref().map_or("none".to_string(), Price::to_string)
        );

        let outcome = match previous {
            None => RunOutcome::FirstObservation(current.clone()),
            Some(previous) if current < previous => RunOutcome::Dropped {
                previous,
                current: current.clone(),
            },
            Some(previous) if current > previous => RunOutcome::Rose {
                previous,
                current: current.clone(),
            },
            Some(_) => RunOutcome::Unchanged(current.clone()),
        };

        if let Some(message) = self.message_for(&outcome, url) {
            if let Err(e) = self.notifier.notify(&message).await {
                debug!("Notification not delivered: {e}");
            }
        }

        self.repository.save_price(&current)?;

        Ok(outcome)
    }

    fn message_for(&self, outcome: &RunOutcome, url: &str) -> Option<String> {
        let symbol = &self.config.currency_symbol;
        match outcome {
            RunOutcome::Dropped { current, .. } => Some(format!(
                "{PRICE_DROPPED} Now {symbol} {} {url}",
                current.to_comma_string()
            )),
            RunOutcome::Rose { current, .. } => Some(format!(
                "{PRICE_ROSE} Now {symbol} {} {url}",
                current.to_comma_string()
            )),
            _ => None,
        }
    }
}
