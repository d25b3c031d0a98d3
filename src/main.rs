use crate::app::App;
use crate::browser::WebDriverPage;
use crate::config::Config;
use crate::notifier::TelegramNotifier;
use crate::persistence::PriceLedger;
use crate::scraper::BrowserScraper;
use log::{error, info};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

mod app;
mod browser;
mod config;
mod data;
mod notifier;
mod persistence;
mod scraper;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let base_dir = config::base_dir();
    let (config, config_errors) = Config::load(&base_dir);

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Starting price check...");
    for e in config_errors {
        error!("Error loading config, using defaults: {e}");
    }

    let ledger_path = config
        .ledger_path
        .clone()
        .unwrap_or_else(|| PriceLedger::default_path(&base_dir));

    let scraper = BrowserScraper::new(
        WebDriverPage::new(config.webdriver_url.clone()),
        Duration::from_secs(config.page_timeout_secs),
    );
    let notifier = TelegramNotifier::new(
        config.telegram_api_url.clone(),
        config.telegram_token.clone(),
        config.chat_id.clone(),
        Duration::from_secs(config.notify_timeout_secs),
    );

    let app = App::new(config, scraper, notifier, PriceLedger::new(ledger_path));
    let outcome = app.run().await?;
    info!("Run finished: {outcome}");

    Ok(())
}
