//! pricedb-updater - append today's quotes to a ledger price database
//!
//! Usage: pricedb-updater [-m mapping] [-p prices.db] [-f journal.ledger]

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pricedb_updater::cli::Cli;
use pricedb_updater::commodities::{
    reconcile, CommoditySource, LedgerCommodities, MappingCommodities,
};
use pricedb_updater::config::AppConfig;
use pricedb_updater::logging::init_logging;
use pricedb_updater::mapping::Mapping;
use pricedb_updater::oracle::{RateLimiter, YahooSparkClient};
use pricedb_updater::persistence::PriceDbWriter;
use pricedb_updater::updater::PriceUpdater;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli)?;
    init_logging(&config.log)?;

    info!(config = %config, "Starting price update");

    let mapping = Mapping::load(&config.paths.mapping).context("Open mapping file failed")?;
    let base = mapping
        .require_base_currency()
        .with_context(|| format!("Invalid mapping file {}", config.paths.mapping))?
        .to_string();
    info!(currency = %base, "Base currency");

    let mut pricedb = PriceDbWriter::open(&config.paths.pricedb)?;

    let commodities = match &config.paths.ledger_file {
        Some(ledger_file) => LedgerCommodities::new(&config.paths.ledger_bin, ledger_file)
            .list_commodities()
            .context("Listing ledger commodities failed")?,
        None => MappingCommodities::new(&mapping).list_commodities()?,
    };
    let targets = reconcile(&commodities, &mapping, &base);
    info!(
        listed = commodities.len(),
        targets = targets.len(),
        "Commodities to price"
    );

    let client =
        YahooSparkClient::from_config(&config.fetch).context("Failed to create HTTP client")?;
    let mut updater = PriceUpdater::new(&client, RateLimiter::from_config(&config.fetch), base)
        .with_conversion(config.pricing.convert);

    let summary = updater.run(&targets, &mut pricedb).await;
    pricedb
        .finish()
        .with_context(|| format!("Failed to flush price database {}", config.paths.pricedb))?;

    info!(
        fetched = summary.fetched,
        written = summary.written,
        skipped = summary.skipped(),
        "Stock price update complete"
    );

    Ok(())
}
