//! Configuration management for the updater
//!
//! Loads built-in defaults, optional `config/default` and `config/local`
//! files, `PRICEDB__*` environment variables (after `.env`), then applies
//! command line flags on top.

use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::cli::Cli;
use crate::logging::LogFormat;
use crate::oracle::DEFAULT_ENDPOINT;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub fetch: FetchConfig,
    pub pricing: PricingConfig,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Commodity name → ticker mapping file
    pub mapping: String,
    /// Price database the records are appended to
    pub pricedb: String,
    /// Ledger binary used to list commodities
    pub ledger_bin: String,
    /// Ledger journal; when set, commodities come from the ledger binary
    #[serde(default)]
    pub ledger_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Quote URL template with `{ticker}` and optional `{token}`
    pub endpoint: String,
    /// Token substituted for `{token}`
    #[serde(default)]
    pub api_token: Option<String>,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Fetches allowed per window
    pub max_calls_per_window: usize,
    /// Rate limit window in seconds
    pub window_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Convert every price into the base currency
    pub convert: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl AppConfig {
    /// Load configuration from files, environment and command line
    pub fn load(cli: &Cli) -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PRICEDB__*)
            .add_source(Environment::with_prefix("PRICEDB").separator("__"));

        Self::build(Self::apply_cli(builder, cli)?)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            // Paths defaults
            .set_default("paths.mapping", "mapping")?
            .set_default("paths.pricedb", "prices.db")?
            .set_default("paths.ledger_bin", "ledger")?
            // Fetch defaults
            .set_default("fetch.endpoint", DEFAULT_ENDPOINT)?
            .set_default("fetch.timeout_secs", 30)?
            .set_default("fetch.max_calls_per_window", 5)?
            .set_default("fetch.window_secs", 60)?
            .set_default(
                "fetch.user_agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )?
            // Pricing defaults
            .set_default("pricing.convert", true)?
            // Log defaults
            .set_default("log.format", "pretty")?
            .set_default("log.level", "info")?;

        Ok(builder)
    }

    fn apply_cli(
        builder: ConfigBuilder<DefaultState>,
        cli: &Cli,
    ) -> Result<ConfigBuilder<DefaultState>> {
        let path = |p: &Option<std::path::PathBuf>| p.as_ref().map(|p| p.display().to_string());

        let mut builder = builder
            .set_override_option("paths.mapping", path(&cli.mapping))?
            .set_override_option("paths.pricedb", path(&cli.pricedb))?
            .set_override_option("paths.ledger_bin", path(&cli.ledger_bin))?
            .set_override_option("paths.ledger_file", path(&cli.ledger_file))?
            .set_override_option("fetch.api_token", cli.token.clone())?;

        if cli.no_convert {
            builder = builder.set_override("pricing.convert", false)?;
        }

        Ok(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let app_config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings the run cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.fetch.max_calls_per_window == 0 {
            bail!("fetch.max_calls_per_window must be at least 1");
        }
        if self.fetch.window_secs == 0 {
            bail!("fetch.window_secs must be at least 1");
        }
        if !self.fetch.endpoint.contains("{ticker}") {
            bail!(
                "fetch.endpoint must contain a {{ticker}} placeholder: {}",
                self.fetch.endpoint
            );
        }
        Ok(())
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "mapping={} pricedb={} ledger_file={} convert={} rate={}/{}s token={}",
            self.paths.mapping,
            self.paths.pricedb,
            self.paths.ledger_file.as_deref().unwrap_or("-"),
            self.pricing.convert,
            self.fetch.max_calls_per_window,
            self.fetch.window_secs,
            if self.fetch.api_token.is_some() {
                "set"
            } else {
                "unset"
            }
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
