//! Price update run
//!
//! Fetches every target through the rate limiter, resolves the collected
//! observations and appends one record per resolved commodity. A failure for
//! one commodity never stops the others.

use chrono::{Local, NaiveDateTime};
use std::io::Write;
use tracing::{debug, error, info, warn};

use crate::oracle::{QuoteSource, RateLimiter};
use crate::persistence::{PriceDbWriter, PriceRecord};
use crate::resolver::PriceResolver;
use crate::types::{Observations, PricingTarget, Resolution};

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub fetched: usize,
    pub fetch_failures: usize,
    pub rate_limit_waits: usize,
    pub written: usize,
    pub unresolved: usize,
    pub resolve_errors: usize,
    pub write_failures: usize,
}

impl RunSummary {
    /// Commodities that did not end up in the price database
    pub fn skipped(&self) -> usize {
        self.fetch_failures + self.unresolved + self.resolve_errors + self.write_failures
    }
}

pub struct PriceUpdater<'a, S: QuoteSource + ?Sized> {
    source: &'a S,
    limiter: RateLimiter,
    base: String,
    convert: bool,
}

impl<'a, S: QuoteSource + ?Sized> PriceUpdater<'a, S> {
    pub fn new(source: &'a S, limiter: RateLimiter, base: impl Into<String>) -> Self {
        Self {
            source,
            limiter,
            base: base.into(),
            convert: true,
        }
    }

    /// Enable or disable conversion into the base currency
    pub fn with_conversion(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }

    /// Fetch, resolve and write every target
    pub async fn run<W: Write>(
        &mut self,
        targets: &[PricingTarget],
        writer: &mut PriceDbWriter<W>,
    ) -> RunSummary {
        let mut summary = RunSummary::default();
        let observations = self.fetch_all(targets, &mut summary).await;
        self.write_all(
            &observations,
            writer,
            Local::now().naive_local(),
            &mut summary,
        );
        summary
    }

    /// Fetch each target once, in order, skipping failures
    pub async fn fetch_all(
        &mut self,
        targets: &[PricingTarget],
        summary: &mut RunSummary,
    ) -> Observations {
        let mut observations = Observations::new();
        summary.targets += targets.len();

        for target in targets {
            if self.limiter.acquire().await.is_some() {
                summary.rate_limit_waits += 1;
            }

            match self.source.fetch(target).await {
                Ok(observation) => {
                    debug!(
                        source = %self.source.name(),
                        commodity = %target.commodity,
                        price = %observation.price,
                        currency = %observation.currency,
                        market_time = ?observation.market_time,
                        "Quote received"
                    );
                    summary.fetched += 1;
                    observations.insert(observation);
                }
                Err(e) => {
                    warn!(
                        source = %self.source.name(),
                        commodity = %target.commodity,
                        ticker = %target.ticker,
                        error = %e,
                        "Skipped commodity"
                    );
                    summary.fetch_failures += 1;
                }
            }
        }

        observations
    }

    /// Resolve every observation and append the resolved ones
    pub fn write_all<W: Write>(
        &self,
        observations: &Observations,
        writer: &mut PriceDbWriter<W>,
        timestamp: NaiveDateTime,
        summary: &mut RunSummary,
    ) {
        let mut resolver = PriceResolver::new(&self.base, observations);
        if !self.convert {
            resolver = resolver.without_conversion();
        }

        for (commodity, resolution) in resolver.resolve_all() {
            match resolution {
                Ok(Resolution::Resolved { price, unit }) => {
                    let record = PriceRecord {
                        timestamp,
                        commodity,
                        price,
                        unit,
                    };
                    match writer.append(&record) {
                        Ok(()) => summary.written += 1,
                        Err(e) => {
                            error!(commodity = %record.commodity, error = %e, "Failed to write price");
                            summary.write_failures += 1;
                        }
                    }
                }
                Ok(Resolution::Unresolved(reason)) => {
                    warn!(commodity = %commodity, reason = %reason, "Unresolved price, skipped");
                    summary.unresolved += 1;
                }
                Err(e) => {
                    error!(commodity = %commodity, error = %e, "Price resolution failed, skipped");
                    summary.resolve_errors += 1;
                }
            }
        }

        info!(
            written = summary.written,
            unresolved = summary.unresolved,
            failed = summary.resolve_errors + summary.write_failures,
            "Price records written"
        );
    }
}
