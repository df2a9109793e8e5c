//! Oracle module - Remote quote fetching
//!
//! Fetches one quote per commodity from a remote endpoint, paced by a
//! fixed-window rate limiter.

mod rate_limit;
mod yahoo;

pub use rate_limit::RateLimiter;
pub use yahoo::{parse_spark_response, YahooSparkClient, DEFAULT_ENDPOINT};

use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{Observation, PricingTarget};

/// Trait for quote source clients
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Fetch the latest quote for one commodity
    async fn fetch(&self, target: &PricingTarget) -> Result<Observation, FetchError>;
}
