//! Yahoo Finance spark REST client
//!
//! One GET per ticker against the spark endpoint; only the first
//! result/response entry of the envelope is used.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, Url};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::form_urlencoded::byte_serialize;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::oracle::QuoteSource;
use crate::types::{Observation, PricingTarget};

pub const DEFAULT_ENDPOINT: &str =
    "https://query1.finance.yahoo.com/v7/finance/spark?symbols={ticker}&range=1m";

#[derive(Debug, Deserialize)]
struct SparkEnvelope {
    spark: Option<SparkBody>,
}

#[derive(Debug, Deserialize)]
struct SparkBody {
    result: Option<Vec<SparkResult>>,
}

#[derive(Debug, Deserialize)]
struct SparkResult {
    response: Option<Vec<SparkResponse>>,
}

#[derive(Debug, Deserialize)]
struct SparkResponse {
    meta: Option<SparkMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SparkMeta {
    regular_market_price: Option<f64>,
    currency: Option<String>,
    regular_market_time: Option<u64>,
}

/// Decode a spark response body into an observation for `target`
pub fn parse_spark_response(target: &PricingTarget, body: &str) -> Result<Observation, FetchError> {
    let envelope: SparkEnvelope = serde_json::from_str(body)?;

    let missing = || FetchError::MissingQuote {
        ticker: target.ticker.clone(),
    };

    let meta = envelope
        .spark
        .and_then(|s| s.result)
        .and_then(|results| results.into_iter().next())
        .and_then(|r| r.response)
        .and_then(|responses| responses.into_iter().next())
        .and_then(|r| r.meta)
        .ok_or_else(missing)?;

    let raw_price = meta.regular_market_price.ok_or_else(missing)?;
    let currency = meta
        .currency
        .filter(|c| !c.is_empty())
        .ok_or_else(missing)?;

    let invalid_price = || FetchError::InvalidPrice {
        ticker: target.ticker.clone(),
        price: raw_price,
    };
    if !raw_price.is_finite() || raw_price <= 0.0 {
        return Err(invalid_price());
    }
    let price = Decimal::from_f64(raw_price)
        .filter(|p| !p.is_zero())
        .ok_or_else(invalid_price)?;

    let market_time = meta
        .regular_market_time
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

    Ok(Observation {
        commodity: target.commodity.clone(),
        price,
        currency,
        market_time,
    })
}

/// Percent-encode a value substituted into the endpoint template
fn encode_component(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Spark endpoint client
pub struct YahooSparkClient {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl YahooSparkClient {
    /// Create a client for a URL template containing `{ticker}` and optionally `{token}`
    pub fn new(
        endpoint: &str,
        api_token: Option<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_token,
        })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.endpoint,
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )
    }

    /// Expand the endpoint template for one ticker
    pub fn quote_url(&self, ticker: &str) -> Result<Url, FetchError> {
        let token = self.api_token.as_deref().unwrap_or_default();
        let raw = self
            .endpoint
            .replace("{ticker}", &encode_component(ticker))
            .replace("{token}", &encode_component(token));

        Url::parse(&raw).map_err(|e| FetchError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl QuoteSource for YahooSparkClient {
    fn name(&self) -> &'static str {
        "Yahoo"
    }

    async fn fetch(&self, target: &PricingTarget) -> Result<Observation, FetchError> {
        let url = self.quote_url(&target.ticker)?;
        debug!(source = %"Yahoo", ticker = %target.ticker, "Fetching quote");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(FetchError::Body)?;
        parse_spark_response(target, &body)
    }
}
