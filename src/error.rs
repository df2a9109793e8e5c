//! Typed errors for each stage of a price update run

use thiserror::Error;

/// Failure to read or interpret the commodity mapping file. Always fatal.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read mapping file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mapping has no `$` entry naming the base currency")]
    MissingBaseCurrency,
}

/// Failure of the external ledger binary used to list commodities. Always fatal.
#[derive(Debug, Error)]
pub enum ExternalToolError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: String,
        stderr: String,
    },

    #[error("{binary} produced non UTF-8 output")]
    InvalidOutput { binary: String },
}

/// Failure to fetch a single quote. Recoverable: the commodity is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid quote URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to decode quote response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no quote data for ticker {ticker}")]
    MissingQuote { ticker: String },

    #[error("invalid price {price} for ticker {ticker}")]
    InvalidPrice { ticker: String, price: f64 },
}

/// Hard failure while chasing a commodity to the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("conversion cycle while pricing {commodity}: {}", chain.join(" -> "))]
    ConversionCycle {
        commodity: String,
        chain: Vec<String>,
    },

    #[error("price of {commodity} overflows along its conversion chain")]
    Overflow { commodity: String },
}
