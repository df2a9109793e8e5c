//! Core types used throughout the updater
//!
//! Defines observations, pricing targets and resolution outcomes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

/// Marker written in place of the base currency code
pub const BASE_MARKER: &str = "$";

/// A commodity to price and the remote ticker used to fetch it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PricingTarget {
    /// Display name as it appears in the ledger
    pub commodity: String,
    /// Symbol understood by the quote endpoint
    pub ticker: String,
}

impl PricingTarget {
    pub fn new(commodity: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            commodity: commodity.into(),
            ticker: ticker.into(),
        }
    }
}

/// One fetched quote for the current run
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub commodity: String,
    pub price: Decimal,
    /// Currency code exactly as returned by the quote endpoint
    pub currency: String,
    pub market_time: Option<DateTime<Utc>>,
}

impl Observation {
    pub fn new(commodity: impl Into<String>, price: Decimal, currency: impl Into<String>) -> Self {
        Self {
            commodity: commodity.into(),
            price,
            currency: currency.into(),
            market_time: None,
        }
    }
}

/// Observations collected during the fetch phase, keyed by commodity
#[derive(Debug, Clone, Default)]
pub struct Observations {
    by_commodity: HashMap<String, Observation>,
}

impl Observations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an observation, replacing any earlier one for the same commodity
    pub fn insert(&mut self, observation: Observation) -> Option<Observation> {
        self.by_commodity
            .insert(observation.commodity.clone(), observation)
    }

    pub fn get(&self, commodity: &str) -> Option<&Observation> {
        self.by_commodity.get(commodity)
    }

    pub fn len(&self) -> usize {
        self.by_commodity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_commodity.is_empty()
    }

    /// Observed commodity names in sorted order
    pub fn commodities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_commodity.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<Observation> for Observations {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        let mut observations = Self::new();
        for observation in iter {
            observations.insert(observation);
        }
        observations
    }
}

/// Unit a resolved price is expressed in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    /// The run's base currency, written as [`BASE_MARKER`]
    Base,
    /// Any other currency code
    Currency(String),
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Base => write!(f, "{}", BASE_MARKER),
            Unit::Currency(code) => write!(f, "{}", code),
        }
    }
}

/// Why a commodity has no price in the base currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The commodity itself was never observed this run
    NoObservation { commodity: String },
    /// The chain stops at a currency that is neither observed nor the base
    MissingLink { currency: String },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NoObservation { commodity } => {
                write!(f, "no observation for {}", commodity)
            }
            UnresolvedReason::MissingLink { currency } => {
                write!(f, "no observation converts {} to the base currency", currency)
            }
        }
    }
}

/// Outcome of pricing one commodity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { price: Decimal, unit: Unit },
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn resolved(price: Decimal, unit: Unit) -> Self {
        Resolution::Resolved { price, unit }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}
