//! Price Resolver - Converts observations into base-currency prices
//!
//! Each observation prices a commodity in some currency. When that currency
//! is itself an observed commodity, the price is chased along the chain of
//! observations until it lands on the base currency:
//!
//! - the base currency itself is worth exactly 1
//! - an observation already in the base currency is taken as-is
//! - otherwise the observed price is multiplied by the price of its currency
//!
//! The chase is iterative and keeps a visited set, so a malformed graph
//! (A priced in B, B priced in A) ends in [`ResolveError::ConversionCycle`]
//! after at most one step per distinct currency.
//!
//! Currency codes are compared against the base code here and nowhere else;
//! observations keep the code returned by the quote endpoint.

use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::error::ResolveError;
use crate::types::{Observation, Observations, Resolution, Unit, UnresolvedReason};

/// Resolves commodity prices against one run's observations
pub struct PriceResolver<'a> {
    base: &'a str,
    observations: &'a Observations,
    /// When false, prices are reported in the currency they were observed in
    convert: bool,
}

impl<'a> PriceResolver<'a> {
    pub fn new(base: &'a str, observations: &'a Observations) -> Self {
        Self {
            base,
            observations,
            convert: true,
        }
    }

    /// Report observed prices without chasing conversions
    pub fn without_conversion(mut self) -> Self {
        self.convert = false;
        self
    }

    /// Price of `commodity`, in the base currency when conversion is enabled
    pub fn resolve(&self, commodity: &str) -> Result<Resolution, ResolveError> {
        if commodity == self.base {
            return Ok(Resolution::resolved(Decimal::ONE, Unit::Base));
        }

        let Some(observation) = self.observations.get(commodity) else {
            return Ok(Resolution::Unresolved(UnresolvedReason::NoObservation {
                commodity: commodity.to_string(),
            }));
        };

        if !self.convert {
            return Ok(self.as_observed(observation));
        }

        self.chase(observation)
    }

    /// Resolve every observed commodity, sorted by name
    pub fn resolve_all(&self) -> Vec<(String, Result<Resolution, ResolveError>)> {
        self.observations
            .commodities()
            .into_iter()
            .map(|commodity| (commodity.to_string(), self.resolve(commodity)))
            .collect()
    }

    fn as_observed(&self, observation: &Observation) -> Resolution {
        let unit = if observation.currency == self.base {
            Unit::Base
        } else {
            Unit::Currency(observation.currency.clone())
        };
        Resolution::resolved(observation.price, unit)
    }

    fn chase(&self, start: &Observation) -> Result<Resolution, ResolveError> {
        let commodity = start.commodity.as_str();
        let mut price = start.price;
        let mut currency = start.currency.as_str();
        let mut chain = vec![commodity.to_string()];
        let mut visited: HashSet<&str> = HashSet::from([commodity]);

        loop {
            if currency == self.base {
                return Ok(Resolution::resolved(price, Unit::Base));
            }

            chain.push(currency.to_string());
            if !visited.insert(currency) {
                return Err(ResolveError::ConversionCycle {
                    commodity: commodity.to_string(),
                    chain,
                });
            }

            let Some(next) = self.observations.get(currency) else {
                return Ok(Resolution::Unresolved(UnresolvedReason::MissingLink {
                    currency: currency.to_string(),
                }));
            };

            price = price
                .checked_mul(next.price)
                .ok_or_else(|| ResolveError::Overflow {
                    commodity: commodity.to_string(),
                })?;
            currency = next.currency.as_str();
        }
    }
}
