//! Rate edges between catalog currencies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::currency::{Currency, CurrencyPair};

/// How a rate entered the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSource {
    /// Observed in the direct feed.
    Direct,
    /// Mirror of a direct feed quote.
    Inverted,
    /// Composed through a hub currency.
    Cross { via: Currency },
    /// A currency against itself.
    Identity,
}

/// FX rate between two currencies.
///
/// `rate` is the number of terms units equal to one base unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRate {
    /// The currency pair.
    pub pair: CurrencyPair,
    /// Terms units per base unit.
    pub rate: Decimal,
    /// Provenance of the rate.
    pub source: RateSource,
}

impl FxRate {
    /// Create a rate observed in the direct feed.
    pub fn direct(pair: CurrencyPair, rate: Decimal) -> Self {
        Self {
            pair,
            rate,
            source: RateSource::Direct,
        }
    }

    /// Create the identity rate for a currency.
    pub fn identity(currency: Currency) -> Self {
        Self {
            pair: CurrencyPair::new(currency, currency),
            rate: Decimal::ONE,
            source: RateSource::Identity,
        }
    }

    /// Create a rate composed through `via`.
    pub fn cross(pair: CurrencyPair, rate: Decimal, via: Currency) -> Self {
        Self {
            pair,
            rate,
            source: RateSource::Cross { via },
        }
    }

    /// Get the mirror rate, `None` when the rate is zero.
    pub fn inverse(&self) -> Option<Self> {
        let rate = Decimal::ONE.checked_div(self.rate)?;
        Some(Self {
            pair: self.pair.inverse(),
            rate,
            source: RateSource::Inverted,
        })
    }

    /// Convert a base quantity into terms units, unrounded.
    pub fn convert(&self, quantity: Decimal) -> Option<Decimal> {
        quantity.checked_mul(self.rate)
    }
}

impl fmt::Display for FxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.pair, self.rate)
    }
}
