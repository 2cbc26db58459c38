//! The closed currency catalog.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// ISO 4217 currency supported by the calculator.
///
/// Declaration order is the catalog order used for all-pairs iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    AUD,
    CAD,
    CNY,
    CZK,
    DKK,
    EUR,
    GBP,
    JPY,
    NOK,
    NZD,
    USD,
}

/// Every catalog currency in declaration order.
const ALL: [Currency; 11] = [
    Currency::AUD,
    Currency::CAD,
    Currency::CNY,
    Currency::CZK,
    Currency::DKK,
    Currency::EUR,
    Currency::GBP,
    Currency::JPY,
    Currency::NOK,
    Currency::NZD,
    Currency::USD,
];

lazy_static! {
    /// Reverse index from display label to currency.
    static ref BY_LABEL: HashMap<&'static str, Currency> =
        ALL.iter().map(|c| (c.label(), *c)).collect();
}

impl Currency {
    /// All currencies in stable declaration order.
    pub fn all() -> &'static [Currency] {
        &ALL
    }

    /// Resolve a currency by its three-letter code.
    pub fn from_code(code: &str) -> Result<Self, CatalogError> {
        ALL.iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or_else(|| CatalogError::UnknownCode(code.to_string()))
    }

    /// Resolve a currency by its display label.
    pub fn from_label(label: &str) -> Result<Self, CatalogError> {
        BY_LABEL
            .get(label)
            .copied()
            .ok_or_else(|| CatalogError::UnknownLabel(label.to_string()))
    }

    /// Get the currency code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::AUD => "AUD",
            Currency::CAD => "CAD",
            Currency::CNY => "CNY",
            Currency::CZK => "CZK",
            Currency::DKK => "DKK",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::NOK => "NOK",
            Currency::NZD => "NZD",
            Currency::USD => "USD",
        }
    }

    /// Get the human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Currency::AUD => "Australian dollar",
            Currency::CAD => "Canadian dollar",
            Currency::CNY => "Chinese yuan",
            Currency::CZK => "Czech koruna",
            Currency::DKK => "Danish krone",
            Currency::EUR => "Euro",
            Currency::GBP => "Pound sterling",
            Currency::JPY => "Japanese yen",
            Currency::NOK => "Norwegian krone",
            Currency::NZD => "New Zealand dollar",
            Currency::USD => "United States dollar",
        }
    }

    /// Whether crosses between two such currencies are quoted via EUR.
    pub fn is_eur_cross(&self) -> bool {
        matches!(
            self,
            Currency::CZK | Currency::DKK | Currency::NOK | Currency::USD
        )
    }

    /// Get the decimal places used when displaying amounts.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// An ordered currency pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Base currency (one unit of it is priced).
    pub base: Currency,
    /// Terms currency (the pricing currency).
    pub terms: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, terms: Currency) -> Self {
        Self { base, terms }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.terms,
            terms: self.base,
        }
    }

    /// Whether base and terms are the same currency.
    pub fn is_identity(&self) -> bool {
        self.base == self.terms
    }

    /// Every ordered pair of the catalog, identity pairs included.
    pub fn all() -> impl Iterator<Item = CurrencyPair> {
        Currency::all().iter().flat_map(|base| {
            Currency::all()
                .iter()
                .map(move |terms| CurrencyPair::new(*base, *terms))
        })
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.terms)
    }
}
