//! The rate table, keyed by ordered currency pair.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ratebook_common::{Currency, CurrencyPair, FxRate, RateSource};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::FeedError;

/// Mutable table used while the rate graph is being completed.
#[derive(Debug, Default)]
pub struct RateTableBuilder {
    rates: HashMap<CurrencyPair, FxRate>,
}

impl RateTableBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rate, failing if its pair is already present.
    pub fn insert(&mut self, rate: FxRate) -> Result<(), FeedError> {
        if self.rates.contains_key(&rate.pair) {
            return Err(FeedError::DuplicateRate(rate.pair));
        }
        debug!(pair = %rate.pair, rate = %rate.rate, source = ?rate.source, "Rate added");
        self.rates.insert(rate.pair, rate);
        Ok(())
    }

    /// Get the rate value for a pair if present.
    pub fn rate(&self, base: Currency, terms: Currency) -> Option<Decimal> {
        self.rates
            .get(&CurrencyPair::new(base, terms))
            .map(|r| r.rate)
    }

    /// Check whether a pair is present.
    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.rates.contains_key(pair)
    }

    /// Number of rates so far.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Finish building. The returned table is never written again.
    pub fn freeze(self) -> RateTable {
        RateTable {
            rates: self.rates,
            completed_at: Utc::now(),
        }
    }
}

/// Read-only rate table shared by all conversion requests.
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: HashMap<CurrencyPair, FxRate>,
    completed_at: DateTime<Utc>,
}

impl RateTable {
    /// Get the rate entry for a pair.
    pub fn get(&self, pair: &CurrencyPair) -> Option<&FxRate> {
        self.rates.get(pair)
    }

    /// Get the rate value for a pair.
    pub fn rate(&self, base: Currency, terms: Currency) -> Option<Decimal> {
        self.get(&CurrencyPair::new(base, terms)).map(|r| r.rate)
    }

    /// Number of rates.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Whether every ordered catalog pair has a rate.
    pub fn is_complete(&self) -> bool {
        CurrencyPair::all().all(|pair| self.rates.contains_key(&pair))
    }

    /// All rates in catalog order.
    pub fn rates(&self) -> Vec<&FxRate> {
        let mut rates: Vec<&FxRate> = self.rates.values().collect();
        rates.sort_by_key(|r| r.pair);
        rates
    }

    /// When the table was frozen.
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Count rates by provenance.
    pub fn stats(&self) -> TableStats {
        let mut stats = TableStats::default();
        for rate in self.rates.values() {
            match rate.source {
                RateSource::Direct => stats.direct += 1,
                RateSource::Inverted => stats.inverted += 1,
                RateSource::Cross { .. } => stats.cross += 1,
                RateSource::Identity => stats.identity += 1,
            }
        }
        stats
    }
}

/// Table statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    pub direct: usize,
    pub inverted: usize,
    pub cross: usize,
    pub identity: usize,
}

impl TableStats {
    /// Total number of rates.
    pub fn total(&self) -> usize {
        self.direct + self.inverted + self.cross + self.identity
    }
}

/// Shared rate table.
pub type SharedRateTable = Arc<RateTable>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eur_usd() -> FxRate {
        FxRate::direct(CurrencyPair::new(Currency::EUR, Currency::USD), dec!(1.2315))
    }

    #[test]
    fn test_insert_and_get() {
        let mut builder = RateTableBuilder::new();
        builder.insert(eur_usd()).unwrap();

        assert_eq!(builder.rate(Currency::EUR, Currency::USD), Some(dec!(1.2315)));
        assert_eq!(builder.rate(Currency::USD, Currency::EUR), None);

        let table = builder.freeze();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&CurrencyPair::new(Currency::EUR, Currency::USD)),
            Some(&eur_usd())
        );
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut builder = RateTableBuilder::new();
        builder.insert(eur_usd()).unwrap();

        let err = builder.insert(eur_usd()).unwrap_err();
        assert!(matches!(err, FeedError::DuplicateRate(pair) if pair == eur_usd().pair));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_incomplete_table() {
        let mut builder = RateTableBuilder::new();
        builder.insert(eur_usd()).unwrap();

        let table = builder.freeze();
        assert!(!table.is_complete());
    }

    #[test]
    fn test_stats_and_order() {
        let mut builder = RateTableBuilder::new();
        builder.insert(eur_usd()).unwrap();
        builder.insert(eur_usd().inverse().unwrap()).unwrap();
        builder.insert(FxRate::identity(Currency::AUD)).unwrap();

        let table = builder.freeze();
        let stats = table.stats();
        assert_eq!(stats.direct, 1);
        assert_eq!(stats.inverted, 1);
        assert_eq!(stats.identity, 1);
        assert_eq!(stats.total(), table.len());

        let pairs: Vec<String> = table.rates().iter().map(|r| r.pair.to_string()).collect();
        assert_eq!(pairs, vec!["AUD/AUD", "EUR/USD", "USD/EUR"]);
    }
}
