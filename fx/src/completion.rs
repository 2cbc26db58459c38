//! Rate graph completion.
//!
//! Expands a sparse direct feed into a table holding a rate for every ordered
//! pair of catalog currencies, in three phases:
//!
//! 1. direct quotes are loaded verbatim,
//! 2. every direct quote gets its mirror `1 / rate`,
//! 3. every remaining pair is crossed through a hub currency.
//!
//! Crosses between two EUR-cross currencies go through EUR, everything else
//! through USD. A leg missing from the table is derived through the other hub,
//! whose legs must already be known. EUR/USD is required in the feed, which
//! bounds that derivation to a single extra hop.

use ratebook_common::{Currency, CurrencyPair, FxRate};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::error::FeedError;
use crate::feed::DirectFeed;
use crate::table::{RateTable, RateTableBuilder};

/// Currency used to cross two others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hub {
    Eur,
    Usd,
}

impl Hub {
    /// Pick the hub for a pair.
    pub fn for_pair(base: Currency, terms: Currency) -> Self {
        if base.is_eur_cross() && terms.is_eur_cross() {
            Hub::Eur
        } else {
            Hub::Usd
        }
    }

    /// The hub's currency.
    pub fn currency(self) -> Currency {
        match self {
            Hub::Eur => Currency::EUR,
            Hub::Usd => Currency::USD,
        }
    }

    /// The hub used when a leg through this one is missing.
    pub fn other(self) -> Self {
        match self {
            Hub::Eur => Hub::Usd,
            Hub::Usd => Hub::Eur,
        }
    }
}

/// Complete the rate graph iterating the catalog in declaration order.
pub fn complete(feed: &DirectFeed) -> Result<RateTable, FeedError> {
    complete_in_order(feed, Currency::all())
}

/// Complete the rate graph iterating pairs in the given currency order.
///
/// The resulting rates do not depend on `order` beyond decimal rounding.
#[instrument(skip_all, fields(quotes = feed.len()))]
pub fn complete_in_order(feed: &DirectFeed, order: &[Currency]) -> Result<RateTable, FeedError> {
    let mut table = RateTableBuilder::new();

    add_direct_rates(&mut table, feed)?;
    add_inverted_rates(&mut table, feed)?;
    check_hub_link(&table)?;
    add_cross_rates(&mut table, order)?;

    let table = table.freeze();
    if let Some(missing) = CurrencyPair::all().find(|pair| table.get(pair).is_none()) {
        return Err(FeedError::Unreachable(missing));
    }

    let stats = table.stats();
    info!(
        direct = stats.direct,
        inverted = stats.inverted,
        cross = stats.cross,
        identity = stats.identity,
        "Rate graph completed"
    );

    Ok(table)
}

fn add_direct_rates(table: &mut RateTableBuilder, feed: &DirectFeed) -> Result<(), FeedError> {
    for quote in feed.quotes() {
        table.insert(quote.to_rate())?;
    }
    Ok(())
}

/// Mirrors only the direct quotes, never rates added later.
fn add_inverted_rates(table: &mut RateTableBuilder, feed: &DirectFeed) -> Result<(), FeedError> {
    for quote in feed.quotes() {
        let rate = quote.to_rate();
        if table.contains(&rate.pair.inverse()) {
            // Both directions were quoted; the observed one wins.
            debug!(pair = %rate.pair, "Inverse quoted directly, not inverting");
            continue;
        }
        let inverse = rate.inverse().ok_or(FeedError::NonPositiveRate {
            pair: rate.pair,
            rate: rate.rate,
        })?;
        table.insert(inverse)?;
    }
    Ok(())
}

fn check_hub_link(table: &RateTableBuilder) -> Result<(), FeedError> {
    let eur_usd = table.rate(Currency::EUR, Currency::USD);
    let usd_eur = table.rate(Currency::USD, Currency::EUR);
    match (eur_usd, usd_eur) {
        (Some(_), Some(_)) => Ok(()),
        _ => Err(FeedError::MissingHubLink),
    }
}

fn add_cross_rates(table: &mut RateTableBuilder, order: &[Currency]) -> Result<(), FeedError> {
    for base in order {
        for terms in order {
            add_rate(table, CurrencyPair::new(*base, *terms))?;
        }
    }
    Ok(())
}

fn add_rate(table: &mut RateTableBuilder, pair: CurrencyPair) -> Result<(), FeedError> {
    if table.contains(&pair) {
        return Ok(());
    }
    if pair.is_identity() {
        return table.insert(FxRate::identity(pair.base));
    }

    let hub = Hub::for_pair(pair.base, pair.terms);
    let via = hub.currency();
    let to_hub = leg(table, pair.base, via, hub.other())?;
    let from_hub = leg(table, via, pair.terms, hub.other())?;
    let rate = to_hub
        .checked_mul(from_hub)
        .ok_or(FeedError::Overflow(pair))?;

    table.insert(FxRate::cross(pair, rate, via))
}

/// Rate for `from`/`to`, deriving and inserting it through `fallback` when absent.
fn leg(
    table: &mut RateTableBuilder,
    from: Currency,
    to: Currency,
    fallback: Hub,
) -> Result<Decimal, FeedError> {
    if let Some(rate) = known(table, from, to) {
        return Ok(rate);
    }

    let pair = CurrencyPair::new(from, to);
    let via = fallback.currency();
    // One hop only: both fallback legs must already be in the table.
    let (Some(to_hub), Some(from_hub)) = (known(table, from, via), known(table, via, to)) else {
        return Err(FeedError::Unreachable(pair));
    };
    let rate = to_hub
        .checked_mul(from_hub)
        .ok_or(FeedError::Overflow(pair))?;

    debug!(pair = %pair, via = %via, "Derived missing leg");
    table.insert(FxRate::cross(pair, rate, via))?;
    Ok(rate)
}

fn known(table: &RateTableBuilder, from: Currency, to: Currency) -> Option<Decimal> {
    if from == to {
        return Some(Decimal::ONE);
    }
    table.rate(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::DirectQuote;
    use proptest::prelude::*;
    use ratebook_common::RateSource;
    use rust_decimal_macros::dec;

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < dec!(0.000000001)
    }

    fn reference_table() -> RateTable {
        complete(&DirectFeed::reference().unwrap()).unwrap()
    }

    fn quote(base: Currency, terms: Currency, rate: Decimal) -> DirectQuote {
        DirectQuote::new(base, terms, rate).unwrap()
    }

    #[test]
    fn test_hub_selection() {
        assert_eq!(Hub::for_pair(Currency::NOK, Currency::DKK), Hub::Eur);
        assert_eq!(Hub::for_pair(Currency::USD, Currency::CZK), Hub::Eur);
        assert_eq!(Hub::for_pair(Currency::NOK, Currency::JPY), Hub::Usd);
        assert_eq!(Hub::for_pair(Currency::EUR, Currency::NOK), Hub::Usd);
        assert_eq!(Hub::Eur.other(), Hub::Usd);
        assert_eq!(Hub::Usd.other().currency(), Currency::EUR);
    }

    #[test]
    fn test_completeness() {
        let table = reference_table();

        assert!(table.is_complete());
        assert_eq!(table.len(), 121);
        for pair in CurrencyPair::all() {
            let rate = table.get(&pair).unwrap();
            assert!(rate.rate > Decimal::ZERO, "{} is not positive", pair);
        }
    }

    #[test]
    fn test_identity() {
        let table = reference_table();

        for currency in Currency::all() {
            assert_eq!(table.rate(*currency, *currency), Some(Decimal::ONE));
        }
    }

    #[test]
    fn test_invertibility() {
        let feed = DirectFeed::reference().unwrap();
        let table = complete(&feed).unwrap();

        for quote in feed.quotes() {
            let forward = table.rate(quote.pair.base, quote.pair.terms).unwrap();
            let backward = table.rate(quote.pair.terms, quote.pair.base).unwrap();
            assert!(close(forward * backward, Decimal::ONE), "{}", quote.pair);
        }
    }

    #[test]
    fn test_hub_consistency() {
        let table = reference_table();

        for rate in table.rates() {
            if let RateSource::Cross { via } = rate.source {
                let to_hub = table.rate(rate.pair.base, via).unwrap();
                let from_hub = table.rate(via, rate.pair.terms).unwrap();
                assert!(close(rate.rate, to_hub * from_hub), "{}", rate.pair);
            }
        }
    }

    #[test]
    fn test_provenance_counts() {
        let stats = reference_table().stats();

        assert_eq!(stats.direct, 10);
        assert_eq!(stats.inverted, 10);
        assert_eq!(stats.identity, 11);
        assert_eq!(stats.cross, 90);
    }

    #[test]
    fn test_cross_values() {
        let table = reference_table();

        // NOK/USD is missing and derived through EUR first
        let nok_jpy = table.rate(Currency::NOK, Currency::JPY).unwrap();
        assert!(close(nok_jpy, dec!(17.04751532007709085873215543)));
        assert_eq!(
            table.get(&CurrencyPair::new(Currency::NOK, Currency::USD)).unwrap().source,
            RateSource::Cross { via: Currency::EUR }
        );

        let usd_nok = table.rate(Currency::USD, Currency::NOK).unwrap();
        assert!(close(usd_nok, dec!(7.036215996751928542427933414)));

        let eur_jpy = table.rate(Currency::EUR, Currency::JPY).unwrap();
        assert!(close(eur_jpy, dec!(147.718425)));
    }

    #[test]
    fn test_missing_hub_link() {
        let feed = DirectFeed::new(vec![
            quote(Currency::AUD, Currency::USD, dec!(0.8371)),
            quote(Currency::EUR, Currency::NOK, dec!(8.6651)),
        ]);

        assert!(matches!(complete(&feed), Err(FeedError::MissingHubLink)));
    }

    #[test]
    fn test_usd_eur_quote_is_a_hub_link() {
        let feed = DirectFeed::new(vec![
            quote(Currency::USD, Currency::EUR, dec!(0.8)),
            quote(Currency::AUD, Currency::USD, dec!(0.8371)),
            quote(Currency::CAD, Currency::USD, dec!(0.8711)),
            quote(Currency::USD, Currency::CNY, dec!(6.1715)),
            quote(Currency::GBP, Currency::USD, dec!(1.5683)),
            quote(Currency::NZD, Currency::USD, dec!(0.7750)),
            quote(Currency::USD, Currency::JPY, dec!(119.95)),
            quote(Currency::EUR, Currency::CZK, dec!(27.6028)),
            quote(Currency::EUR, Currency::DKK, dec!(7.4405)),
            quote(Currency::EUR, Currency::NOK, dec!(8.6651)),
        ]);

        let table = complete(&feed).unwrap();
        assert!(table.is_complete());
        assert_eq!(table.rate(Currency::EUR, Currency::USD), Some(dec!(1.25)));
    }

    #[test]
    fn test_unreachable_currency() {
        // Nothing links AUD to either hub
        let feed = DirectFeed::new(vec![quote(Currency::EUR, Currency::USD, dec!(1.2315))]);

        assert!(matches!(complete(&feed), Err(FeedError::Unreachable(_))));
    }

    #[test]
    fn test_both_directions_quoted() {
        let mut quotes = DirectFeed::reference().unwrap().quotes().to_vec();
        quotes.push(quote(Currency::USD, Currency::EUR, dec!(0.812)));
        let feed = DirectFeed::new(quotes);

        let table = complete(&feed).unwrap();
        assert!(table.is_complete());
        assert_eq!(table.rate(Currency::USD, Currency::EUR), Some(dec!(0.812)));
        assert_eq!(table.rate(Currency::EUR, Currency::USD), Some(dec!(1.2315)));
        assert_eq!(table.stats().direct, 11);
        assert_eq!(table.stats().inverted, 9);
    }

    #[test]
    fn test_duplicate_quote() {
        let feed = DirectFeed::new(vec![
            quote(Currency::EUR, Currency::USD, dec!(1.2315)),
            quote(Currency::EUR, Currency::USD, dec!(1.2316)),
        ]);

        assert!(matches!(complete(&feed), Err(FeedError::DuplicateRate(_))));
    }

    #[test]
    fn test_partial_order_is_incomplete() {
        let feed = DirectFeed::reference().unwrap();

        let result = complete_in_order(&feed, &[Currency::EUR, Currency::USD]);
        assert!(matches!(result, Err(FeedError::Unreachable(_))));
    }

    proptest! {
        #[test]
        fn prop_completion_is_order_independent(
            order in Just(Currency::all().to_vec()).prop_shuffle()
        ) {
            let feed = DirectFeed::reference().unwrap();
            let expected = complete(&feed).unwrap();
            let shuffled = complete_in_order(&feed, &order).unwrap();

            prop_assert_eq!(shuffled.len(), expected.len());
            for pair in CurrencyPair::all() {
                let a = expected.get(&pair).unwrap().rate;
                let b = shuffled.get(&pair).unwrap().rate;
                prop_assert!(close(a, b), "{} differs: {} vs {}", pair, a, b);
            }
        }
    }
}
