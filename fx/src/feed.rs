//! Direct feed sources.

use std::path::{Path, PathBuf};

use ratebook_common::{Currency, CurrencyPair, FxRate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::FeedError;

/// Reference feed bundled with the engine.
const REFERENCE_FEED: &str = include_str!("../resources/direct_feeds.json");

/// Record shape of the JSON feed.
#[derive(Debug, Deserialize)]
struct RawQuote {
    base: String,
    terms: String,
    rate: Decimal,
}

/// A validated directly observed quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectQuote {
    /// Quoted pair.
    pub pair: CurrencyPair,
    /// Terms units per base unit, always positive.
    pub rate: Decimal,
}

impl DirectQuote {
    /// Create a quote, rejecting self quotes and non-positive rates.
    pub fn new(base: Currency, terms: Currency, rate: Decimal) -> Result<Self, FeedError> {
        if base == terms {
            return Err(FeedError::SelfQuote(base));
        }
        let pair = CurrencyPair::new(base, terms);
        if rate <= Decimal::ZERO {
            return Err(FeedError::NonPositiveRate { pair, rate });
        }
        Ok(Self { pair, rate })
    }

    /// The quote as a table entry.
    pub fn to_rate(&self) -> FxRate {
        FxRate::direct(self.pair, self.rate)
    }
}

/// The sparse list of observed quotes the rate table is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectFeed {
    quotes: Vec<DirectQuote>,
}

impl DirectFeed {
    /// Create a feed from validated quotes.
    pub fn new(quotes: Vec<DirectQuote>) -> Self {
        Self { quotes }
    }

    /// Parse a JSON array of `{ "base", "terms", "rate" }` records.
    pub fn from_json(text: &str) -> Result<Self, FeedError> {
        let raw: Vec<RawQuote> = serde_json::from_str(text)?;
        let quotes = raw
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let base = resolve(index, &record.base)?;
                let terms = resolve(index, &record.terms)?;
                DirectQuote::new(base, terms, record.rate)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(quotes = quotes.len(), "Parsed direct feed");
        Ok(Self { quotes })
    }

    /// The bundled reference feed.
    pub fn reference() -> Result<Self, FeedError> {
        Self::from_json(REFERENCE_FEED)
    }

    /// Quotes in feed order.
    pub fn quotes(&self) -> &[DirectQuote] {
        &self.quotes
    }

    /// Number of quotes.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Whether the feed has no quotes.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

fn resolve(index: usize, code: &str) -> Result<Currency, FeedError> {
    Currency::from_code(code).map_err(|_| FeedError::UnknownCurrency {
        index,
        code: code.to_string(),
    })
}

/// Something the direct feed can be loaded from.
pub trait FeedSource: Send + Sync {
    /// Get the source name for diagnostics.
    fn name(&self) -> &str;

    /// Load and validate the feed.
    fn load(&self) -> Result<DirectFeed, FeedError>;
}

/// Feed read from a JSON file on disk.
pub struct JsonFileFeed {
    path: PathBuf,
    name: String,
}

impl JsonFileFeed {
    /// Create a source for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    /// Path of the feed file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeedSource for JsonFileFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<DirectFeed, FeedError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| FeedError::Unreadable {
            path: self.path.clone(),
            source,
        })?;
        DirectFeed::from_json(&text)
    }
}

/// The feed compiled into the binary.
pub struct ReferenceFeed;

impl FeedSource for ReferenceFeed {
    fn name(&self) -> &str {
        "REFERENCE"
    }

    fn load(&self) -> Result<DirectFeed, FeedError> {
        DirectFeed::reference()
    }
}

/// In-memory feed.
pub struct StaticFeed {
    feed: DirectFeed,
}

impl StaticFeed {
    /// Wrap an already built feed.
    pub fn new(feed: DirectFeed) -> Self {
        Self { feed }
    }
}

impl FeedSource for StaticFeed {
    fn name(&self) -> &str {
        "STATIC"
    }

    fn load(&self) -> Result<DirectFeed, FeedError> {
        Ok(self.feed.clone())
    }
}
