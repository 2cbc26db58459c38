//! FX engine error types.

use std::path::PathBuf;

use ratebook_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use thiserror::Error;

/// Message shown for requests that do not match the request grammar.
pub const MALFORMED_REQUEST_MESSAGE: &str = "Incorrect input. Type in a line of the form \"<convert from> <number of units> in <convert to>\". Example: AUD 100 in USD.";

/// Faults in the direct feed or in completing the rate graph from it.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Feed file could not be read.
    #[error("Cannot read direct feed {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Feed is not a list of `{ base, terms, rate }` records.
    #[error("Invalid direct feed structure: {0}")]
    Invalid(#[from] serde_json::Error),

    /// A record references a code outside the catalog.
    #[error("Record {index} references unknown currency {code}")]
    UnknownCurrency { index: usize, code: String },

    /// A record carries a zero or negative rate.
    #[error("Non-positive rate {rate} for {pair}")]
    NonPositiveRate { pair: CurrencyPair, rate: Decimal },

    /// A record quotes a currency against itself.
    #[error("Currency {0} quoted against itself")]
    SelfQuote(Currency),

    /// The same ordered pair was inserted twice.
    #[error("Duplicate rate for {0}")]
    DuplicateRate(CurrencyPair),

    /// Neither EUR/USD nor USD/EUR is quoted.
    #[error("Direct feed has no EUR/USD link")]
    MissingHubLink,

    /// Pair cannot be derived within one hub hop.
    #[error("Rate for {0} cannot be derived from the direct feed")]
    Unreachable(CurrencyPair),

    /// Composed rate does not fit the decimal range.
    #[error("Rate for {0} overflows")]
    Overflow(CurrencyPair),
}

/// Errors that can occur in the FX engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// Direct feed is missing, unreadable or invalid.
    #[error("Malformed direct feed: {0}")]
    MalformedFeed(#[from] FeedError),

    /// Request does not match `<CODE> <quantity> in <CODE>`.
    #[error("{}", MALFORMED_REQUEST_MESSAGE)]
    MalformedRequest { input: String },

    /// No rate for the requested pair, using the tokens as supplied.
    #[error("Unable to find rate for {base}/{terms}")]
    RateNotFound { base: String, terms: String },

    /// Admission was cancelled before the request ran.
    #[error("Conversion interrupted.")]
    Interrupted,

    /// Any other failure inside a single request.
    #[error("Unexpected error.")]
    Unexpected(String),
}

impl FxError {
    /// Whether the error only affects the request that raised it.
    pub fn is_per_request(&self) -> bool {
        !matches!(self, FxError::MalformedFeed(_))
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
