//! Conversion request parsing and result formatting.

use std::fmt;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use ratebook_common::{Currency, CurrencyPair, FxRate};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FxError, FxResult};
use crate::table::RateTable;

lazy_static! {
    /// `<CODE> <quantity> in <CODE>`, quantity with zero or two decimals.
    static ref REQUEST_PATTERN: Regex =
        Regex::new(r"^([A-Z]{3}) ([0-9]+(?:\.[0-9]{2})?) in ([A-Z]{3})$")
            .expect("Invalid regex pattern");
}

/// A syntactically valid conversion request, tokens kept as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Code to convert from.
    pub base: String,
    /// Quantity exactly as supplied.
    pub quantity: String,
    /// Code to convert to.
    pub terms: String,
}

impl ConversionRequest {
    /// Parse a request line.
    pub fn parse(input: &str) -> FxResult<Self> {
        let captures = REQUEST_PATTERN
            .captures(input)
            .ok_or_else(|| FxError::MalformedRequest {
                input: input.to_string(),
            })?;

        Ok(Self {
            base: captures[1].to_string(),
            quantity: captures[2].to_string(),
            terms: captures[3].to_string(),
        })
    }

    /// Look up the rate for the requested pair, then parse the quantity.
    ///
    /// Unknown codes and missing rates are `RateNotFound`. A quantity beyond the
    /// decimal range is `Unexpected`.
    pub fn resolve<'a>(&self, table: &'a RateTable) -> FxResult<(Decimal, &'a FxRate)> {
        let pair = self.pair().ok_or_else(|| self.rate_not_found())?;
        let rate = table.get(&pair).ok_or_else(|| self.rate_not_found())?;
        let quantity: Decimal = self.quantity.parse().map_err(|_| {
            FxError::Unexpected(format!("quantity {} out of range", self.quantity))
        })?;
        Ok((quantity, rate))
    }

    fn pair(&self) -> Option<CurrencyPair> {
        let base = Currency::from_code(&self.base).ok()?;
        let terms = Currency::from_code(&self.terms).ok()?;
        Some(CurrencyPair::new(base, terms))
    }

    fn rate_not_found(&self) -> FxError {
        FxError::RateNotFound {
            base: self.base.clone(),
            terms: self.terms.clone(),
        }
    }
}

/// Represents a completed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    /// Unique conversion ID.
    pub id: Uuid,
    /// The request as typed.
    pub request: ConversionRequest,
    /// Rate used for conversion.
    pub rate: FxRate,
    /// Output amount, rounded for the terms currency.
    pub output: Decimal,
    /// When the conversion was executed.
    pub executed_at: DateTime<Utc>,
}

impl Conversion {
    /// Evaluate a request against the rate table.
    pub fn evaluate(request: ConversionRequest, table: &RateTable) -> FxResult<Self> {
        let (quantity, rate) = request.resolve(table)?;
        let raw = rate.convert(quantity).ok_or_else(|| {
            FxError::Unexpected(format!("{} {} overflows", rate.pair, quantity))
        })?;

        Ok(Self {
            id: Uuid::now_v7(),
            output: round_amount(raw, rate.pair.terms),
            rate: rate.clone(),
            request,
            executed_at: Utc::now(),
        })
    }

    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        self.rate.pair
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} = {} {}",
            self.rate.pair.base,
            self.request.quantity,
            self.rate.pair.terms,
            format_amount(self.output, self.rate.pair.terms)
        )
    }
}

/// Round half away from zero to the currency's display decimals.
pub fn round_amount(value: Decimal, currency: Currency) -> Decimal {
    value.round_dp_with_strategy(
        currency.decimal_places(),
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Render an amount with exactly the currency's display decimals.
pub fn format_amount(value: Decimal, currency: Currency) -> String {
    let places = currency.decimal_places() as usize;
    format!("{:.*}", places, round_amount(value, currency))
}
