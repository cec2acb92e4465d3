//! Trade Price Extraction
//!
//! Derives an ask/bid pair from a window of recent trades. The ask is the
//! highest parseable trade price and the bid is the lowest. Entries whose
//! price does not parse are skipped individually.
//!
//! The quote timestamp is the newest parseable trade timestamp, so the
//! result does not depend on the order in which the exchange delivers
//! trades. When no timestamp parses, the current time is used.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::quote::{Quote, Trade, TradingPair};

/// Extraction failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The trade window was empty.
    #[error("no trades to extract prices from")]
    EmptyInput,

    /// None of the trades carried a parseable price.
    #[error("no valid prices among {count} trades")]
    NoValidPrices {
        /// Number of trades inspected.
        count: usize,
    },
}

/// Extract `(ask, bid)` from a trade window.
///
/// # Errors
///
/// Returns `ExtractionError::EmptyInput` for an empty slice and
/// `ExtractionError::NoValidPrices` when no price parses as a decimal.
pub fn extract_prices(trades: &[Trade]) -> Result<(Decimal, Decimal), ExtractionError> {
    if trades.is_empty() {
        return Err(ExtractionError::EmptyInput);
    }

    let mut bounds: Option<(Decimal, Decimal)> = None;

    for trade in trades {
        let Some(price) = parse_price(&trade.price) else {
            warn!(
                trade_id = trade.id,
                price = %trade.price,
                "Skipping trade with unparseable price"
            );
            continue;
        };

        bounds = Some(match bounds {
            None => (price, price),
            Some((ask, bid)) => (ask.max(price), bid.min(price)),
        });
    }

    bounds.ok_or(ExtractionError::NoValidPrices {
        count: trades.len(),
    })
}

/// Newest parseable trade timestamp in the window, if any.
#[must_use]
pub fn reference_time(trades: &[Trade]) -> Option<DateTime<Utc>> {
    trades
        .iter()
        .filter_map(|trade| DateTime::parse_from_rfc3339(trade.timestamp.trim()).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .max()
}

/// Derive a [`Quote`] for `pair` from a trade window.
///
/// # Errors
///
/// Propagates any `ExtractionError` from [`extract_prices`].
pub fn derive_quote(pair: &TradingPair, trades: &[Trade]) -> Result<Quote, ExtractionError> {
    let (ask, bid) = extract_prices(trades)?;

    let observed_at = reference_time(trades).unwrap_or_else(|| {
        warn!(
            trades = trades.len(),
            "No parseable trade timestamp, using current time"
        );
        Utc::now()
    });

    Ok(Quote::from_ordered(pair.clone(), ask, bid, observed_at))
}

/// Largest exponent magnitude applied digit by digit. Beyond it a non-zero
/// mantissa either overflows or rounds to zero.
const MAX_EXPONENT: u32 = 60;

/// Parse a trade price.
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent. Anything else, including digit separators, is
/// rejected. Values finer than 28 decimal places are rounded.
#[allow(clippy::expect_used)] // Regex is a compile-time constant
fn parse_price(raw: &str) -> Option<Decimal> {
    static PRICE_GRAMMAR: OnceLock<Regex> = OnceLock::new();

    let re = PRICE_GRAMMAR.get_or_init(|| {
        Regex::new(r"^([+-]?)([0-9]*)(?:\.([0-9]*))?(?:[eE]([+-]?[0-9]+))?$")
            .expect("price regex is valid")
    });

    let caps = re.captures(raw.trim())?;
    let sign = if caps.get(1).is_some_and(|m| m.as_str() == "-") {
        "-"
    } else {
        ""
    };
    let int_digits = caps.get(2).map_or("", |m| m.as_str());
    let frac_digits = caps.get(3).map_or("", |m| m.as_str());
    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
    let mantissa = if frac_digits.is_empty() {
        format!("{sign}{int_digits}")
    } else {
        format!("{sign}{int_digits}.{frac_digits}")
    };
    let mantissa = Decimal::from_str(&mantissa).ok()?;

    match caps.get(4) {
        None => Some(mantissa),
        Some(exp) => apply_exponent(mantissa, exp.as_str().parse().ok()?),
    }
}

fn apply_exponent(mut value: Decimal, exp: i64) -> Option<Decimal> {
    if value.is_zero() {
        return Some(Decimal::ZERO);
    }

    let steps = exp.unsigned_abs();
    if steps > u64::from(MAX_EXPONENT) {
        return (exp < 0).then_some(Decimal::ZERO);
    }

    for _ in 0..steps {
        value = if exp > 0 {
            value.checked_mul(Decimal::TEN)?
        } else {
            // Only underflow can fail here
            value.checked_div(Decimal::TEN).unwrap_or(Decimal::ZERO)
        };
    }
    Some(value)
}

// =============================================================================
// Tests
// =============================================================================
