//! Quote Domain Types
//!
//! A [`Quote`] is the derived market view for a [`TradingPair`] at a point in
//! time. It is built from a window of raw [`Trade`]s and, once persisted,
//! becomes an immutable [`QuoteRecord`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// =============================================================================
// Trading Pair
// =============================================================================

/// Two-asset market identifier such as `USDT/RUB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradingPair {
    base: String,
    quote: String,
}

impl TradingPair {
    /// Create a trading pair from its base and quote assets.
    ///
    /// Asset codes are normalised to upper case.
    ///
    /// # Errors
    ///
    /// Returns `TradingPairError` if either asset is empty or contains
    /// anything other than ASCII letters and digits.
    pub fn new(base: &str, quote: &str) -> Result<Self, TradingPairError> {
        let valid = |asset: &str| {
            !asset.is_empty() && asset.chars().all(|c| c.is_ascii_alphanumeric())
        };
        if !valid(base) || !valid(quote) {
            return Err(TradingPairError::Invalid(format!("{base}/{quote}")));
        }

        Ok(Self {
            base: base.to_ascii_uppercase(),
            quote: quote.to_ascii_uppercase(),
        })
    }

    /// Base asset (e.g. `USDT`).
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Quote asset (e.g. `RUB`).
    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Market identifier used by the exchange API (e.g. `usdtrub`).
    #[must_use]
    pub fn market_id(&self) -> String {
        format!("{}{}", self.base, self.quote).to_ascii_lowercase()
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for TradingPair {
    type Err = TradingPairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| TradingPairError::Invalid(s.to_string()))?;
        Self::new(base, quote).map_err(|_| TradingPairError::Invalid(s.to_string()))
    }
}

/// Trading pair parse error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TradingPairError {
    /// Not of the form `BASE/QUOTE`.
    #[error("invalid trading pair '{0}': expected BASE/QUOTE")]
    Invalid(String),
}

// =============================================================================
// Trade
// =============================================================================

/// A single trade observation reported by the exchange.
///
/// Price, volume and timestamp are kept exactly as delivered so that a
/// malformed entry only affects itself during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    /// Exchange trade identifier.
    pub id: i64,
    /// Trade price as a decimal string.
    pub price: String,
    /// Traded volume as a decimal string.
    pub volume: String,
    /// Execution time as an RFC 3339 string.
    pub timestamp: String,
}

// =============================================================================
// Quote
// =============================================================================

/// Derived ask/bid view of a trading pair.
///
/// Invariant: `ask_price >= bid_price`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    trading_pair: TradingPair,
    ask_price: Decimal,
    bid_price: Decimal,
    observed_at: DateTime<Utc>,
}

impl Quote {
    /// Create a quote.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::InvertedSpread` if the ask is below the bid.
    pub fn new(
        trading_pair: TradingPair,
        ask_price: Decimal,
        bid_price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, QuoteError> {
        if ask_price < bid_price {
            return Err(QuoteError::InvertedSpread {
                ask: ask_price,
                bid: bid_price,
            });
        }

        Ok(Self::from_ordered(
            trading_pair,
            ask_price,
            bid_price,
            observed_at,
        ))
    }

    /// Build a quote from prices already known to satisfy `ask >= bid`.
    pub(crate) fn from_ordered(
        trading_pair: TradingPair,
        ask_price: Decimal,
        bid_price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(ask_price >= bid_price, "quote ask below bid");
        Self {
            trading_pair,
            ask_price,
            bid_price,
            observed_at,
        }
    }

    /// Trading pair this quote describes.
    #[must_use]
    pub const fn trading_pair(&self) -> &TradingPair {
        &self.trading_pair
    }

    /// Highest observed price in the trade window.
    #[must_use]
    pub const fn ask_price(&self) -> Decimal {
        self.ask_price
    }

    /// Lowest observed price in the trade window.
    #[must_use]
    pub const fn bid_price(&self) -> Decimal {
        self.bid_price
    }

    /// Time of the newest trade in the window.
    #[must_use]
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

/// Quote construction error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    /// Ask below bid.
    #[error("ask price {ask} is below bid price {bid}")]
    InvertedSpread {
        /// Offending ask price.
        ask: Decimal,
        /// Offending bid price.
        bid: Decimal,
    },
}

// =============================================================================
// Quote Record
// =============================================================================

/// A quote as durably stored. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRecord {
    /// Store-generated identifier.
    pub id: i64,
    /// The persisted quote.
    pub quote: Quote,
    /// When the quote was written to the store.
    pub persisted_at: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn trading_pair_parsing() {
        let pair: TradingPair = "usdt/rub".parse().unwrap();
        assert_eq!(pair.base(), "USDT");
        assert_eq!(pair.quote(), "RUB");
        assert_eq!(pair.to_string(), "USDT/RUB");
        assert_eq!(pair.market_id(), "usdtrub");
    }

    #[test]
    fn trading_pair_rejects_malformed_input() {
        for input in ["USDTRUB", "/RUB", "USDT/", "USDT/RUB/EUR", "US DT/RUB", ""] {
            assert!(
                input.parse::<TradingPair>().is_err(),
                "expected '{input}' to be rejected"
            );
        }
    }

    #[test]
    fn quote_rejects_inverted_spread() {
        let pair = TradingPair::new("USDT", "RUB").unwrap();
        let err = Quote::new(pair, dec!(81.20), dec!(81.30), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            QuoteError::InvertedSpread {
                ask: dec!(81.20),
                bid: dec!(81.30)
            }
        );
    }

    #[test]
    fn quote_keeps_prices() {
        let pair = TradingPair::new("USDT", "RUB").unwrap();
        let quote = Quote::new(pair, dec!(81.30), dec!(81.20), Utc::now()).unwrap();
        assert_eq!(quote.ask_price(), dec!(81.30));
        assert_eq!(quote.bid_price(), dec!(81.20));
    }

    #[test]
    fn quote_allows_zero_spread() {
        let pair = TradingPair::new("USDT", "RUB").unwrap();
        let quote = Quote::new(pair, dec!(81.25), dec!(81.25), Utc::now()).unwrap();
        assert_eq!(quote.ask_price(), quote.bid_price());
    }
}
