//! Exchange API response types.
//!
//! These types map directly to the exchange's public REST API format.

use serde::Deserialize;

use crate::domain::quote::Trade;

/// Trade entry from `GET /api/v2/trades`.
///
/// Contains all fields returned by the exchange; only some are used.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct ExchangeTrade {
    /// Trade ID.
    pub id: i64,
    /// Hashed trade ID.
    #[serde(default)]
    pub hid: String,
    /// Price (as string).
    pub price: String,
    /// Volume (as string).
    #[serde(default)]
    pub volume: String,
    /// Price times volume (as string).
    #[serde(default)]
    pub funds: String,
    /// Market identifier.
    #[serde(default)]
    pub market: String,
    /// Execution time (RFC 3339).
    #[serde(default)]
    pub created_at: String,
}

impl From<ExchangeTrade> for Trade {
    fn from(trade: ExchangeTrade) -> Self {
        Self {
            id: trade.id,
            price: trade.price,
            volume: trade.volume,
            timestamp: trade.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_exchange_trade() {
        let json = r#"{
            "id": 4211,
            "hid": "a1b2c3",
            "price": "81.25",
            "volume": "150.0",
            "funds": "12187.5",
            "market": "usdtrub",
            "created_at": "2025-07-28T21:22:14+03:00"
        }"#;

        let trade: Trade = serde_json::from_str::<ExchangeTrade>(json).unwrap().into();

        assert_eq!(trade.id, 4211);
        assert_eq!(trade.price, "81.25");
        assert_eq!(trade.volume, "150.0");
        assert_eq!(trade.timestamp, "2025-07-28T21:22:14+03:00");
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let trade: ExchangeTrade = serde_json::from_str(r#"{"id": 1, "price": "81.2"}"#).unwrap();
        assert!(trade.created_at.is_empty());
        assert!(trade.market.is_empty());
    }
}
