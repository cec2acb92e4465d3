//! Exchange Adapter
//!
//! Implementation of `QuoteSourcePort` over the exchange's public REST API:
//! - `GET /api/v2/trades` for the recent trade window
//! - `GET /api/v2/markets` as a reachability probe

mod api_types;
mod client;
mod config;

pub use client::ExchangeClient;
pub use config::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, ExchangeClientConfig};
