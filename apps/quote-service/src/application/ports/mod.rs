//! Application Ports (Driven)
//!
//! Interfaces the quote service uses to reach external systems:
//! - **Quote source**: the exchange that reports recent trades
//! - **Quote store**: durable storage for derived quotes

mod quote_source_port;
mod quote_store_port;

pub use quote_source_port::{QuoteSourceError, QuoteSourcePort};
pub use quote_store_port::{QuoteStoreError, QuoteStorePort};
