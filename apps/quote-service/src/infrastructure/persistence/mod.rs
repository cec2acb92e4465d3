//! Persistence Adapters
//!
//! Implementations of `QuoteStorePort`:
//! - **`PostgreSQL`**: durable storage via `sqlx`
//! - **In-memory**: tests and local development

mod in_memory;
mod postgres;
mod schema;

pub use in_memory::InMemoryQuoteStore;
pub use postgres::{PROBE_TIMEOUT, PostgresQuoteStore};
pub use schema::initialize_schema;
