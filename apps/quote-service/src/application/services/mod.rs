//! Application Services
//!
//! Services coordinate domain logic and infrastructure adapters.

mod quote_service;

pub use quote_service::{HealthCheckError, QuoteService, QuoteServiceError};
