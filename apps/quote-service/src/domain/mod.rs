//! Domain Layer - Quote derivation and health rules.
//!
//! This layer contains the core types and pure business rules of the
//! service. Nothing here performs I/O.

/// Trading pair, trade, quote and persisted quote record types.
pub mod quote;

/// Derivation of an ask/bid quote from a window of raw trades.
pub mod extraction;

/// Health status model and the store/exchange combinator.
pub mod health;
