//! Application Layer
//!
//! The application layer orchestrates domain logic. It defines:
//!
//! - **Ports**: Interfaces for the exchange and the quote store
//! - **Services**: Quote retrieval and health orchestration

pub mod ports;
pub mod services;

pub use ports::*;
pub use services::*;
