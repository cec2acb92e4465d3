//! gRPC Quote Server
//!
//! Implements the `quote.v1.QuoteService` gRPC service on top of the
//! application `QuoteService`.
//!
//! # Error Mapping
//!
//! | Failure                         | Code                  |
//! |---------------------------------|-----------------------|
//! | exchange transport / bad status | `UNAVAILABLE`         |
//! | exchange body not decodable     | `INTERNAL`            |
//! | no usable trades                | `FAILED_PRECONDITION` |
//! | store read / write failure      | `INTERNAL`            |
//! | nothing stored yet              | `NOT_FOUND`           |
//! | store down during health check  | `UNAVAILABLE` + details |

pub mod server;

// Allow clippy warnings and missing docs in generated code
#[allow(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto {
    pub mod quote {
        pub mod v1 {
            include!(concat!(env!("OUT_DIR"), "/quote.v1.rs"));
        }
    }
}

pub use server::QuoteGrpcServer;
