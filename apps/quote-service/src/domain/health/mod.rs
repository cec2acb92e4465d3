//! Health Model
//!
//! Composite health is derived from two probes: the quote store (critical)
//! and the exchange (non-critical).
//!
//! | Store  | Exchange    | Status      |
//! |--------|-------------|-------------|
//! | failed | not checked | `unhealthy` |
//! | passed | failed      | `degraded`  |
//! | passed | passed      | `healthy`   |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message reported when every dependency is reachable.
pub const HEALTHY_MESSAGE: &str = "service is healthy";

/// Overall service health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All dependencies reachable.
    Healthy,
    /// The store is reachable but the exchange is not.
    Degraded,
    /// The store is unreachable.
    Unhealthy,
}

impl HealthStatus {
    /// Lowercase wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health status with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,
    /// Explanation, carrying the failing probe's detail when not healthy.
    pub message: String,
}

impl HealthReport {
    /// Report for a fully reachable service.
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: HEALTHY_MESSAGE.to_string(),
        }
    }
}

/// Outcome of the exchange probe.
///
/// The store is always probed, so only the exchange can be skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Exchange answered.
    Passed,
    /// Exchange failed, with detail.
    Failed(String),
    /// Exchange was not probed because the store was down.
    Skipped,
}

/// Combine the store probe failure (if any) and the exchange probe outcome
/// into a report.
///
/// A failed store dominates whatever the exchange probe says.
#[must_use]
pub fn combine(store_failure: Option<&str>, exchange: &Probe) -> HealthReport {
    match (store_failure, exchange) {
        (Some(detail), _) => HealthReport {
            status: HealthStatus::Unhealthy,
            message: format!("store health check failed: {detail}"),
        },
        (None, Probe::Failed(detail)) => HealthReport {
            status: HealthStatus::Degraded,
            message: format!("exchange health check failed: {detail}"),
        },
        (None, Probe::Passed | Probe::Skipped) => HealthReport::healthy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("timeout"), &Probe::Skipped, HealthStatus::Unhealthy ; "store down")]
    #[test_case(Some("timeout"), &Probe::Failed("503".into()), HealthStatus::Unhealthy ; "both down")]
    #[test_case(Some("timeout"), &Probe::Passed, HealthStatus::Unhealthy ; "store down exchange up")]
    #[test_case(None, &Probe::Failed("503".into()), HealthStatus::Degraded ; "exchange down")]
    #[test_case(None, &Probe::Passed, HealthStatus::Healthy ; "all up")]
    fn combine_table(store_failure: Option<&str>, exchange: &Probe, expected: HealthStatus) {
        assert_eq!(combine(store_failure, exchange).status, expected);
    }

    #[test]
    fn store_failure_is_never_healthy() {
        for exchange in [Probe::Passed, Probe::Skipped, Probe::Failed("503".into())] {
            assert_eq!(
                combine(Some(""), &exchange).status,
                HealthStatus::Unhealthy
            );
        }
    }

    #[test]
    fn messages_carry_probe_detail() {
        let unhealthy = combine(Some("connection refused"), &Probe::Skipped);
        assert_eq!(
            unhealthy.message,
            "store health check failed: connection refused"
        );

        let degraded = combine(None, &Probe::Failed("status 502".into()));
        assert_eq!(degraded.message, "exchange health check failed: status 502");

        assert_eq!(
            combine(None, &Probe::Passed).message,
            HEALTHY_MESSAGE
        );
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
        assert_eq!(HealthStatus::Unhealthy.to_string(), "unhealthy");
    }
}
