//! Readiness aggregation.
//!
//! Runs every registered [`ReadinessChecker`] in registration order and folds
//! the outcomes into one [`ReadinessReport`]:
//!
//! ```text
//! checkers[0..n]
//!     → check() bounded by the per-check deadline
//!     → DependencyCheckResult (healthy / error message)
//!     → OverallStatus::Degraded if any failed, Ok otherwise
//! ```
//!
//! Liveness never goes through here; it only reports that the process answers.

mod checker;

use std::time::Duration;

use http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

pub use checker::{CheckError, FnChecker, ReadinessChecker, TcpChecker};

/// Aggregate status of a readiness pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Ok,
    Degraded,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Ok => "ok",
            OverallStatus::Degraded => "degraded",
        }
    }
}

/// Outcome of one dependency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCheckResult {
    pub name: String,
    pub healthy: bool,
    /// Present only when `healthy` is false.
    pub error_message: Option<String>,
}

impl DependencyCheckResult {
    fn healthy(name: &str) -> Self {
        Self {
            name: name.to_string(),
            healthy: true,
            error_message: None,
        }
    }

    fn unhealthy(name: &str, error: &CheckError) -> Self {
        Self {
            name: name.to_string(),
            healthy: false,
            error_message: Some(error.to_string()),
        }
    }
}

/// Result of evaluating every registered checker once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    pub overall_status: OverallStatus,
    /// Same order as the checkers were supplied.
    pub results: Vec<DependencyCheckResult>,
}

impl ReadinessReport {
    pub fn is_ok(&self) -> bool {
        self.overall_status == OverallStatus::Ok
    }

    /// 200 when every dependency is healthy, 503 otherwise.
    pub fn status_code(&self) -> StatusCode {
        match self.overall_status {
            OverallStatus::Ok => StatusCode::OK,
            OverallStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Run each checker sequentially, in input order, bounding every call by `deadline`.
///
/// A check that does not finish in time counts as failed with
/// [`CheckError::TimedOut`]. Each failure is logged at WARN with the
/// dependency name and error text.
pub async fn evaluate<'a, I, C>(checkers: I, deadline: Duration) -> ReadinessReport
where
    I: IntoIterator<Item = &'a C>,
    C: ReadinessChecker + ?Sized + 'a,
{
    let mut results = Vec::new();
    let mut any_failed = false;

    for checker in checkers {
        let name = checker.name();
        let outcome = match tokio::time::timeout(deadline, checker.check()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(CheckError::TimedOut(deadline)),
        };

        match outcome {
            Ok(()) => results.push(DependencyCheckResult::healthy(name)),
            Err(e) => {
                tracing::warn!(dependency = %name, error = %e, "Dependency check failed");
                any_failed = true;
                results.push(DependencyCheckResult::unhealthy(name, &e));
            }
        }
    }

    let overall_status = if any_failed {
        OverallStatus::Degraded
    } else {
        OverallStatus::Ok
    };

    ReadinessReport {
        overall_status,
        results,
    }
}
