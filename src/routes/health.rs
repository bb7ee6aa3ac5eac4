//! Health check endpoints for container orchestration.
//!
//! - `/health/live`: liveness probe, 200 whenever the process can respond.
//! - `/health/ready`: readiness probe, runs every registered dependency check
//!   and answers 503 when any of them fails.
//! - `/health`: legacy alias for liveness.
//!
//! Every body carries the build metadata so deploy pipelines can confirm which
//! binary is serving.

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::health::{self, DependencyCheckResult, OverallStatus, ReadinessReport};
use crate::state::AppState;
use crate::version::BuildInfo;

/// Liveness body.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    #[schema(example = "ok")]
    pub status: OverallStatus,
    #[serde(flatten)]
    pub build: BuildInfo,
    #[schema(example = 123.45)]
    pub uptime_seconds: f64,
}

/// Readiness body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    #[schema(example = "degraded")]
    pub status: OverallStatus,
    #[serde(flatten)]
    pub build: BuildInfo,
    pub uptime_seconds: f64,
    pub dependencies: Vec<DependencyStatus>,
}

/// Per-dependency entry in the readiness body.
#[derive(Debug, Serialize, ToSchema)]
pub struct DependencyStatus {
    #[schema(example = "db")]
    pub name: String,
    pub status: OverallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "connection refused")]
    pub error: Option<String>,
}

impl From<DependencyCheckResult> for DependencyStatus {
    fn from(result: DependencyCheckResult) -> Self {
        Self {
            name: result.name,
            status: if result.healthy {
                OverallStatus::Ok
            } else {
                OverallStatus::Degraded
            },
            error: result.error_message,
        }
    }
}

impl ReadinessResponse {
    fn new(report: ReadinessReport, state: &AppState) -> Self {
        Self {
            status: report.overall_status,
            build: (*state.build).clone(),
            uptime_seconds: state.uptime_seconds(),
            dependencies: report.results.into_iter().map(Into::into).collect(),
        }
    }
}

fn liveness(state: &AppState, uri: &Uri) -> Json<HealthCheckResponse> {
    let uptime_seconds = state.uptime_seconds();
    tracing::info!(path = %uri.path(), uptime_seconds, "health check endpoint called");
    Json(HealthCheckResponse {
        status: OverallStatus::Ok,
        build: (*state.build).clone(),
        uptime_seconds,
    })
}

/// Legacy health check, kept for monitors configured before the split probes.
#[utoipa::path(
    get,
    path = "/health",
    description = "Returns service health and version info. Alias for /health/live.",
    responses((status = OK, description = "Process is running", body = HealthCheckResponse)),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>, uri: Uri) -> Json<HealthCheckResponse> {
    liveness(&state, &uri)
}

/// Liveness probe. Never consults dependency checkers.
#[utoipa::path(
    get,
    path = "/health/live",
    description = "Reports that the process is able to respond, plus build metadata.",
    responses((status = OK, description = "Process is running", body = HealthCheckResponse)),
    tag = "health"
)]
pub async fn live(State(state): State<AppState>, uri: Uri) -> Json<HealthCheckResponse> {
    liveness(&state, &uri)
}

/// Readiness probe.
#[utoipa::path(
    get,
    path = "/health/ready",
    description = "Runs every registered dependency check.",
    responses(
        (status = OK, description = "All dependencies healthy", body = ReadinessResponse),
        (status = SERVICE_UNAVAILABLE, description = "At least one dependency unhealthy", body = ReadinessResponse)
    ),
    tag = "health"
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let report = health::evaluate(state.checkers(), state.check_timeout).await;
    let status = report.status_code();
    tracing::debug!(
        status = report.overall_status.as_str(),
        dependencies = report.results.len(),
        "readiness evaluated"
    );
    (status, Json(ReadinessResponse::new(report, &state)))
}
