//! HTTP routes.
//!
//! Health probes are never cached. Every request passes through the
//! correlation middleware, which assigns a request ID, extracts a trace ID
//! and logs one completion record. Panics in handlers are turned into 500
//! responses inside that middleware, so they are still logged.

pub mod health;

use axum::{
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use http::header::HeaderValue;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use utoipa::OpenApi;

use crate::error::AppError;
use crate::middleware::request_correlation_layer;
use crate::state::AppState;

/// Cache-Control value for probe responses
pub const CACHE_CONTROL_HEALTH: &str = "no-store";

#[derive(OpenApi)]
#[openapi(
    info(title = "Pool Maintenance API"),
    paths(health::health, health::live, health::ready),
    components(schemas(
        health::HealthCheckResponse,
        health::ReadinessResponse,
        health::DependencyStatus
    )),
    tags((name = "health", description = "Liveness and readiness probes"))
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn openapi() -> Result<Response, AppError> {
    let body = ApiDoc::openapi().to_json()?;
    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}

/// Creates the Axum router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Health checks - no caching, always fresh for probes
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_HEALTH),
        ));

    let doc_routes = Router::new().route("/openapi.json", get(openapi));

    Router::new()
        .merge(health_routes)
        .merge(doc_routes)
        .with_state(state)
        .layer(CatchPanicLayer::new())
        // Correlation middleware - outermost, creates root span with request_id
        .layer(middleware::from_fn(request_correlation_layer))
}
