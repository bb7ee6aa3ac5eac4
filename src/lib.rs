//! Pool maintenance service.
//!
//! An HTTP service skeleton with liveness/readiness probes backed by
//! pluggable dependency checkers, request-correlation logging, and build
//! metadata reporting.

pub mod config;
pub mod correlation;
pub mod error;
pub mod health;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod version;

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
pub use version::BuildInfo;
