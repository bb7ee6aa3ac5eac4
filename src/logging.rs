//! Tracing subscriber setup.
//!
//! Text output for local development, JSON for log shippers. The filter is
//! chosen by the caller (CLI > RUST_LOG > config > default).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::DEFAULT_LOG_FILTER;

/// Picks the effective filter directive by precedence.
pub fn resolve_filter(
    cli: Option<String>,
    env: Option<String>,
    config: Option<String>,
) -> String {
    cli.or(env)
        .or(config)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Installs the global subscriber. `format` is `"json"` or `"text"`, as
/// enforced by config validation.
pub fn init_tracing(filter: &str, format: &str) {
    let fmt_layer = match format {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed(),
        _ => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt_layer)
        .init();
}
