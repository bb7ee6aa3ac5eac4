//! Pool maintenance service entry point.
//!
//! Parses the command line, loads configuration, initializes tracing, builds
//! the router and serves it until a shutdown signal arrives.

use std::path::PathBuf;

use clap::Parser;

use pool_maintenance::config::AppConfig;
use pool_maintenance::health::TcpChecker;
use pool_maintenance::logging::{init_tracing, resolve_filter};
use pool_maintenance::{create_router, AppState, BuildInfo};

/// Pool maintenance HTTP service
#[derive(Parser, Debug)]
#[command(name = "pool-maintenance", version, about)]
struct Args {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level filter (e.g., "pool_maintenance=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Listen port, overrides config and the PORT environment variable
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = AppConfig::resolve(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    // Initialize tracing with priority: CLI > env > config > default
    let log_filter = resolve_filter(
        args.log_level,
        std::env::var("RUST_LOG").ok(),
        config.logging.filter.clone(),
    );
    init_tracing(&log_filter, &config.logging.format);

    let build = BuildInfo::from_build_env();
    tracing::info!(
        version = %build.version,
        commit = %build.commit,
        build_date = %build.build_date,
        "Loaded configuration"
    );

    let mut state = AppState::new(build).with_check_timeout(config.health.check_timeout());
    for dependency in &config.health.dependencies {
        state = state.with_checker(TcpChecker::new(&dependency.name, &dependency.address));
    }
    tracing::info!(
        checkers = state.checkers.len(),
        timeout_ms = config.health.check_timeout_ms,
        "Readiness checks registered"
    );

    let app = create_router(state);

    pool_maintenance::http::start_server(app, &config).await?;

    Ok(())
}
