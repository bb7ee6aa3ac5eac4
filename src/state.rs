//! Shared application state for request handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DEFAULT_CHECK_TIMEOUT_MS;
use crate::health::ReadinessChecker;
use crate::version::BuildInfo;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Build metadata and the checker list are fixed at construction; nothing
/// here is mutated while serving requests.
#[derive(Clone)]
pub struct AppState {
    pub build: Arc<BuildInfo>,
    pub checkers: Arc<[Arc<dyn ReadinessChecker>]>,
    pub check_timeout: Duration,
    pub started_at: Instant,
}

impl AppState {
    /// Creates state with no dependency checkers and the default check deadline.
    pub fn new(build: BuildInfo) -> Self {
        Self {
            build: Arc::new(build),
            checkers: Arc::from(Vec::new()),
            check_timeout: Duration::from_millis(DEFAULT_CHECK_TIMEOUT_MS),
            started_at: Instant::now(),
        }
    }

    /// Registers a dependency checker (builder style).
    pub fn with_checker(mut self, checker: impl ReadinessChecker + 'static) -> Self {
        let mut checkers = self.checkers.to_vec();
        checkers.push(Arc::new(checker));
        self.checkers = Arc::from(checkers);
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Registered checkers in registration order.
    pub fn checkers(&self) -> impl Iterator<Item = &(dyn ReadinessChecker + 'static)> + '_ {
        self.checkers.iter().map(|c| &**c)
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
