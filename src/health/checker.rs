//! Dependency checker abstraction.
//!
//! Anything the service needs in order to serve traffic (a database pool, a
//! message broker, a downstream API) is registered as a [`ReadinessChecker`].
//! The readiness probe runs every registered checker on each call.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

/// Failure reported by a single dependency check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("{0}")]
    Failed(String),

    #[error("check timed out after {0:?}")]
    TimedOut(Duration),
}

impl CheckError {
    pub fn failed(message: impl Into<String>) -> Self {
        CheckError::Failed(message.into())
    }
}

/// A named dependency whose health gates readiness.
#[async_trait]
pub trait ReadinessChecker: Send + Sync {
    /// Stable identifier reported in the readiness payload.
    fn name(&self) -> &str;

    /// Returns `Ok(())` when the dependency is usable.
    async fn check(&self) -> Result<(), CheckError>;
}

/// Adapts a plain closure into a [`ReadinessChecker`].
pub struct FnChecker<F> {
    name: String,
    check: F,
}

impl<F> FnChecker<F>
where
    F: Fn() -> Result<(), String> + Send + Sync,
{
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

#[async_trait]
impl<F> ReadinessChecker for FnChecker<F>
where
    F: Fn() -> Result<(), String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<(), CheckError> {
        (self.check)().map_err(CheckError::Failed)
    }
}

/// Ready when a TCP connection to `address` can be opened.
///
/// The connection is dropped immediately. The aggregator's deadline bounds
/// how long a connect attempt may hang.
pub struct TcpChecker {
    name: String,
    address: String,
}

impl TcpChecker {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

#[async_trait]
impl ReadinessChecker for TcpChecker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<(), CheckError> {
        TcpStream::connect(self.address.as_str())
            .await
            .map(drop)
            .map_err(|e| CheckError::Failed(format!("connect to {} failed: {e}", self.address)))
    }
}
