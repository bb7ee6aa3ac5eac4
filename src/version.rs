//! Build metadata injected at compile time.
//!
//! The release pipeline sets these environment variables when invoking cargo:
//!
//! ```text
//! BUILD_VERSION=0.1.0 BUILD_COMMIT=abc1234 BUILD_DATE=2025-10-05T12:34:56Z cargo build --release
//! ```
//!
//! Local builds without them report version `"dev"` and empty commit/date.

use serde::Serialize;
use utoipa::ToSchema;

/// Version reported when no `BUILD_VERSION` was supplied at build time.
pub const DEFAULT_VERSION: &str = "dev";

/// Immutable build metadata, resolved once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BuildInfo {
    /// Semantic version of the binary.
    #[schema(example = "1.0.0")]
    pub version: String,
    /// Git SHA the binary was built from.
    #[schema(example = "abc1234")]
    pub commit: String,
    /// RFC 3339 build timestamp.
    #[schema(example = "2025-08-25T12:34:56Z")]
    pub build_date: String,
}

impl BuildInfo {
    pub fn new(
        version: impl Into<String>,
        commit: impl Into<String>,
        build_date: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            commit: commit.into(),
            build_date: build_date.into(),
        }
    }

    /// Metadata baked into this binary by the build environment.
    pub fn from_build_env() -> Self {
        Self::new(
            option_env!("BUILD_VERSION")
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_VERSION),
            option_env!("BUILD_COMMIT").unwrap_or_default(),
            option_env!("BUILD_DATE").unwrap_or_default(),
        )
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION, "", "")
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.version)?;
        if !self.commit.is_empty() {
            write!(f, " ({})", self.commit)?;
        }
        if !self.build_date.is_empty() {
            write!(f, " built {}", self.build_date)?;
        }
        Ok(())
    }
}
