//! Home worker health types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the Home worker's `GET /health` response.
///
/// Missing fields default to `false`. A body without `gpu_available` never
/// reads as ready; a missing `gpu_busy` counts as not busy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeHealthReport {
    /// A GPU is present and usable.
    #[serde(default)]
    pub gpu_available: bool,
    /// The GPU is currently running another job.
    #[serde(default)]
    pub gpu_busy: bool,
}

impl HomeHealthReport {
    /// Present and idle. Present-but-busy counts as unavailable.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.gpu_available && !self.gpu_busy
    }
}

/// Outcome of one health check against the Home worker.
///
/// Recomputed on every check; carries no identity beyond its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Whether Home may be used for the next dispatch.
    pub available: bool,
    /// When this verdict was produced.
    pub checked_at: DateTime<Utc>,
    /// Why Home is unavailable, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HealthStatus {
    /// A positive verdict stamped now.
    #[must_use]
    pub fn available() -> Self {
        Self {
            available: true,
            checked_at: Utc::now(),
            reason: None,
        }
    }

    /// A negative verdict stamped now.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            checked_at: Utc::now(),
            reason: Some(reason.into()),
        }
    }

    /// Derive a verdict from a probe response.
    #[must_use]
    pub fn from_report(report: HomeHealthReport) -> Self {
        if report.is_ready() {
            Self::available()
        } else if report.gpu_available {
            Self::unavailable("gpu busy")
        } else {
            Self::unavailable("gpu not available")
        }
    }
}
