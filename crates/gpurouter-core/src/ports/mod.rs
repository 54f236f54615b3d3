//! Port definitions (trait abstractions) for the two backends.
//!
//! Ports define the interfaces the router expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` types in any signature
//! - Every failure is a [`BackendError`]; adapters map transport errors into it
//! - Timeouts are enforced by the adapter and reported as `Timeout`

mod home_backend;
mod job_observer;
mod queue_backend;

use std::time::Duration;

use thiserror::Error;

pub use home_backend::{FrameStream, HomeBackendPort};
pub use job_observer::{JobObserver, NoopJobObserver};
pub use queue_backend::QueueBackendPort;

/// Errors a backend adapter can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The worker answered 503: it is alive but already running a job.
    #[error("Backend is busy")]
    Busy,

    /// The worker answered with a non-success status.
    #[error("Backend returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The call did not complete within its bound.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure (refused, reset, DNS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The queue refused a submission.
    #[error("Submission rejected: {0}")]
    Rejected(String),
}

impl BackendError {
    /// True when the failure says nothing about the job itself, only about
    /// reaching the backend.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Transport(_))
    }
}
