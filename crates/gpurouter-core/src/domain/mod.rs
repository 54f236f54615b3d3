//! Domain types shared by every adapter.
//!
//! These are plain data: no I/O, no runtime, no clocks beyond timestamps.

mod health;
mod job;
mod provider;
mod request;
mod stats;
mod stream;

pub use health::{HealthStatus, HomeHealthReport};
pub use job::{
    FailureOrigin, JobCompletion, JobFailure, JobHandle, JobStatus, JobUpdate, RemoteJobSnapshot,
    RemoteJobState, UNKNOWN_REMOTE_ERROR,
};
pub use provider::ProviderKind;
pub use request::{GenerateRequest, Operation, PreprocessRequest, queue_input, wake_input};
pub use stats::{RouterStats, StatsReport};
pub use stream::{LineSegment, StreamEvent};
