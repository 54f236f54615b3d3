//! Port for the remote asynchronous job queue.

use async_trait::async_trait;
use serde_json::Value;

use super::BackendError;
use crate::domain::{JobHandle, Operation, RemoteJobSnapshot};

/// Submit/status/cancel calls against the job queue.
///
/// Submission only enqueues work; completion is observed by polling
/// [`status`](Self::status) until a terminal state.
#[async_trait]
pub trait QueueBackendPort: Send + Sync {
    /// Enqueue a job. `input` becomes the body's `input` object.
    ///
    /// A response without a job id is a [`BackendError::Rejected`].
    async fn submit(&self, operation: Operation, input: Value) -> Result<JobHandle, BackendError>;

    /// Fetch the current remote state of a job.
    async fn status(&self, job_id: &str) -> Result<RemoteJobSnapshot, BackendError>;

    /// Ask the queue to stop a job. Best effort.
    async fn cancel(&self, job_id: &str) -> Result<(), BackendError>;
}
