//! Queue job lifecycle types.
//!
//! A job moves `Submitted -> {Queued, Running}* -> terminal`, where the
//! terminal states are `Completed`, `Failed`, `TimedOut` and `Cancelled`.
//! Nothing leaves a terminal state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::Operation;

/// Fallback message when the remote side fails without saying why.
pub const UNKNOWN_REMOTE_ERROR: &str = "Unknown GPU error";

/// Handle to a job accepted by the queue backend.
///
/// Immutable once created; discarded after a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    /// Queue-assigned job id.
    pub id: String,
    /// Operation the job runs (selects the polling ceiling).
    pub operation: Operation,
    /// When the queue accepted the submission.
    pub submitted_at: DateTime<Utc>,
}

impl JobHandle {
    /// Create a handle stamped now.
    pub fn new(id: impl Into<String>, operation: Operation) -> Self {
        Self {
            id: id.into(),
            operation,
            submitted_at: Utc::now(),
        }
    }
}

/// State string reported by the queue's status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteJobState {
    InQueue,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
    #[serde(other)]
    Unknown,
}

/// One `GET /status/{id}` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteJobSnapshot {
    pub status: RemoteJobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoteJobSnapshot {
    /// Message embedded in the output, then the top-level error, then a default.
    fn failure_message(&self) -> String {
        self.output
            .as_ref()
            .and_then(|o| o.get("message"))
            .and_then(Value::as_str)
            .or(self.error.as_deref())
            .unwrap_or(UNKNOWN_REMOTE_ERROR)
            .to_string()
    }
}

/// Where a job failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureOrigin {
    /// The queue reported `FAILED` (or `CANCELLED`).
    Remote,
    /// The queue reported `COMPLETED` but the nested outcome was not a success.
    Output,
    /// The status call itself failed; polling was abandoned locally.
    Transport,
}

/// A failed job with the message callers should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub origin: FailureOrigin,
    pub message: String,
}

/// A successful job: the remote output untouched, plus polling metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCompletion {
    pub output: Value,
    pub poll_count: u32,
    pub elapsed: Duration,
}

/// Status of a queue job as seen by the polling engine.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed(JobCompletion),
    Failed(JobFailure),
    /// The polling ceiling was exceeded. The remote job is abandoned, not cancelled.
    TimedOut { elapsed: Duration },
    /// The session cancelled the job.
    Cancelled,
}

impl JobStatus {
    /// Derive a status from a remote snapshot.
    ///
    /// Returns `None` for states this client does not know; the engine keeps
    /// polling in that case.
    #[must_use]
    pub fn from_snapshot(
        snapshot: &RemoteJobSnapshot,
        poll_count: u32,
        elapsed: Duration,
    ) -> Option<Self> {
        let status = match snapshot.status {
            RemoteJobState::InQueue => Self::Queued,
            RemoteJobState::InProgress => Self::Running,
            RemoteJobState::Completed => match &snapshot.output {
                Some(output) if is_success(output) => Self::Completed(JobCompletion {
                    output: output.clone(),
                    poll_count,
                    elapsed,
                }),
                Some(_) => Self::Failed(JobFailure {
                    origin: FailureOrigin::Output,
                    message: snapshot.failure_message(),
                }),
                None => Self::Failed(JobFailure {
                    origin: FailureOrigin::Output,
                    message: "job completed without output".to_string(),
                }),
            },
            RemoteJobState::Failed => Self::Failed(JobFailure {
                origin: FailureOrigin::Remote,
                message: snapshot.failure_message(),
            }),
            RemoteJobState::Cancelled => Self::Failed(JobFailure {
                origin: FailureOrigin::Remote,
                message: "job was cancelled by the queue".to_string(),
            }),
            RemoteJobState::TimedOut => Self::TimedOut { elapsed },
            RemoteJobState::Unknown => return None,
        };
        Some(status)
    }

    /// No further polling happens once this is true.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Running)
    }

    /// True only for a completed job whose nested outcome succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
            Self::TimedOut { .. } => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

/// The queue conflates "finished" with "succeeded"; the worker's own
/// `status` field inside `output` is the real outcome.
fn is_success(output: &Value) -> bool {
    output.get("status").and_then(Value::as_str) == Some("success")
}

/// Progress report emitted after every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub job_id: String,
    pub poll_count: u32,
    pub elapsed: Duration,
    pub status: JobStatus,
}

impl JobUpdate {
    /// Coarse progress estimate for the UI.
    ///
    /// Queued jobs sit at 10%, running jobs creep from 15% by two points per
    /// second up to 90%, and terminal states report 100%.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        match self.status {
            JobStatus::Queued => 10.0,
            JobStatus::Running => self.elapsed.as_secs_f64().mul_add(2.0, 15.0).min(90.0),
            _ => 100.0,
        }
    }
}
