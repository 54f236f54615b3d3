//! reqwest adapters for the two backends.
//!
//! Both adapters implement the core ports; nothing outside this module sees
//! a `reqwest` type.

mod home;
pub mod lines;
mod queue;

use std::time::Duration;

use gpurouter_core::BackendError;

pub use home::HomeHttpClient;
pub use queue::QueueHttpClient;

/// Build the shared client. Per-call timeouts are set on each request.
fn build_client() -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| BackendError::Transport(format!("failed to create HTTP client: {e}")))
}

/// Map a reqwest failure to the port error, given the bound that applied.
fn map_reqwest_error(err: &reqwest::Error, bound: Duration) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(bound)
    } else if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

/// Reject non-success responses. 503 means the worker is busy.
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
        return Err(BackendError::Busy);
    }
    Err(BackendError::Status {
        status: status.as_u16(),
    })
}
