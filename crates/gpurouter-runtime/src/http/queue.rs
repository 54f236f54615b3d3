//! HTTP adapter for the serverless job queue.
//!
//! # Protocol
//!
//! - `POST {base}/{endpoint}/run` with `{"input": {...}}` returns `{"id": ...}`
//! - `GET {base}/{endpoint}/status/{id}` returns a [`RemoteJobSnapshot`]
//! - `POST {base}/{endpoint}/cancel/{id}` stops a job
//!
//! Every call carries `Authorization: Bearer {api_key}`.

use std::time::Duration;

use async_trait::async_trait;
use gpurouter_core::{
    BackendError, JobHandle, Operation, QueueBackendPort, QueueSettings, RemoteJobSnapshot,
    Timeouts,
};
use serde_json::{Value, json};
use tracing::debug;

use super::{build_client, check_status, map_reqwest_error};

/// Job queue client.
pub struct QueueHttpClient {
    client: reqwest::Client,
    settings: QueueSettings,
    timeouts: Timeouts,
}

impl QueueHttpClient {
    pub fn new(settings: QueueSettings, timeouts: Timeouts) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client()?,
            settings,
            timeouts,
        })
    }

    const fn submit_bound(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Wake => self.timeouts.wake,
            Operation::Preprocess | Operation::Generate => self.timeouts.queue_submit,
        }
    }
}

/// The `error` text of a queue response body, if any.
fn error_text(body: &Value) -> Option<String> {
    body.get("error").map(|e| match e {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[async_trait]
impl QueueBackendPort for QueueHttpClient {
    async fn submit(&self, operation: Operation, input: Value) -> Result<JobHandle, BackendError> {
        let bound = self.submit_bound(operation);
        let response = self
            .client
            .post(self.settings.run_url())
            .bearer_auth(&self.settings.api_key)
            .timeout(bound)
            .json(&json!({ "input": input }))
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, bound))?;

        let status = response.status();
        // Rejections come back as JSON too; keep the remote reason when present.
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(error_text(&body).map_or(
                BackendError::Status {
                    status: status.as_u16(),
                },
                BackendError::Rejected,
            ));
        }

        match body.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => {
                debug!(job_id = %id, %operation, "Queue accepted job");
                Ok(JobHandle::new(id, operation))
            }
            _ => Err(BackendError::Rejected(
                error_text(&body).unwrap_or_else(|| "response carried no job id".to_string()),
            )),
        }
    }

    async fn status(&self, job_id: &str) -> Result<RemoteJobSnapshot, BackendError> {
        let bound = self.timeouts.queue_status;
        let response = self
            .client
            .get(format!("{}/{job_id}", self.settings.status_url()))
            .bearer_auth(&self.settings.api_key)
            .timeout(bound)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, bound))?;

        check_status(response)?
            .json::<RemoteJobSnapshot>()
            .await
            .map_err(|e| map_reqwest_error(&e, bound))
    }

    async fn cancel(&self, job_id: &str) -> Result<(), BackendError> {
        let bound = self.timeouts.queue_status;
        let response = self
            .client
            .post(format!("{}/{job_id}", self.settings.cancel_url()))
            .bearer_auth(&self.settings.api_key)
            .timeout(bound)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, bound))?;

        check_status(response)?;
        debug!(job_id, "Queue cancel acknowledged");
        Ok(())
    }
}
