//! HTTP adapter for the Home worker.

use std::time::Duration;

use async_trait::async_trait;
use gpurouter_core::{
    BackendError, FrameStream, GenerateRequest, HomeBackendPort, HomeHealthReport,
    PreprocessRequest, Timeouts,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::lines::frames;
use super::{build_client, check_status, map_reqwest_error};

/// Home worker reached over plain HTTP on a private network.
pub struct HomeHttpClient {
    client: reqwest::Client,
    base_url: String,
    timeouts: Timeouts,
}

impl HomeHttpClient {
    /// Create a client for the worker at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>, timeouts: Timeouts) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeouts,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, bound: Duration) -> Result<T, BackendError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .timeout(bound)
            .json(body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, bound))?;

        check_status(response)?
            .json::<T>()
            .await
            .map_err(|e| map_reqwest_error(&e, bound))
    }
}

#[async_trait]
impl HomeBackendPort for HomeHttpClient {
    async fn health(&self) -> Result<HomeHealthReport, BackendError> {
        let bound = self.timeouts.health;
        let response = self
            .client
            .get(self.url("health"))
            .timeout(bound)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, bound))?;

        // A busy worker still answers health probes; only the body decides.
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }

        let report = response
            .json::<HomeHealthReport>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        debug!(base_url = %self.base_url, ?report, "Home health probe answered");
        Ok(report)
    }

    async fn preprocess(&self, request: &PreprocessRequest) -> Result<Value, BackendError> {
        self.post_json("preprocess", request, self.timeouts.preprocess)
            .await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Value, BackendError> {
        self.post_json("generate", request, self.timeouts.generate)
            .await
    }

    async fn generate_stream(&self, request: &GenerateRequest) -> Result<FrameStream, BackendError> {
        // Only the response head is bounded here; gaps between frames are
        // bounded by the relay's idle timeout.
        let bound = self.timeouts.generate;
        let send = self
            .client
            .post(self.url("generate_stream"))
            .header(reqwest::header::ACCEPT, "application/x-ndjson")
            .json(request)
            .send();

        let response = tokio::time::timeout(bound, send)
            .await
            .map_err(|_| BackendError::Timeout(bound))?
            .map_err(|e| map_reqwest_error(&e, bound))?;

        let response = check_status(response)?;
        debug!(base_url = %self.base_url, "Home event stream opened");
        Ok(frames(response.bytes_stream()))
    }
}
