//! Port for the privately reachable Home worker.
//!
//! The Home worker is synchronous: a successful call returns the final
//! result, and generation can additionally be streamed line by line.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde_json::Value;

use super::BackendError;
use crate::domain::{GenerateRequest, HomeHealthReport, PreprocessRequest};

/// Raw frames of a Home event feed, one JSON document per item, in order.
///
/// Framing (newlines, `data:` prefixes) is already stripped; decoding into
/// `StreamEvent`s is the relay's job.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

/// Calls the Home worker can serve.
///
/// Implementations bound every call with a timeout so a hung worker cannot
/// hang the router; a timeout surfaces as [`BackendError::Timeout`].
#[async_trait]
pub trait HomeBackendPort: Send + Sync {
    /// Probe `GET /health`. One request, no retries.
    async fn health(&self) -> Result<HomeHealthReport, BackendError>;

    /// Run preprocessing synchronously.
    async fn preprocess(&self, request: &PreprocessRequest) -> Result<Value, BackendError>;

    /// Run generation synchronously and return the final result.
    async fn generate(&self, request: &GenerateRequest) -> Result<Value, BackendError>;

    /// Start a streamed generation and hand back the live frame feed.
    ///
    /// Errors returned here happen before any frame was produced.
    async fn generate_stream(&self, request: &GenerateRequest) -> Result<FrameStream, BackendError>;
}
