//! Operation requests accepted by the router.
//!
//! Image payloads are opaque encoded blobs: the router never decodes them,
//! it only forwards them to whichever backend is chosen.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Remote operation names, shared by both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Warm the per-image cache ahead of generation.
    Preprocess,
    /// Produce the line sequence.
    Generate,
    /// Lightweight job used only to wake a cold queue worker.
    #[serde(rename = "health")]
    Wake,
}

impl Operation {
    /// The `endpoint` value the queue worker dispatches on.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Preprocess => "preprocess",
            Self::Generate => "generate",
            Self::Wake => "health",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Preprocess an image so a later generation can start from cached data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessRequest {
    /// Encoded image, passed through untouched.
    #[serde(rename = "imageData")]
    pub image_data: String,
    /// Number of nails around the frame.
    pub num_nails: u32,
    /// Working resolution in pixels.
    pub image_resolution: u32,
}

/// Generate a line sequence for an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Encoded image, passed through untouched.
    #[serde(rename = "imageData")]
    pub image_data: String,
    /// Free-form generation parameters forwarded to the worker.
    pub params: Value,
}

/// Build the `input` object for a queue submission.
///
/// The queue worker multiplexes operations on the `endpoint` field, so the
/// request body is flattened next to it.
pub fn queue_input<T: Serialize>(operation: Operation, request: &T) -> Value {
    let mut input = match serde_json::to_value(request) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    input.insert(
        "endpoint".to_string(),
        Value::String(operation.endpoint().to_string()),
    );
    Value::Object(input)
}

/// Input for a wake job: only the endpoint name.
#[must_use]
pub fn wake_input() -> Value {
    let mut input = Map::new();
    input.insert(
        "endpoint".to_string(),
        Value::String(Operation::Wake.endpoint().to_string()),
    );
    Value::Object(input)
}
