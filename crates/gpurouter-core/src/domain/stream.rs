//! Live generation events produced by the Home worker's streaming endpoint.
//!
//! # Wire Format
//!
//! One JSON object per line, discriminated by `type`:
//!
//! ```json
//! {"type": "new_line", "start": 12, "end": 187}
//! {"type": "new_lines_batch", "lines": [[187, 40], {"start": 40, "end": 3}]}
//! {"type": "progress", "current": 250, "total": 3000, "percent": 8.3}
//! {"type": "error", "message": "thermal throttling"}
//! {"type": "final_sequence", "sequence": [12, 187, 40, 3], "elapsed": 14.2}
//! ```
//!
//! The `final_sequence` payload is every field except `type`, kept verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single chord between two nails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SegmentRepr")]
pub struct LineSegment {
    pub start: u32,
    pub end: u32,
}

/// Workers send segments either as `[start, end]` pairs or as objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentRepr {
    Pair(u32, u32),
    Object { start: u32, end: u32 },
}

impl From<SegmentRepr> for LineSegment {
    fn from(repr: SegmentRepr) -> Self {
        match repr {
            SegmentRepr::Pair(start, end) | SegmentRepr::Object { start, end } => {
                Self { start, end }
            }
        }
    }
}

/// Event relayed to a session, identical whichever provider produced it.
///
/// Line events must reach the session in emission order; progress and
/// error events are independent of line ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    NewLine {
        start: u32,
        end: u32,
    },
    #[serde(rename = "new_lines_batch")]
    NewLineBatch {
        lines: Vec<LineSegment>,
    },
    Progress {
        #[serde(default)]
        current: u64,
        #[serde(default)]
        total: u64,
        #[serde(default)]
        percent: f64,
    },
    Error {
        message: String,
    },
    FinalSequence {
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
}

impl StreamEvent {
    /// Decode one frame of the Home feed.
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// Whether this event terminates a successful stream.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::FinalSequence { .. })
    }

    /// Wire name of the event, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NewLine { .. } => "new_line",
            Self::NewLineBatch { .. } => "new_lines_batch",
            Self::Progress { .. } => "progress",
            Self::Error { .. } => "error",
            Self::FinalSequence { .. } => "final_sequence",
        }
    }
}
