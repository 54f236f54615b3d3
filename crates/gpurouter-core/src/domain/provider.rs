//! Backend identity carried through every routed result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which backend served (or is serving) a request.
///
/// Callers branch on this: `Home` results are final, `Queue` results
/// are pending job handles that must be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Privately reachable worker: synchronous, can stream.
    Home,
    /// Remote serverless job queue: asynchronous, polled.
    Queue,
}

impl ProviderKind {
    /// Stable lowercase name used in logs and wire payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Queue => "queue",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
