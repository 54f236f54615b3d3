#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    FailureOrigin, GenerateRequest, HealthStatus, HomeHealthReport, JobCompletion, JobFailure,
    JobHandle, JobStatus, JobUpdate, LineSegment, Operation, PreprocessRequest, ProviderKind,
    RemoteJobSnapshot, RemoteJobState, RouterStats, StatsReport, StreamEvent,
};
pub use ports::{
    BackendError, FrameStream, HomeBackendPort, JobObserver, NoopJobObserver, QueueBackendPort,
};
pub use settings::{
    PollCeilings, QueueSettings, RouterSettings, SettingsError, Timeouts, validate_settings,
};
