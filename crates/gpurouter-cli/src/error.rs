//! CLI-specific error types and mappings.
//!
//! Maps settings, routing and job outcomes to exit codes and user-facing
//! messages.

use gpurouter_core::{JobFailure, SettingsError};
use gpurouter_runtime::{RelayError, RouterError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No backend could take the request.
    #[error("{0}")]
    Unavailable(String),

    /// The job ran and failed.
    #[error("GPU job failed: {0}")]
    JobFailed(String),

    /// The job did not finish within its ceiling.
    #[error("GPU job timed out after {0:.1}s")]
    JobTimedOut(f64),

    /// Interrupted by the user.
    #[error("Cancelled")]
    Cancelled,
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    /// - 130: Interrupted (128 + SIGINT)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::JobFailed(_) => 1,
            Self::Arguments(_) => 2,   // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,          // EX_IOERR
            Self::JobTimedOut(_) => 75, // EX_TEMPFAIL
            Self::Config(_) => 78,      // EX_CONFIG
            Self::Cancelled => 130,
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<RouterError> for CliError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::Configuration(msg) => Self::Config(msg),
            RouterError::Stream(RelayError::Cancelled { .. }) => Self::Cancelled,
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<JobFailure> for CliError {
    fn from(failure: JobFailure) -> Self {
        Self::JobFailed(failure.message)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpurouter_core::{BackendError, FailureOrigin};

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Arguments(String::new()).exit_code(), 2);
        assert_eq!(CliError::Config(String::new()).exit_code(), 78);
        assert_eq!(CliError::JobTimedOut(300.0).exit_code(), 75);
        assert_eq!(CliError::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_router_error_mapping() {
        let err: CliError = RouterError::Configuration("no queue".to_string()).into();
        assert!(matches!(err, CliError::Config(_)));

        let err: CliError = RouterError::Queue(BackendError::Busy).into();
        assert_eq!(err.exit_code(), 69);

        let err: CliError = RouterError::Stream(RelayError::Cancelled { relayed: 3 }).into();
        assert!(matches!(err, CliError::Cancelled));
    }

    #[test]
    fn test_job_failure_keeps_message() {
        let err: CliError = JobFailure {
            origin: FailureOrigin::Output,
            message: "image too small".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "GPU job failed: image too small");
    }
}
