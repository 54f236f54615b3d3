//! Router settings, environment loading and validation.
//!
//! These are pure domain types: reading the process environment goes through
//! a lookup closure so callers (and tests) decide where values come from.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Operation;

/// Default public base URL of the serverless queue API.
pub const DEFAULT_QUEUE_BASE_URL: &str = "https://api.runpod.ai/v2";

/// Environment variable names.
pub mod env {
    pub const HOME_URL: &str = "HOME_GPU_URL";
    pub const HOME_COOLDOWN_SECS: &str = "HOME_GPU_COOLDOWN_SECS";
    pub const QUEUE_API_KEY: &str = "RUNPOD_API_KEY";
    pub const QUEUE_ENDPOINT_ID: &str = "RUNPOD_ENDPOINT_ID";
    pub const QUEUE_BASE_URL: &str = "RUNPOD_BASE_URL";
}

/// Per-call bounds for every outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    pub health: Duration,
    pub wake: Duration,
    pub preprocess: Duration,
    pub generate: Duration,
    pub queue_submit: Duration,
    pub queue_status: Duration,
    /// Longest silence tolerated between two frames of a Home stream.
    pub stream_idle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(3),
            wake: Duration::from_secs(5),
            preprocess: Duration::from_secs(30),
            generate: Duration::from_secs(120),
            queue_submit: Duration::from_secs(30),
            queue_status: Duration::from_secs(10),
            stream_idle: Duration::from_secs(120),
        }
    }
}

/// Wall-clock ceilings for driving a queue job to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCeilings {
    pub preprocess: Duration,
    pub generate: Duration,
    pub wake: Duration,
}

impl Default for PollCeilings {
    fn default() -> Self {
        Self {
            preprocess: Duration::from_secs(60),
            generate: Duration::from_secs(300),
            wake: Duration::from_secs(30),
        }
    }
}

impl PollCeilings {
    /// Ceiling for a given operation.
    #[must_use]
    pub const fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Preprocess => self.preprocess,
            Operation::Generate => self.generate,
            Operation::Wake => self.wake,
        }
    }
}

/// Credentials and location of the job queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    pub api_key: String,
    pub endpoint_id: String,
    pub base_url: String,
}

impl QueueSettings {
    /// Settings for the default public queue API.
    pub fn new(api_key: impl Into<String>, endpoint_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint_id: endpoint_id.into(),
            base_url: DEFAULT_QUEUE_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (tests, self-hosted gateways).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint_url(&self, action: &str) -> String {
        format!(
            "{}/{}/{action}",
            self.base_url.trim_end_matches('/'),
            self.endpoint_id
        )
    }

    /// `POST` target for submissions.
    #[must_use]
    pub fn run_url(&self) -> String {
        self.endpoint_url("run")
    }

    /// Prefix for `GET {status_url}/{id}`.
    #[must_use]
    pub fn status_url(&self) -> String {
        self.endpoint_url("status")
    }

    /// Prefix for `POST {cancel_url}/{id}`.
    #[must_use]
    pub fn cancel_url(&self) -> String {
        self.endpoint_url("cancel")
    }
}

/// Complete router configuration.
///
/// A missing `home_url` disables the Home path entirely; a missing `queue`
/// leaves the router without a fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSettings {
    pub home_url: Option<String>,
    pub queue: Option<QueueSettings>,
    pub timeouts: Timeouts,
    pub ceilings: PollCeilings,
    /// How long to skip Home after a failed call. Zero re-checks every call.
    pub home_cooldown: Duration,
}

impl RouterSettings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary lookup.
    ///
    /// Blank values count as unset. The queue is configured only when both
    /// the key and the endpoint id are present.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let home_url = get(env::HOME_URL).map(|url| normalize_url(&url));

        let queue = match (get(env::QUEUE_API_KEY), get(env::QUEUE_ENDPOINT_ID)) {
            (Some(key), Some(endpoint)) => {
                let mut queue = QueueSettings::new(key, endpoint);
                if let Some(base) = get(env::QUEUE_BASE_URL) {
                    queue = queue.with_base_url(normalize_url(&base));
                }
                Some(queue)
            }
            _ => None,
        };

        let home_cooldown = match get(env::HOME_COOLDOWN_SECS) {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .map_err(|_| SettingsError::InvalidNumber {
                        key: env::HOME_COOLDOWN_SECS,
                        value: raw.clone(),
                    })?,
            ),
            None => Duration::ZERO,
        };

        let settings = Self {
            home_url,
            queue,
            home_cooldown,
            ..Self::default()
        };
        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Whether a Home worker is configured.
    #[must_use]
    pub const fn home_enabled(&self) -> bool {
        self.home_url.is_some()
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Home GPU URL must start with http:// or https://, got '{0}'")]
    InvalidHomeUrl(String),

    #[error("Queue API key cannot be empty")]
    EmptyApiKey,

    #[error("Queue endpoint id cannot be empty")]
    EmptyEndpointId,

    #[error("Queue base URL must start with http:// or https://, got '{0}'")]
    InvalidQueueUrl(String),

    #[error("Timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("{key} must be a whole number of seconds, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate a settings value.
pub fn validate_settings(settings: &RouterSettings) -> Result<(), SettingsError> {
    if let Some(ref url) = settings.home_url {
        if !is_http_url(url) {
            return Err(SettingsError::InvalidHomeUrl(url.clone()));
        }
    }

    if let Some(ref queue) = settings.queue {
        if queue.api_key.trim().is_empty() {
            return Err(SettingsError::EmptyApiKey);
        }
        if queue.endpoint_id.trim().is_empty() {
            return Err(SettingsError::EmptyEndpointId);
        }
        if !is_http_url(&queue.base_url) {
            return Err(SettingsError::InvalidQueueUrl(queue.base_url.clone()));
        }
    }

    let t = &settings.timeouts;
    let bounds = [
        ("health", t.health),
        ("wake", t.wake),
        ("preprocess", t.preprocess),
        ("generate", t.generate),
        ("queue_submit", t.queue_submit),
        ("queue_status", t.queue_status),
        ("stream_idle", t.stream_idle),
    ];
    if let Some((name, _)) = bounds.iter().find(|(_, d)| d.is_zero()) {
        return Err(SettingsError::ZeroTimeout(*name));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = RouterSettings::from_lookup(lookup(&[])).unwrap();
        assert!(settings.home_url.is_none());
        assert!(settings.queue.is_none());
        assert_eq!(settings.timeouts.health, Duration::from_secs(3));
        assert_eq!(settings.timeouts.generate, Duration::from_secs(120));
        assert_eq!(settings.ceilings.generate, Duration::from_secs(300));
        assert_eq!(settings.ceilings.preprocess, Duration::from_secs(60));
        assert_eq!(settings.home_cooldown, Duration::ZERO);
    }

    #[test]
    fn test_full_environment() {
        let settings = RouterSettings::from_lookup(lookup(&[
            (env::HOME_URL, "http://100.64.1.2:8001/"),
            (env::QUEUE_API_KEY, "secret"),
            (env::QUEUE_ENDPOINT_ID, "abc123"),
            (env::HOME_COOLDOWN_SECS, "15"),
        ]))
        .unwrap();

        assert_eq!(settings.home_url.as_deref(), Some("http://100.64.1.2:8001"));
        assert!(settings.home_enabled());
        assert_eq!(settings.home_cooldown, Duration::from_secs(15));

        let queue = settings.queue.unwrap();
        assert_eq!(queue.run_url(), "https://api.runpod.ai/v2/abc123/run");
        assert_eq!(queue.status_url(), "https://api.runpod.ai/v2/abc123/status");
        assert_eq!(queue.cancel_url(), "https://api.runpod.ai/v2/abc123/cancel");
    }

    #[test]
    fn test_queue_requires_both_values() {
        let settings =
            RouterSettings::from_lookup(lookup(&[(env::QUEUE_API_KEY, "secret")])).unwrap();
        assert!(settings.queue.is_none());

        let settings =
            RouterSettings::from_lookup(lookup(&[(env::QUEUE_ENDPOINT_ID, "  ")])).unwrap();
        assert!(settings.queue.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let err = RouterSettings::from_lookup(lookup(&[(env::HOME_URL, "100.64.1.2:8001")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidHomeUrl(_)));

        let err = RouterSettings::from_lookup(lookup(&[(env::HOME_COOLDOWN_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidNumber { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut settings = RouterSettings::default();
        settings.timeouts.queue_status = Duration::ZERO;
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::ZeroTimeout("queue_status"))
        );
    }

    #[test]
    fn test_ceiling_per_operation() {
        let ceilings = PollCeilings::default();
        assert_eq!(ceilings.for_operation(Operation::Generate), Duration::from_secs(300));
        assert_eq!(ceilings.for_operation(Operation::Preprocess), Duration::from_secs(60));
    }
}
