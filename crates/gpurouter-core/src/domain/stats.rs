//! Router statistics snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::provider::ProviderKind;

/// Point-in-time copy of the router's counters.
///
/// Counters only ever grow. Success rates are derived on read, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStats {
    pub home_requests: u64,
    pub queue_requests: u64,
    pub home_failures: u64,
    pub queue_failures: u64,
    pub total_requests: u64,
}

impl RouterStats {
    /// `(requests - failures) / requests` for one provider, in `[0, 1]`.
    ///
    /// A provider that has served nothing reports 0.
    #[must_use]
    pub fn success_rate(&self, provider: ProviderKind) -> f64 {
        let (requests, failures) = match provider {
            ProviderKind::Home => (self.home_requests, self.home_failures),
            ProviderKind::Queue => (self.queue_requests, self.queue_failures),
        };
        if requests == 0 {
            return 0.0;
        }
        requests.saturating_sub(failures) as f64 / requests as f64
    }

    #[must_use]
    pub fn home_success_rate(&self) -> f64 {
        self.success_rate(ProviderKind::Home)
    }

    #[must_use]
    pub fn queue_success_rate(&self) -> f64 {
        self.success_rate(ProviderKind::Queue)
    }
}

/// Stats as exposed to operators: counters, health state and rates in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub counters: RouterStats,
    pub home_enabled: bool,
    pub home_available: bool,
    pub last_health_check: Option<DateTime<Utc>>,
    pub home_success_rate: f64,
    pub queue_success_rate: f64,
}

impl StatsReport {
    /// Build a report from a snapshot and the monitor's last verdict.
    #[must_use]
    pub fn new(
        counters: RouterStats,
        home_enabled: bool,
        home_available: bool,
        last_health_check: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            counters,
            home_enabled,
            home_available,
            last_health_check,
            home_success_rate: counters.home_success_rate() * 100.0,
            queue_success_rate: counters.queue_success_rate() * 100.0,
        }
    }
}
