//! Shared request counters.

use std::sync::atomic::{AtomicU64, Ordering};

use gpurouter_core::{ProviderKind, RouterStats};

/// Monotonic counters shared by every session of one router.
///
/// Only the router writes; anyone holding the collector may read.
#[derive(Debug, Default)]
pub struct StatsCollector {
    home_requests: AtomicU64,
    queue_requests: AtomicU64,
    home_failures: AtomicU64,
    queue_failures: AtomicU64,
    total_requests: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_total(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_request(&self, provider: ProviderKind) {
        match provider {
            ProviderKind::Home => &self.home_requests,
            ProviderKind::Queue => &self.queue_requests,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, provider: ProviderKind) {
        match provider {
            ProviderKind::Home => &self.home_failures,
            ProviderKind::Queue => &self.queue_failures,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters. Each value is read atomically; the set is not.
    pub fn snapshot(&self) -> RouterStats {
        RouterStats {
            home_requests: self.home_requests.load(Ordering::Relaxed),
            queue_requests: self.queue_requests.load(Ordering::Relaxed),
            home_failures: self.home_failures.load(Ordering::Relaxed),
            queue_failures: self.queue_failures.load(Ordering::Relaxed),
            total_requests: self.total_requests.load(Ordering::Relaxed),
        }
    }
}
