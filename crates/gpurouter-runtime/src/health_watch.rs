//! Continuous Home health watching.
//!
//! Policy-free: the watcher only probes and reports availability flips. What
//! to do about them is the caller's business.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures_core::Stream;
use gpurouter_core::HealthStatus;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::health::HealthMonitor;

/// Probes Home on an interval and yields whenever availability changes.
pub struct HealthWatcher {
    monitor: Arc<HealthMonitor>,
    interval: Duration,
    cancel_token: CancellationToken,
}

impl HealthWatcher {
    /// Create a watcher.
    ///
    /// # Arguments
    ///
    /// * `monitor` - Monitor that performs each probe
    /// * `check_interval` - How often to probe (e.g., 10 seconds)
    /// * `cancel_token` - Token to signal watcher shutdown
    pub fn new(
        monitor: Arc<HealthMonitor>,
        check_interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            monitor,
            interval: check_interval,
            cancel_token,
        }
    }

    /// Start watching.
    ///
    /// The first probe is always yielded; after that only changes of the
    /// `available` flag are. Completes when the token is cancelled.
    pub fn watch(self) -> impl Stream<Item = HealthStatus> {
        let monitor = self.monitor;
        let cancel_token = self.cancel_token;
        let check_interval = self.interval;

        stream! {
            let mut ticker = interval(check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut last_available: Option<bool> = None;
            debug!(interval = ?check_interval, "Starting Home health watcher");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let status = monitor.check().await;
                        if last_available != Some(status.available) {
                            debug!(
                                available = status.available,
                                ?last_available,
                                "Home availability changed"
                            );
                            last_available = Some(status.available);
                            yield status;
                        }
                    }
                    () = cancel_token.cancelled() => {
                        debug!("Home health watcher cancelled");
                        break;
                    }
                }
            }
        }
    }
}
