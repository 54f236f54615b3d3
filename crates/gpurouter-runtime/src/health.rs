//! Home worker health checking.
//!
//! The monitor answers one question: may the next dispatch use Home? It
//! fails closed, so any error, timeout or unexpected body reads as "no".

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use gpurouter_core::{HealthStatus, HomeBackendPort};
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct MonitorState {
    last: Option<HealthStatus>,
    cooldown_until: Option<Instant>,
    /// Bumped by every `mark_failed`.
    failures: u64,
}

/// Single-shot health checks against the Home worker.
///
/// Every probe produces a fresh [`HealthStatus`]; the last one is kept for
/// reporting and never short-circuits a later check. A failure recorded
/// while a probe is in flight supersedes that probe's verdict.
pub struct HealthMonitor {
    home: Option<Arc<dyn HomeBackendPort>>,
    probe_timeout: Duration,
    cooldown: Duration,
    state: Mutex<MonitorState>,
}

impl HealthMonitor {
    /// Create a monitor. `home = None` means Home is not configured.
    pub fn new(
        home: Option<Arc<dyn HomeBackendPort>>,
        probe_timeout: Duration,
        cooldown: Duration,
    ) -> Self {
        Self {
            home,
            probe_timeout,
            cooldown,
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Whether a Home worker is configured at all.
    pub fn is_enabled(&self) -> bool {
        self.home.is_some()
    }

    /// Probe Home once and return the verdict.
    ///
    /// Unconfigured Home is reported unavailable without any I/O. During a
    /// cooldown window the probe is skipped as well.
    pub async fn check(&self) -> HealthStatus {
        let Some(home) = &self.home else {
            return HealthStatus::unavailable("home gpu not configured");
        };

        let generation = {
            let state = self.lock();
            if state.cooldown_until.is_some_and(|until| Instant::now() < until) {
                debug!("Home GPU in cooldown, skipping probe");
                return HealthStatus::unavailable("cooling down after failure");
            }
            state.failures
        };

        let verdict = match tokio::time::timeout(self.probe_timeout, home.health()).await {
            Ok(Ok(report)) => HealthStatus::from_report(report),
            Ok(Err(e)) => HealthStatus::unavailable(e.to_string()),
            Err(_) => HealthStatus::unavailable(format!(
                "health probe timed out after {:?}",
                self.probe_timeout
            )),
        };

        debug!(
            available = verdict.available,
            reason = verdict.reason.as_deref().unwrap_or(""),
            "Home health checked"
        );

        let mut state = self.lock();
        if state.failures != generation {
            // A dispatch failed while the probe was in flight; the failure wins.
            debug!("Discarding health verdict superseded by a failure");
            return state
                .last
                .clone()
                .unwrap_or_else(|| HealthStatus::unavailable("home gpu marked failed"));
        }
        if state
            .cooldown_until
            .is_some_and(|until| Instant::now() >= until)
        {
            state.cooldown_until = None;
        }
        state.last = Some(verdict.clone());
        verdict
    }

    /// Convenience form of [`check`](Self::check).
    pub async fn is_available(&self) -> bool {
        self.check().await.available
    }

    /// Record that a dispatched Home call failed.
    ///
    /// Depresses the reported verdict and, with a non-zero cooldown, keeps
    /// the router off Home until the window elapses.
    pub fn mark_failed(&self, reason: &str) {
        let mut state = self.lock();
        state.failures += 1;
        state.last = Some(HealthStatus::unavailable(reason));
        if !self.cooldown.is_zero() {
            state.cooldown_until = Some(Instant::now() + self.cooldown);
            info!(cooldown = ?self.cooldown, "Home GPU marked failed, cooling down");
        }
    }

    /// Last verdict produced, if any check has run.
    pub fn last_status(&self) -> Option<HealthStatus> {
        self.lock().last.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gpurouter_core::{
        BackendError, FrameStream, GenerateRequest, HomeHealthReport, PreprocessRequest,
    };
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    enum Probe {
        Report(HomeHealthReport),
        Fail(BackendError),
        Hang,
        Gated(HomeHealthReport, Arc<Notify>),
    }

    struct FakeHome {
        probe: Probe,
        probes: AtomicU32,
    }

    impl FakeHome {
        fn new(probe: Probe) -> Arc<Self> {
            Arc::new(Self {
                probe,
                probes: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl HomeBackendPort for FakeHome {
        async fn health(&self) -> Result<HomeHealthReport, BackendError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            match &self.probe {
                Probe::Report(r) => Ok(*r),
                Probe::Fail(e) => Err(e.clone()),
                Probe::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(HomeHealthReport::default())
                }
                Probe::Gated(report, gate) => {
                    gate.notified().await;
                    Ok(*report)
                }
            }
        }
        async fn preprocess(&self, _: &PreprocessRequest) -> Result<Value, BackendError> {
            unreachable!()
        }
        async fn generate(&self, _: &GenerateRequest) -> Result<Value, BackendError> {
            unreachable!()
        }
        async fn generate_stream(&self, _: &GenerateRequest) -> Result<FrameStream, BackendError> {
            unreachable!()
        }
    }

    fn monitor(home: &Arc<FakeHome>, cooldown: Duration) -> HealthMonitor {
        HealthMonitor::new(
            Some(Arc::clone(home) as Arc<dyn HomeBackendPort>),
            Duration::from_secs(3),
            cooldown,
        )
    }

    #[tokio::test]
    async fn test_ready_gpu_is_available() {
        let home = FakeHome::new(Probe::Report(HomeHealthReport {
            gpu_available: true,
            gpu_busy: false,
        }));
        let monitor = monitor(&home, Duration::ZERO);

        assert!(monitor.is_available().await);
        assert!(monitor.last_status().unwrap().available);
    }

    #[tokio::test]
    async fn test_negative_verdicts() {
        let cases = [
            Probe::Report(HomeHealthReport {
                gpu_available: true,
                gpu_busy: true,
            }),
            Probe::Report(HomeHealthReport::default()),
            Probe::Fail(BackendError::Status { status: 500 }),
            Probe::Fail(BackendError::Transport("refused".to_string())),
        ];
        for probe in cases {
            let home = FakeHome::new(probe);
            assert!(!monitor(&home, Duration::ZERO).is_available().await);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_fails_closed() {
        let home = FakeHome::new(Probe::Hang);
        let status = monitor(&home, Duration::ZERO).check().await;
        assert!(!status.available);
        assert!(status.reason.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unconfigured_home_never_probes() {
        let monitor = HealthMonitor::new(None, Duration::from_secs(3), Duration::ZERO);
        assert!(!monitor.is_enabled());
        assert!(!monitor.is_available().await);
        assert!(monitor.last_status().is_none());
    }

    #[tokio::test]
    async fn test_every_check_probes_again() {
        let home = FakeHome::new(Probe::Report(HomeHealthReport {
            gpu_available: true,
            gpu_busy: false,
        }));
        let monitor = monitor(&home, Duration::ZERO);
        monitor.check().await;
        monitor.mark_failed("boom");
        assert!(!monitor.last_status().unwrap().available);

        assert!(monitor.is_available().await);
        assert_eq!(home.probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_skips_probe_until_elapsed() {
        let home = FakeHome::new(Probe::Report(HomeHealthReport {
            gpu_available: true,
            gpu_busy: false,
        }));
        let monitor = monitor(&home, Duration::from_secs(30));
        monitor.mark_failed("connection reset");

        assert!(!monitor.is_available().await);
        assert_eq!(home.probes.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(monitor.is_available().await);
        assert_eq!(home.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_during_probe_keeps_cooldown() {
        let gate = Arc::new(Notify::new());
        let home = FakeHome::new(Probe::Gated(
            HomeHealthReport {
                gpu_available: true,
                gpu_busy: false,
            },
            Arc::clone(&gate),
        ));
        let monitor = monitor(&home, Duration::from_secs(60));

        let (status, ()) = tokio::join!(monitor.check(), async {
            while home.probes.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
            monitor.mark_failed("connection reset");
            gate.notify_one();
        });

        assert!(!status.available);
        assert_eq!(status.reason.as_deref(), Some("connection reset"));
        assert!(!monitor.last_status().unwrap().available);

        assert!(!monitor.is_available().await);
        assert_eq!(home.probes.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        gate.notify_one();
        assert!(monitor.is_available().await);
        assert_eq!(home.probes.load(Ordering::SeqCst), 2);
    }
}
