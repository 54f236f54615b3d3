//! Failover router: Home first, queue second.
//!
//! For every operation the router asks the [`HealthMonitor`] whether Home
//! may be used, tries it if so, and falls back to the queue on any Home
//! failure. Queue results are asynchronous: the caller gets a [`JobHandle`]
//! and drives it with [`FailoverRouter::await_job`].

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gpurouter_core::domain::{queue_input, wake_input};
use gpurouter_core::{
    BackendError, GenerateRequest, HomeBackendPort, JobHandle, JobObserver, JobStatus, Operation,
    PreprocessRequest, ProviderKind, QueueBackendPort, RouterSettings, StatsReport, StreamEvent,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::health::HealthMonitor;
use crate::http::{HomeHttpClient, QueueHttpClient};
use crate::polling::JobPollingEngine;
use crate::relay::{RelayError, StreamRelay};
use crate::stats::StatsCollector;

/// Errors surfaced by the router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Neither backend can take the request.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The queue refused or could not be reached.
    #[error("Queue submission failed: {0}")]
    Queue(#[source] BackendError),

    /// A Home stream broke after the session had already seen events.
    #[error("Home stream failed: {0}")]
    Stream(#[source] RelayError),
}

/// How a routed request is (or will be) satisfied.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Home answered synchronously.
    Completed(Value),
    /// The queue accepted a job; drive it with `await_job`.
    Pending(JobHandle),
}

/// Outcome of a routing decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub provider: ProviderKind,
    pub dispatch: Dispatch,
}

impl Routed {
    const fn home(result: Value) -> Self {
        Self {
            provider: ProviderKind::Home,
            dispatch: Dispatch::Completed(result),
        }
    }

    const fn queued(handle: JobHandle) -> Self {
        Self {
            provider: ProviderKind::Queue,
            dispatch: Dispatch::Pending(handle),
        }
    }

    /// Job handle when the request went to the queue.
    pub const fn job(&self) -> Option<&JobHandle> {
        match &self.dispatch {
            Dispatch::Pending(handle) => Some(handle),
            Dispatch::Completed(_) => None,
        }
    }

    /// Synchronous result when Home served the request.
    pub const fn result(&self) -> Option<&Value> {
        match &self.dispatch {
            Dispatch::Completed(value) => Some(value),
            Dispatch::Pending(_) => None,
        }
    }

    /// Whether a Home preprocess result says the image was already cached.
    pub fn cached(&self) -> bool {
        self.result()
            .and_then(|r| r.get("cached"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Result of a wake request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    /// Home is healthy; nothing to wake.
    HomeReady,
    /// A lightweight job was queued to bring a worker up.
    QueueWaking { job_id: String },
    /// Nothing could be woken.
    Unavailable { reason: String },
}

/// Routes operations between the Home worker and the job queue.
///
/// Safe to share across sessions: all per-request state lives on the stack
/// of the calling task, and counters are atomic.
pub struct FailoverRouter {
    home: Option<Arc<dyn HomeBackendPort>>,
    queue: Option<Arc<dyn QueueBackendPort>>,
    health: Arc<HealthMonitor>,
    stats: Arc<StatsCollector>,
    poller: Option<JobPollingEngine>,
    relay: StreamRelay,
    warned_unconfigured: AtomicBool,
}

impl FailoverRouter {
    /// Assemble a router from already-built adapters.
    pub fn new(
        settings: &RouterSettings,
        home: Option<Arc<dyn HomeBackendPort>>,
        queue: Option<Arc<dyn QueueBackendPort>>,
        stats: Arc<StatsCollector>,
    ) -> Self {
        let health = Arc::new(HealthMonitor::new(
            home.clone(),
            settings.timeouts.health,
            settings.home_cooldown,
        ));
        let poller = queue
            .as_ref()
            .map(|q| JobPollingEngine::new(Arc::clone(q), settings.ceilings));

        if home.is_none() {
            info!("Home GPU not configured, every request goes to the queue");
        }

        Self {
            home,
            queue,
            health,
            stats,
            poller,
            relay: StreamRelay::new(settings.timeouts.stream_idle),
            warned_unconfigured: AtomicBool::new(false),
        }
    }

    /// Build the HTTP adapters described by `settings` and assemble a router.
    pub fn from_settings(
        settings: &RouterSettings,
        stats: Arc<StatsCollector>,
    ) -> Result<Self, BackendError> {
        let home = match &settings.home_url {
            Some(url) => Some(
                Arc::new(HomeHttpClient::new(url.clone(), settings.timeouts)?)
                    as Arc<dyn HomeBackendPort>,
            ),
            None => None,
        };
        let queue = match &settings.queue {
            Some(queue) => Some(
                Arc::new(QueueHttpClient::new(queue.clone(), settings.timeouts)?)
                    as Arc<dyn QueueBackendPort>,
            ),
            None => None,
        };
        Ok(Self::new(settings, home, queue, stats))
    }

    /// The monitor backing routing decisions, for watchers and reporting.
    pub fn health_monitor(&self) -> Arc<HealthMonitor> {
        Arc::clone(&self.health)
    }

    /// Probe Home now. `false` when Home is unconfigured or unhealthy.
    pub async fn check_home_health(&self) -> bool {
        self.health.is_available().await
    }

    /// Preprocess an image on Home, or queue it.
    pub async fn preprocess(&self, request: &PreprocessRequest) -> Result<Routed, RouterError> {
        self.stats.record_total();
        let operation = Operation::Preprocess;

        if let Some(result) = self
            .try_home(operation, |home| async move { home.preprocess(request).await })
            .await
        {
            return Ok(Routed::home(result));
        }
        self.submit_to_queue(operation, queue_input(operation, request))
            .await
    }

    /// Generate a line sequence on Home, or queue it.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Routed, RouterError> {
        self.stats.record_total();
        let operation = Operation::Generate;

        if let Some(result) = self
            .try_home(operation, |home| async move { home.generate(request).await })
            .await
        {
            return Ok(Routed::home(result));
        }
        self.submit_to_queue(operation, queue_input(operation, request))
            .await
    }

    /// Generate with live events.
    ///
    /// On Home, events are relayed into `sink` as they arrive and the final
    /// payload is returned as the result. A Home failure falls back to the
    /// queue only while the session has seen nothing; afterwards it is
    /// terminal, so a session never mixes events from two providers.
    pub async fn generate_streaming(
        &self,
        request: &GenerateRequest,
        sink: &mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<Routed, RouterError> {
        self.stats.record_total();
        let operation = Operation::Generate;

        if let Some(home) = self.healthy_home().await {
            self.stats.record_request(ProviderKind::Home);

            match home.generate_stream(request).await {
                Ok(feed) => match self.relay.relay(feed, sink, cancel).await {
                    Ok(payload) => {
                        info!(%operation, "Home GPU streamed result");
                        return Ok(Routed::home(Value::Object(payload)));
                    }
                    Err(err) => {
                        if err.is_home_failure() {
                            self.record_home_failure(operation, &err.to_string());
                        }
                        if err.relayed() > 0 || !err.is_home_failure() {
                            return Err(RouterError::Stream(err));
                        }
                    }
                },
                Err(err) => self.record_home_failure(operation, &err.to_string()),
            }
        }

        self.submit_to_queue(operation, queue_input(operation, request))
            .await
    }

    /// Drive a queue job to a terminal status.
    ///
    /// Failed and timed-out jobs count as queue failures; cancelled ones do
    /// not. Wake jobs were never counted as requests, so they never count as
    /// failures either.
    pub async fn await_job(
        &self,
        handle: &JobHandle,
        observer: &dyn JobObserver,
        cancel: &CancellationToken,
    ) -> Result<JobStatus, RouterError> {
        let Some(poller) = &self.poller else {
            return Err(self.unconfigured());
        };

        let status = poller.drive(handle, observer, cancel).await;
        if handle.operation != Operation::Wake
            && matches!(status, JobStatus::Failed(_) | JobStatus::TimedOut { .. })
        {
            self.stats.record_failure(ProviderKind::Queue);
        }
        Ok(status)
    }

    /// Make sure a worker is warm.
    ///
    /// Not a routed request: counters are left alone.
    pub async fn wake(&self) -> WakeOutcome {
        if self.health.check().await.available {
            return WakeOutcome::HomeReady;
        }

        let Some(queue) = &self.queue else {
            return WakeOutcome::Unavailable {
                reason: "no queue backend configured".to_string(),
            };
        };

        match queue.submit(Operation::Wake, wake_input()).await {
            Ok(handle) => {
                info!(job_id = %handle.id, "Queued wake job");
                WakeOutcome::QueueWaking { job_id: handle.id }
            }
            Err(e) => {
                warn!(error = %e, "Wake submission failed");
                WakeOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Counters plus the monitor's last verdict.
    pub fn stats(&self) -> StatsReport {
        let last = self.health.last_status();
        StatsReport::new(
            self.stats.snapshot(),
            self.health.is_enabled(),
            last.as_ref().is_some_and(|s| s.available),
            last.map(|s| s.checked_at),
        )
    }

    /// Home, if configured and currently healthy.
    async fn healthy_home(&self) -> Option<Arc<dyn HomeBackendPort>> {
        let home = self.home.as_ref()?;
        if self.health.check().await.available {
            Some(Arc::clone(home))
        } else {
            None
        }
    }

    /// Run `call` against Home when it is healthy. `None` means "use the queue".
    async fn try_home<F, Fut>(&self, operation: Operation, call: F) -> Option<Value>
    where
        F: FnOnce(Arc<dyn HomeBackendPort>) -> Fut,
        Fut: Future<Output = Result<Value, BackendError>>,
    {
        let home = self.healthy_home().await?;
        self.stats.record_request(ProviderKind::Home);

        match call(home).await {
            Ok(result) => {
                info!(%operation, "Home GPU served request");
                Some(result)
            }
            Err(err) => {
                self.record_home_failure(operation, &err.to_string());
                None
            }
        }
    }

    fn record_home_failure(&self, operation: Operation, reason: &str) {
        self.stats.record_failure(ProviderKind::Home);
        self.health.mark_failed(reason);
        warn!(%operation, error = reason, "Home GPU call failed");
    }

    async fn submit_to_queue(
        &self,
        operation: Operation,
        input: Value,
    ) -> Result<Routed, RouterError> {
        let Some(queue) = &self.queue else {
            return Err(self.unconfigured());
        };

        self.stats.record_request(ProviderKind::Queue);
        match queue.submit(operation, input).await {
            Ok(handle) => {
                info!(job_id = %handle.id, %operation, "Submitted job to queue");
                Ok(Routed::queued(handle))
            }
            Err(err) => {
                self.stats.record_failure(ProviderKind::Queue);
                warn!(%operation, error = %err, "Queue submission failed");
                Err(RouterError::Queue(err))
            }
        }
    }

    fn unconfigured(&self) -> RouterError {
        if !self.warned_unconfigured.swap(true, Ordering::Relaxed) {
            warn!("Queue backend not configured; requests without a healthy Home GPU will fail");
        }
        RouterError::Configuration("no queue backend configured".to_string())
    }
}
