//! Queue job polling engine.
//!
//! Drives a submitted job to a terminal [`JobStatus`] with an adaptive
//! interval: fast while the job is likely to finish soon, slower as it
//! drags on. Every run is bounded by a per-operation wall-clock ceiling.

use std::sync::Arc;
use std::time::Duration;

use gpurouter_core::{
    FailureOrigin, JobFailure, JobHandle, JobObserver, JobStatus, JobUpdate, PollCeilings,
    QueueBackendPort,
};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls made at [`FAST_POLL_INTERVAL`] before slowing down.
pub const FAST_PHASE_POLLS: u32 = 10;
/// Poll count at which the slowest interval kicks in.
pub const SLOW_PHASE_START: u32 = 30;

pub const FAST_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const STEADY_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const SLOW_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Delay before the next poll, given how many polls were already made.
#[must_use]
pub const fn poll_interval(polls_made: u32) -> Duration {
    if polls_made < FAST_PHASE_POLLS {
        FAST_POLL_INTERVAL
    } else if polls_made < SLOW_PHASE_START {
        STEADY_POLL_INTERVAL
    } else {
        SLOW_POLL_INTERVAL
    }
}

/// Drives queue jobs to completion.
///
/// Owns no per-job state; one engine serves any number of concurrent jobs.
#[derive(Clone)]
pub struct JobPollingEngine {
    queue: Arc<dyn QueueBackendPort>,
    ceilings: PollCeilings,
}

impl JobPollingEngine {
    pub fn new(queue: Arc<dyn QueueBackendPort>, ceilings: PollCeilings) -> Self {
        Self { queue, ceilings }
    }

    /// Poll `handle` until a terminal status, the ceiling, or cancellation.
    ///
    /// The observer sees one update per poll, the terminal one included. A
    /// failed status call ends the run with a transport failure; it is not
    /// retried. Exceeding the ceiling abandons the remote job without
    /// cancelling it.
    pub async fn drive(
        &self,
        handle: &JobHandle,
        observer: &dyn JobObserver,
        cancel: &CancellationToken,
    ) -> JobStatus {
        let ceiling = self.ceilings.for_operation(handle.operation);
        let started = Instant::now();
        let mut poll_count: u32 = 0;
        let mut last_label = "submitted";

        debug!(job_id = %handle.id, operation = %handle.operation, ?ceiling, "Polling queue job");

        loop {
            tokio::select! {
                () = cancel.cancelled() => return self.abandon(handle, observer, poll_count, started).await,
                () = sleep(poll_interval(poll_count)) => {}
            }

            let elapsed = started.elapsed();
            if elapsed > ceiling {
                warn!(
                    job_id = %handle.id,
                    poll_count,
                    ?elapsed,
                    "Queue job exceeded polling ceiling"
                );
                let status = JobStatus::TimedOut { elapsed };
                notify(observer, handle, poll_count, elapsed, &status);
                return status;
            }

            poll_count += 1;
            let snapshot = tokio::select! {
                () = cancel.cancelled() => return self.abandon(handle, observer, poll_count, started).await,
                result = self.queue.status(&handle.id) => result,
            };

            let status = match snapshot {
                Ok(snapshot) => {
                    if let Some(status) = JobStatus::from_snapshot(&snapshot, poll_count, elapsed) {
                        status
                    } else {
                        debug!(job_id = %handle.id, state = ?snapshot.status, "Unrecognised queue state");
                        continue;
                    }
                }
                Err(e) => {
                    warn!(job_id = %handle.id, poll_count, error = %e, "Queue status call failed");
                    JobStatus::Failed(JobFailure {
                        origin: FailureOrigin::Transport,
                        message: e.to_string(),
                    })
                }
            };

            if status.label() != last_label {
                debug!(
                    job_id = %handle.id,
                    from = last_label,
                    to = status.label(),
                    poll_count,
                    "Queue job state changed"
                );
                last_label = status.label();
            }

            notify(observer, handle, poll_count, elapsed, &status);

            if status.is_terminal() {
                info!(
                    job_id = %handle.id,
                    status = status.label(),
                    poll_count,
                    elapsed_ms = elapsed.as_millis(),
                    "Queue job finished"
                );
                return status;
            }
        }
    }

    /// Best-effort remote cancel, then report `Cancelled`.
    async fn abandon(
        &self,
        handle: &JobHandle,
        observer: &dyn JobObserver,
        poll_count: u32,
        started: Instant,
    ) -> JobStatus {
        if let Err(e) = self.queue.cancel(&handle.id).await {
            warn!(job_id = %handle.id, error = %e, "Queue cancel failed");
        }
        info!(job_id = %handle.id, poll_count, "Queue job cancelled");
        let status = JobStatus::Cancelled;
        notify(observer, handle, poll_count, started.elapsed(), &status);
        status
    }
}

fn notify(
    observer: &dyn JobObserver,
    handle: &JobHandle,
    poll_count: u32,
    elapsed: Duration,
    status: &JobStatus,
) {
    observer.on_update(&JobUpdate {
        job_id: handle.id.clone(),
        poll_count,
        elapsed,
        status: status.clone(),
    });
}
