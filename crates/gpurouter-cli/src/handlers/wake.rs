//! Wake command handler.

use anyhow::Result;
use gpurouter_core::{JobHandle, JobStatus, Operation};
use gpurouter_runtime::WakeOutcome;
use serde_json::json;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::interrupt_token;
use crate::presentation::{print_json, print_update, summarize};

/// Wake a worker, optionally waiting for the queue wake job to finish.
pub async fn execute(ctx: &CliContext, wait: bool) -> Result<()> {
    match ctx.router.wake().await {
        WakeOutcome::HomeReady => print_json(&json!({"status": "home_ready"})),
        WakeOutcome::QueueWaking { job_id } => {
            print_json(&json!({"status": "queue_waking", "jobId": job_id}));
            if wait {
                let handle = JobHandle::new(job_id, Operation::Wake);
                let cancel = interrupt_token();
                let status = ctx
                    .router
                    .await_job(&handle, &print_update, &cancel)
                    .await
                    .map_err(CliError::from)?;
                eprintln!("Wake job {}", summarize(&status));
                match status {
                    JobStatus::Completed(_) => {}
                    JobStatus::Failed(failure) => return Err(CliError::from(failure).into()),
                    JobStatus::TimedOut { elapsed } => {
                        return Err(CliError::JobTimedOut(elapsed.as_secs_f64()).into());
                    }
                    JobStatus::Cancelled => return Err(CliError::Cancelled.into()),
                    JobStatus::Queued | JobStatus::Running => {}
                }
            }
        }
        WakeOutcome::Unavailable { reason } => {
            return Err(CliError::Unavailable(reason).into());
        }
    }
    Ok(())
}
