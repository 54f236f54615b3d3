//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that read CLI input, call the router and print results
//! - No routing decisions of their own

pub mod generate;
pub mod health;
pub mod preprocess;
pub mod stats;
pub mod wake;
pub mod watch;

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gpurouter_core::{JobStatus, ProviderKind};
use gpurouter_runtime::{Dispatch, Routed};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{print_update, summarize};

/// Token cancelled on the first Ctrl-C.
pub(crate) fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling");
            trigger.cancel();
        }
    });
    token
}

/// Read an image file and encode it for transport.
pub(crate) async fn load_image(path: &Path) -> Result<String, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    if bytes.is_empty() {
        return Err(CliError::Arguments(format!(
            "{} is an empty file",
            path.display()
        )));
    }
    Ok(STANDARD.encode(bytes))
}

/// Resolve a routed request to its final output, polling queue jobs.
pub(crate) async fn finish(
    ctx: &CliContext,
    routed: Routed,
    cancel: &CancellationToken,
) -> Result<Value, CliError> {
    let cached = routed.cached();
    match routed.dispatch {
        Dispatch::Completed(result) => {
            let mut envelope = result_envelope(ProviderKind::Home, result);
            if cached {
                envelope.insert("cached".to_string(), Value::Bool(true));
            }
            Ok(Value::Object(envelope))
        }
        Dispatch::Pending(handle) => {
            eprintln!("Queued {} job {}", handle.operation, handle.id);
            let status = ctx.router.await_job(&handle, &print_update, cancel).await?;
            eprintln!("Job {} {}", handle.id, summarize(&status));
            queue_output(status)
        }
    }
}

fn result_envelope(provider: ProviderKind, result: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("provider".to_string(), json!(provider));
    map.insert("result".to_string(), result);
    map
}

fn queue_output(status: JobStatus) -> Result<Value, CliError> {
    match status {
        JobStatus::Completed(done) => {
            let mut envelope = result_envelope(ProviderKind::Queue, done.output);
            envelope.insert("poll_count".to_string(), json!(done.poll_count));
            envelope.insert(
                "elapsed_seconds".to_string(),
                json!(done.elapsed.as_secs_f64()),
            );
            Ok(Value::Object(envelope))
        }
        JobStatus::Failed(failure) => Err(failure.into()),
        JobStatus::TimedOut { elapsed } => Err(CliError::JobTimedOut(elapsed.as_secs_f64())),
        JobStatus::Cancelled => Err(CliError::Cancelled),
        JobStatus::Queued | JobStatus::Running => Err(CliError::JobFailed(
            "job stopped before reaching a terminal state".to_string(),
        )),
    }
}
