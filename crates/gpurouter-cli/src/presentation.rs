//! Terminal output helpers.
//!
//! Results are JSON on stdout; progress is human text on stderr.

use gpurouter_core::{JobStatus, JobUpdate, StreamEvent};
use serde_json::Value;

/// Print a JSON value to stdout.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

/// One stderr line per job poll.
pub fn format_update(update: &JobUpdate) -> String {
    format!(
        "[{:>5.1}%] job {} {} (poll {}, {:.1}s)",
        update.progress_percent(),
        update.job_id,
        update.status.label(),
        update.poll_count,
        update.elapsed.as_secs_f64()
    )
}

/// Print a job update to stderr.
pub fn print_update(update: &JobUpdate) {
    eprintln!("{}", format_update(update));
}

/// Stream events are written as JSON lines so they can be piped on.
pub fn print_event(event: &StreamEvent) {
    if let Ok(line) = serde_json::to_string(event) {
        println!("{line}");
    }
}

/// Short summary of a finished job for stderr.
pub fn summarize(status: &JobStatus) -> String {
    match status {
        JobStatus::Completed(done) => format!(
            "completed after {} polls in {:.1}s",
            done.poll_count,
            done.elapsed.as_secs_f64()
        ),
        other => other.label().to_string(),
    }
}
