//! Observer port for queue job progress.

use crate::domain::JobUpdate;

/// Receives one update per poll while a queue job is driven to completion.
///
/// - **Object-safe**: used as `&dyn JobObserver`
/// - **Fire-and-forget**: no `Result`, implementations handle their own errors
pub trait JobObserver: Send + Sync {
    /// Called after every status poll, including the terminal one.
    fn on_update(&self, update: &JobUpdate);
}

/// Observer that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopJobObserver;

impl JobObserver for NoopJobObserver {
    fn on_update(&self, _update: &JobUpdate) {}
}

impl<F> JobObserver for F
where
    F: Fn(&JobUpdate) + Send + Sync,
{
    fn on_update(&self, update: &JobUpdate) {
        self(update);
    }
}
