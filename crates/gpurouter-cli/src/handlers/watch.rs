//! Watch command handler.

use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use gpurouter_runtime::HealthWatcher;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::interrupt_token;

/// Print every Home availability change until Ctrl-C.
pub async fn execute(ctx: &CliContext, interval_secs: u64) -> Result<()> {
    if interval_secs == 0 {
        return Err(CliError::Arguments("--interval must be at least 1".to_string()).into());
    }
    if !ctx.settings.home_enabled() {
        return Err(CliError::Config("HOME_GPU_URL is not set".to_string()).into());
    }

    let cancel = interrupt_token();
    let watcher = HealthWatcher::new(
        ctx.router.health_monitor(),
        Duration::from_secs(interval_secs),
        cancel,
    );
    let changes = watcher.watch();
    tokio::pin!(changes);

    while let Some(status) = changes.next().await {
        let verdict = if status.available { "available" } else { "unavailable" };
        match status.reason {
            Some(reason) => println!("{} home {verdict} ({reason})", status.checked_at.to_rfc3339()),
            None => println!("{} home {verdict}", status.checked_at.to_rfc3339()),
        }
    }
    Ok(())
}
