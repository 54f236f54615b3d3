//! Health command handler.

use anyhow::Result;
use serde_json::json;

use crate::bootstrap::CliContext;
use crate::presentation::print_json;

/// Probe Home once and print the verdict.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let monitor = ctx.router.health_monitor();
    if !monitor.is_enabled() {
        print_json(&json!({"enabled": false, "available": false}));
        return Ok(());
    }

    let status = monitor.check().await;
    print_json(&json!({
        "enabled": true,
        "url": ctx.settings.home_url,
        "available": status.available,
        "checkedAt": status.checked_at,
        "reason": status.reason,
    }));
    Ok(())
}
