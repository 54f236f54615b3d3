//! Stats command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::print_json;

/// Probe Home so the report carries a fresh verdict, then print it.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    ctx.router.check_home_health().await;
    print_json(&serde_json::to_value(ctx.router.stats())?);
    Ok(())
}
