//! Generate command handler.
//!
//! With `--stream`, live events from the Home GPU are printed as JSON lines
//! while they arrive. A queue fallback has no live events; its progress is
//! printed from the polling observer instead.

use std::path::Path;

use anyhow::Result;
use gpurouter_core::{GenerateRequest, StreamEvent};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::{finish, interrupt_token, load_image};
use crate::presentation::{print_event, print_json};

/// Parse `--params`; it must be a JSON object.
pub(crate) fn parse_params(raw: &str) -> Result<Value, CliError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CliError::Arguments(format!("--params is not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(CliError::Arguments(
            "--params must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}

/// Generate a line sequence and print the result envelope.
pub async fn execute(ctx: &CliContext, image: &Path, params: &str, stream: bool) -> Result<()> {
    let request = GenerateRequest {
        image_data: load_image(image).await?,
        params: parse_params(params)?,
    };

    let routed = if stream {
        let (sink, mut events) = mpsc::channel::<StreamEvent>(1);
        let printer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                print_event(&event);
            }
        });

        let routed = ctx
            .router
            .generate_streaming(&request, &sink, &interrupt_token())
            .await;
        drop(sink);
        printer.await?;
        routed.map_err(CliError::from)?
    } else {
        ctx.router.generate(&request).await.map_err(CliError::from)?
    };

    let output = finish(ctx, routed, &interrupt_token()).await?;
    print_json(&output);
    Ok(())
}
