//! Preprocess command handler.

use std::path::Path;

use anyhow::Result;
use gpurouter_core::PreprocessRequest;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::{finish, interrupt_token, load_image};
use crate::presentation::print_json;

/// Preprocess an image and print the result envelope.
pub async fn execute(
    ctx: &CliContext,
    image: &Path,
    num_nails: u32,
    image_resolution: u32,
) -> Result<()> {
    if num_nails == 0 || image_resolution == 0 {
        return Err(CliError::Arguments(
            "--num-nails and --resolution must be positive".to_string(),
        )
        .into());
    }

    let request = PreprocessRequest {
        image_data: load_image(image).await?,
        num_nails,
        image_resolution,
    };

    let routed = ctx.router.preprocess(&request).await.map_err(CliError::from)?;
    let output = finish(ctx, routed, &interrupt_token()).await?;
    print_json(&output);
    Ok(())
}
