//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Route GPU work between a Home worker and a serverless job queue.
#[derive(Parser)]
#[command(name = "gpurouter")]
#[command(about = "Route GPU jobs between a Home worker and a serverless queue")]
#[command(version)]
pub struct Cli {
    /// Home GPU worker base URL (overrides the environment)
    #[arg(long = "home-url", env = "HOME_GPU_URL", global = true)]
    pub home_url: Option<String>,

    /// Ignore any configured Home GPU and use only the queue
    #[arg(long = "no-home", global = true)]
    pub no_home: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
