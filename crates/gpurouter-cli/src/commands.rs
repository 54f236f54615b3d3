//! Subcommands, one per router operation.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the Home GPU once
    Health,

    /// Make sure a GPU worker is warm
    Wake {
        /// Wait for the queue wake job to finish
        #[arg(long)]
        wait: bool,
    },

    /// Print routing counters and success rates
    Stats,

    /// Print Home availability changes until interrupted
    Watch {
        /// Seconds between probes
        #[arg(short, long, default_value_t = 10)]
        interval: u64,
    },

    /// Preprocess an image so later generations start warm
    Preprocess {
        /// Image file to send
        #[arg(short, long)]
        image: PathBuf,
        /// Number of nails around the frame
        #[arg(long, default_value_t = 240)]
        num_nails: u32,
        /// Working resolution in pixels
        #[arg(long, default_value_t = 500)]
        resolution: u32,
    },

    /// Generate a line sequence for an image
    Generate {
        /// Image file to send
        #[arg(short, long)]
        image: PathBuf,
        /// Generation parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
        /// Stream live line events from the Home GPU
        #[arg(long)]
        stream: bool,
    },
}
