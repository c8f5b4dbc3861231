//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Callguard - keeps a recording alive across telephony activity
#[derive(Parser, Debug)]
#[command(name = "callguard")]
#[command(version = "0.1.0")]
#[command(about = "Simulate and inspect the recording continuity engine")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario file against the continuity engine
    Simulate {
        /// Path to the scenario TOML file
        scenario: PathBuf,

        /// Print the command log as JSON instead of colored text
        #[arg(long)]
        json: bool,

        /// Override the settle delay before a resume sequence (ms)
        #[arg(long, value_name = "MS")]
        settle_ms: Option<u64>,

        /// Override the backoff between audio-activity checks (ms)
        #[arg(long, value_name = "MS")]
        backoff_ms: Option<u64>,

        /// Override the audio-activity check bound
        #[arg(long, value_name = "N")]
        max_checks: Option<u32>,
    },
    /// Classify an audio device as VoIP or not
    Classify {
        /// Device port type (e.g. usb-audio, bluetooth-hfp, wired-headset)
        port_type: String,

        /// Device name as reported by the platform
        name: String,
    },
}
