use clap::{Parser, Subcommand};
use lookout_core::config::OutputFormat;
use std::path::PathBuf;

/// Replay and inspect agent event streams captured from a gateway.
#[derive(Parser)]
#[command(version, about, long_about = None, author)]
pub struct Cli {
    /// Path to a config file (defaults to <config dir>/lookout/config.toml)
    #[arg(long, env = "LOOKOUT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format, overriding [output].format from the config
    #[arg(long, env = "LOOKOUT_FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Feed newline-delimited frames through the reducer and print the timeline
    Replay {
        /// Frame file, or '-' for stdin (default)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Feed frames through the reducer and print only ingest statistics
    Check {
        /// Frame file, or '-' for stdin (default)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
}
