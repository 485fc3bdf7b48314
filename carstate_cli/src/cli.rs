//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "carstate", version, about = "Vehicle state normalizer CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/carstate.toml")]
    pub config: PathBuf,

    /// Log and report errors as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the bus subscription schemas for the configured vehicle
    Schema,
    /// Run recorded cycles through the normalizer and print one snapshot per line
    Replay {
        /// JSON-lines file of cycle records ("-" for stdin)
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Pace output by each record's elapsed_s instead of running flat out
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
        /// Stop after this many cycles
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// List supported vehicle variants and their capability facets
    Variants,
}
