use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct StoreArgs {
    /// Directory holding instances, operator versions and events.
    #[arg(long, env = "OPFLOW_STORE", default_value = ".opflow")]
    pub store: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ClusterArgs {
    /// Directory standing in for the remote system, or `memory` for a throwaway one.
    #[arg(long, env = "OPFLOW_CLUSTER", default_value = ".opflow/cluster")]
    pub cluster: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventsTarget {
    Store,
    Stdout,
    Both,
    None,
}

#[derive(Debug, Args, Clone)]
pub struct EventsArgs {
    /// Where engine events go, in addition to the log.
    #[arg(long, value_enum, default_value_t = EventsTarget::Store)]
    pub events: EventsTarget,
}

#[derive(Debug, Args, Clone)]
pub struct LoopArgs {
    /// Delay between passes, in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub interval: u64,
    #[arg(long)]
    pub max_passes: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct LogArgs {
    /// Debug-level logging for opflow crates (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,
}
