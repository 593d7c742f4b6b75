use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one reconcile pass for an instance.
    Execute {
        /// `<namespace>/<name>` or `<name>` in the default namespace.
        target: String,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        cluster: ClusterArgs,
        #[command(flatten)]
        events: EventsArgs,
    },
    /// Reconcile an instance until its active plan finishes.
    Reconcile {
        target: String,
        #[command(flatten)]
        loop_args: LoopArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        cluster: ClusterArgs,
        #[command(flatten)]
        events: EventsArgs,
    },
    /// Show the plan status tree of an instance.
    Status {
        target: String,
        #[arg(long)]
        plan: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Compute the pipe map of a plan from an operator version document.
    Pipes {
        path: PathBuf,
        #[arg(long, default_value = "deploy")]
        plan: String,
        #[arg(long)]
        instance: String,
        #[arg(long, default_value = "default")]
        namespace: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the resolved parameters of an instance.
    Params {
        target: String,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List stored events of an instance.
    Events {
        target: String,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Load an instance or operator version document into the store.
    Apply {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
}
