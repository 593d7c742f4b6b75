use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;
mod utils;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "opflow", version, about = "Operator plan executor")]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = utils::init_tracing(cli.log.verbose) {
        eprintln!("warning: failed to initialise logging: {e}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Execute {
            target,
            output,
            store,
            cluster,
            events,
        } => cmd::execute::execute_cmd(&target, output, store, cluster, events).await,
        Command::Reconcile {
            target,
            loop_args,
            output,
            store,
            cluster,
            events,
        } => {
            cmd::reconcile::reconcile_cmd(&target, loop_args, output, store, cluster, events).await
        }
        Command::Status {
            target,
            plan,
            output,
            store,
        } => cmd::status::status_cmd(&target, plan.as_deref(), output, store).await,
        Command::Pipes {
            path,
            plan,
            instance,
            namespace,
            output,
        } => cmd::pipes::pipes_cmd(&path, &plan, &instance, &namespace, output).await,
        Command::Params {
            target,
            output,
            store,
        } => cmd::params::params_cmd(&target, output, store).await,
        Command::Events {
            target,
            output,
            store,
        } => cmd::events::events_cmd(&target, output, store).await,
        Command::Apply {
            path,
            output,
            store,
        } => cmd::apply::apply_cmd(&path, output, store).await,
    }
}
