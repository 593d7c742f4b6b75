use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use opflow_core::types::PlanStatus;
use opflow_exec::{LabelEnhancer, ReconcileError, ReconcileOutcome, Reconciler, ReconcilerConfig};

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::{event_sink, open_store, parse_target, remote_client};
use crate::{ClusterArgs, EventsArgs, LoopArgs, OutputArgs, StoreArgs};

#[derive(Serialize)]
struct ReconcileResult {
    instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<PlanStatus>,
    passes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

#[derive(Serialize)]
struct ErrorInfo {
    kind: String,
    event_name: String,
    message: String,
}

pub async fn reconcile_cmd(
    target: &str,
    loop_args: LoopArgs,
    output: OutputArgs,
    store: StoreArgs,
    cluster: ClusterArgs,
    events: EventsArgs,
) -> i32 {
    let config = ReconcilerConfig {
        poll_interval: Duration::from_millis(loop_args.interval),
        max_passes: loop_args.max_passes,
    };
    run(target, Some(config), output, store, cluster, events).await
}

/// Shared by `execute` (single pass, no config) and `reconcile` (loop).
pub(crate) async fn run(
    target: &str,
    config: Option<ReconcilerConfig>,
    output: OutputArgs,
    store: StoreArgs,
    cluster: ClusterArgs,
    events: EventsArgs,
) -> i32 {
    let (namespace, name) = match parse_target(target) {
        Ok(t) => t,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::INVALID_INPUT;
        }
    };

    let store = match open_store(&store).await {
        Ok(s) => s,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to open store: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let looping = config.is_some();
    let reconciler = Reconciler::new(
        store.clone(),
        remote_client(&cluster),
        Arc::new(LabelEnhancer),
        event_sink(events.events, store),
        config.unwrap_or_default(),
    );

    let result = if looping {
        reconciler.run_until_terminal(&namespace, &name).await
    } else {
        reconciler.reconcile(&namespace, &name, chrono::Utc::now()).await
    };

    match result {
        Ok(outcome) => report(&format!("{namespace}/{name}"), outcome, &output),
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            error_code(&e)
        }
    }
}

fn error_code(e: &ReconcileError) -> i32 {
    match e {
        ReconcileError::InstanceNotFound { .. }
        | ReconcileError::OperatorVersionNotFound { .. }
        | ReconcileError::PlanSelection(_) => exit_codes::INVALID_INPUT,
        ReconcileError::Store(_) => exit_codes::RUNTIME_ERROR,
    }
}

fn report(instance: &str, outcome: ReconcileOutcome, output: &OutputArgs) -> i32 {
    let code = if outcome.is_fatal() {
        exit_codes::PLAN_FATAL
    } else {
        exit_codes::SUCCESS
    };

    if output.format == OutputFormat::Text && !output.quiet {
        match (&outcome.plan, &outcome.status) {
            (Some(_), Some(status)) => print!("{}", status.to_tree()),
            (Some(plan), None) => println!("{instance}: plan {plan} could not be started"),
            (None, _) => println!("{instance}: no plan has run"),
        }
        if outcome.passes == 0 {
            println!("nothing to do");
        }
        if let Some(err) = &outcome.error {
            eprintln!("{}: {}", err.event_name, err.message);
        }
        return code;
    }

    let result = ReconcileResult {
        instance: instance.to_string(),
        plan: outcome.plan,
        status: outcome.status,
        passes: outcome.passes,
        error: outcome.error.map(|e| ErrorInfo {
            kind: e.kind.as_str().to_string(),
            event_name: e.event_name,
            message: e.message,
        }),
    };
    print_result(output.format, output.quiet, &result);
    code
}
