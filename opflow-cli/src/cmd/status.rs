use serde::Serialize;

use opflow_core::types::{AggregatedStatus, PlanStatus};
use opflow_store::StateStore;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::{open_store, parse_target};
use crate::{OutputArgs, StoreArgs};

#[derive(Serialize)]
struct StatusResult {
    instance: String,
    operator_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    aggregated: Option<AggregatedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<PlanStatus>,
}

pub async fn status_cmd(target: &str, plan: Option<&str>, output: OutputArgs, store: StoreArgs) -> i32 {
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

    let instance = match store.get_instance(&namespace, &name).await {
        Ok(Some(i)) => i,
        Ok(None) => {
            print_error(output.format, output.quiet, &format!("instance {namespace}/{name} not found"));
            return exit_codes::INVALID_INPUT;
        }
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to load instance: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let plan_name = plan
        .map(str::to_string)
        .or_else(|| instance.status.aggregated.as_ref().map(|a| a.active_plan_name.clone()));
    let plan_status = plan_name
        .as_ref()
        .and_then(|p| instance.status.plan_status.get(p))
        .cloned();
    if let (Some(requested), None) = (plan, &plan_status) {
        print_error(
            output.format,
            output.quiet,
            &format!("plan {requested} has not run for {namespace}/{name}"),
        );
        return exit_codes::INVALID_INPUT;
    }

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Instance: {namespace}/{name}");
        println!("Operator version: {}", instance.spec.operator_version);
        match &plan_status {
            Some(status) => {
                print!("{}", status.to_tree());
                if let Some(ts) = status.last_finished_run {
                    println!("Last finished: {}", ts.to_rfc3339());
                }
            }
            None => println!("No plan has run"),
        }
        return exit_codes::SUCCESS;
    }

    let result = StatusResult {
        instance: format!("{namespace}/{name}"),
        operator_version: instance.spec.operator_version.clone(),
        aggregated: instance.status.aggregated.clone(),
        plan: plan_status,
    };
    print_result(output.format, output.quiet, &result);
    exit_codes::SUCCESS
}
