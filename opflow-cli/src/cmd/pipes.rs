use std::path::Path;

use opflow_core::types::Metadata;
use opflow_core::{parse_operator_version, pipes_map};

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

pub async fn pipes_cmd(
    path: &Path,
    plan: &str,
    instance: &str,
    namespace: &str,
    output: OutputArgs,
) -> i32 {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(v) => v,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let operator_version = match parse_operator_version(&content) {
        Ok(ov) => ov,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("invalid operator version: {e}"));
            return exit_codes::INVALID_INPUT;
        }
    };

    let Some(plan_spec) = operator_version.plan(plan) else {
        print_error(
            output.format,
            output.quiet,
            &format!("plan {plan} is not defined by {}", operator_version.name),
        );
        return exit_codes::INVALID_INPUT;
    };

    let meta = Metadata {
        operator_name: operator_version.operator.clone(),
        operator_version_name: operator_version.name.clone(),
        operator_version: operator_version.version.clone(),
        app_version: operator_version.app_version.clone(),
        instance_name: instance.to_string(),
        instance_namespace: namespace.to_string(),
        ..Default::default()
    };

    match pipes_map(plan, plan_spec, &operator_version.tasks, &meta) {
        Ok(pipes) => {
            if output.format == OutputFormat::Text && !output.quiet {
                if pipes.is_empty() {
                    println!("plan {plan} declares no pipes");
                }
                for (key, artifact) in &pipes {
                    println!("{key} -> {artifact}");
                }
            } else {
                print_result(output.format, output.quiet, &pipes);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::INVALID_INPUT
        }
    }
}
