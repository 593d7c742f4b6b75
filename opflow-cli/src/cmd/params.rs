use opflow_core::params_map;
use opflow_store::StateStore;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::{open_store, parse_target};
use crate::{OutputArgs, StoreArgs};

pub async fn params_cmd(target: &str, output: OutputArgs, store: StoreArgs) -> i32 {
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

    let ov_name = &instance.spec.operator_version;
    let operator_version = match store.get_operator_version(&namespace, ov_name).await {
        Ok(Some(ov)) => ov,
        Ok(None) => {
            print_error(
                output.format,
                output.quiet,
                &format!("operator version {namespace}/{ov_name} not found"),
            );
            return exit_codes::INVALID_INPUT;
        }
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to load operator version: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let params = params_map(&instance, &operator_version);
    if output.format == OutputFormat::Text && !output.quiet {
        for (key, value) in &params {
            println!("{key}={value}");
        }
    } else {
        print_result(output.format, output.quiet, &params);
    }
    exit_codes::SUCCESS
}
