use serde::Serialize;

use opflow_store::StateStore;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::{open_store, parse_target};
use crate::{OutputArgs, StoreArgs};

#[derive(Serialize)]
struct EventInfo {
    id: i64,
    ts: String,
    r#type: String,
    payload: serde_json::Value,
}

pub async fn events_cmd(target: &str, output: OutputArgs, store: StoreArgs) -> i32 {
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

    let events = match store.list_events(&namespace, &name).await {
        Ok(e) => e,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to get events: {e}"));
            return exit_codes::RUNTIME_ERROR;
        }
    };

    for event in &events {
        let info = EventInfo {
            id: event.id,
            ts: event.ts.to_rfc3339(),
            r#type: event.event_type.clone(),
            payload: event.payload.clone(),
        };

        if output.format == OutputFormat::Text && !output.quiet {
            println!("{} {} {}", info.id, info.ts, info.r#type);
            if !info.payload.is_null() && info.payload != serde_json::json!({}) {
                if let Ok(s) = serde_json::to_string(&info.payload) {
                    println!("  {s}");
                }
            }
        } else {
            print_result(output.format, output.quiet, &info);
        }
    }

    exit_codes::SUCCESS
}
