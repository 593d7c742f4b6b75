use std::path::Path;

use serde::Serialize;

use opflow_core::{parse_document_str, Document, DocumentFormat, ParseError};
use opflow_store::{StateStore, DEFAULT_NAMESPACE};

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::open_store;
use crate::{OutputArgs, StoreArgs};

#[derive(Serialize)]
struct ApplyResult {
    kind: &'static str,
    namespace: String,
    name: String,
    format: String,
}

pub async fn apply_cmd(path: &Path, output: OutputArgs, store: StoreArgs) -> i32 {
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

    let parsed = match parse_document_str::<Document>(&content, DocumentFormat::Auto) {
        Ok(p) => p,
        Err(ParseError::UnknownFormat) => {
            print_error(
                output.format,
                output.quiet,
                "input is neither an operator version nor an instance",
            );
            return exit_codes::INVALID_INPUT;
        }
        Err(e) => {
            print_error(output.format, output.quiet, &format!("parse failed: {e}"));
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

    let (kind, namespace, name, stored) = match parsed.document {
        Document::OperatorVersion(mut ov) => {
            if ov.namespace.is_empty() {
                ov.namespace = DEFAULT_NAMESPACE.to_string();
            }
            let stored = store.put_operator_version(&ov).await;
            ("OperatorVersion", ov.namespace, ov.name, stored)
        }
        Document::Instance(mut instance) => {
            if instance.namespace.is_empty() {
                instance.namespace = DEFAULT_NAMESPACE.to_string();
            }
            // Re-applying an instance updates its spec only.
            match store.get_instance(&instance.namespace, &instance.name).await {
                Ok(Some(existing)) => instance.status = existing.status,
                Ok(None) => {}
                Err(e) => {
                    print_error(output.format, output.quiet, &format!("failed to load instance: {e}"));
                    return exit_codes::RUNTIME_ERROR;
                }
            }
            let stored = store.put_instance(&instance).await;
            ("Instance", instance.namespace, instance.name, stored)
        }
    };

    if let Err(e) = stored {
        print_error(output.format, output.quiet, &format!("failed to store {kind}: {e}"));
        return exit_codes::RUNTIME_ERROR;
    }
    tracing::info!(kind, %namespace, %name, "document applied");

    let result = ApplyResult {
        kind,
        namespace,
        name,
        format: format!("{:?}", parsed.format),
    };
    if output.format == OutputFormat::Text && !output.quiet {
        println!("applied {} {}/{}", result.kind, result.namespace, result.name);
    } else {
        print_result(output.format, output.quiet, &result);
    }
    exit_codes::SUCCESS
}
