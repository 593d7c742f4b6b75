use async_trait::async_trait;
use opflow_core::types::TaskMetadata;
use serde_json::{json, Map, Value};

pub const LABEL_OPERATOR: &str = "opflow.dev/operator";
pub const LABEL_INSTANCE: &str = "opflow.dev/instance";
pub const ANNOTATION_PLAN: &str = "opflow.dev/plan";
pub const ANNOTATION_PHASE: &str = "opflow.dev/phase";
pub const ANNOTATION_STEP: &str = "opflow.dev/step";
pub const ANNOTATION_TASK: &str = "opflow.dev/task";
pub const ANNOTATION_OPERATOR_VERSION: &str = "opflow.dev/operator-version";

#[derive(Debug, Clone, thiserror::Error)]
pub enum EnhanceError {
    #[error("{0} is not an object")]
    NotAnObject(String),
}

/// Hook applied to rendered objects before they are submitted to the remote system.
#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(&self, objects: Vec<Value>, meta: &TaskMetadata) -> Result<Vec<Value>, EnhanceError>;
}

/// Sets the instance namespace, ownership labels/annotations and an owner reference
/// pointing at the instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelEnhancer;

#[async_trait]
impl Enhancer for LabelEnhancer {
    async fn enhance(&self, objects: Vec<Value>, meta: &TaskMetadata) -> Result<Vec<Value>, EnhanceError> {
        objects
            .into_iter()
            .map(|mut obj| {
                let kind = obj
                    .get("kind")
                    .and_then(Value::as_str)
                    .unwrap_or("<unknown kind>")
                    .to_string();
                let root = obj.as_object_mut().ok_or(EnhanceError::NotAnObject(kind))?;
                let metadata = object_field(root, "metadata");

                if !metadata.contains_key("namespace") && !meta.meta.instance_namespace.is_empty() {
                    metadata.insert("namespace".to_string(), json!(meta.meta.instance_namespace));
                }

                let labels = object_field(metadata, "labels");
                labels.insert(LABEL_OPERATOR.to_string(), json!(meta.meta.operator_name));
                labels.insert(LABEL_INSTANCE.to_string(), json!(meta.meta.instance_name));

                let annotations = object_field(metadata, "annotations");
                annotations.insert(ANNOTATION_PLAN.to_string(), json!(meta.plan_name));
                annotations.insert(ANNOTATION_PHASE.to_string(), json!(meta.phase_name));
                annotations.insert(ANNOTATION_STEP.to_string(), json!(meta.step_name));
                annotations.insert(ANNOTATION_TASK.to_string(), json!(meta.task_name));
                annotations.insert(
                    ANNOTATION_OPERATOR_VERSION.to_string(),
                    json!(meta.meta.operator_version),
                );

                metadata.insert(
                    "ownerReferences".to_string(),
                    json!([{
                        "kind": "Instance",
                        "name": meta.meta.instance_name,
                        "uid": meta.meta.instance_uid.to_string(),
                        "controller": true,
                    }]),
                );
                Ok(obj)
            })
            .collect()
    }
}

fn object_field<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(map) => map,
        _ => unreachable!("entry was just replaced with an object"),
    }
}
