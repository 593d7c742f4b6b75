use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use opflow_core::pipe_artifact_name;
use opflow_core::types::{PipeKind, PipeSpec, TaskMetadata};

use crate::client::{ClientError, ObjectRef};
use crate::executor::{ExecutionError, INVALID_RESOURCE, TASK_EXECUTION_ERROR};
use crate::health::{is_failed, is_healthy};
use crate::task::resources::{client_error, enhance, object_ref, render_resources};
use crate::task::{Task, TaskContext};

pub const PIPE_POD_ANNOTATION: &str = "opflow.dev/pipe-pod";

/// Name of the ephemeral unit a pipe task runs to produce its files.
pub fn pipe_pod_name(meta: &TaskMetadata) -> String {
    pipe_artifact_name(meta, "pipe-pod")
}

/// Runs a pod template, collects the files it writes and stores each one as a
/// `Secret` or `ConfigMap` whose name other templates read via `{{ .Pipes.<key> }}`.
pub struct PipeTask {
    pod: String,
    pipes: Vec<PipeSpec>,
}

impl PipeTask {
    pub fn new(pod: String, pipes: Vec<PipeSpec>) -> Self {
        Self { pod, pipes }
    }

    fn artifact_ref(&self, ctx: &TaskContext<'_>, pipe: &PipeSpec) -> ObjectRef {
        ObjectRef::new(
            pipe.kind.as_str(),
            &ctx.meta.meta.instance_namespace,
            pipe_artifact_name(&ctx.meta, &pipe.key),
        )
    }

    async fn all_artifacts_exist(&self, ctx: &TaskContext<'_>) -> Result<bool, ExecutionError> {
        for pipe in &self.pipes {
            let artifact = self.artifact_ref(ctx, pipe);
            if ctx.client.get(&artifact).await.map_err(|e| client_error(ctx, e))?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn render_pod(&self, ctx: &TaskContext<'_>) -> Result<Value, ExecutionError> {
        let mut objects = render_resources(ctx, std::slice::from_ref(&self.pod)).await?;
        if objects.len() != 1 {
            return Err(ExecutionError::fatal(
                INVALID_RESOURCE,
                format!(
                    "{}: pipe pod template {} must render exactly one object, got {}",
                    ctx.meta.path(),
                    self.pod,
                    objects.len()
                ),
            ));
        }
        let mut pod = objects.remove(0);
        let metadata = pod
            .get_mut("metadata")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                ExecutionError::fatal(
                    INVALID_RESOURCE,
                    format!("{}: pipe pod has no metadata", ctx.meta.path()),
                )
            })?;
        metadata.insert("name".to_string(), json!(pipe_pod_name(&ctx.meta)));
        let annotations = metadata
            .entry("annotations".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(annotations) = annotations.as_object_mut() {
            annotations.insert(PIPE_POD_ANNOTATION.to_string(), json!("true"));
        }
        Ok(pod)
    }

    async fn create_artifact(
        &self,
        ctx: &TaskContext<'_>,
        pod: &ObjectRef,
        pipe: &PipeSpec,
    ) -> Result<(), ExecutionError> {
        let content = ctx
            .client
            .read_file(pod, &pipe.file)
            .await
            .map_err(|e| client_error(ctx, e))?
            .ok_or_else(|| {
                ExecutionError::fatal(
                    TASK_EXECUTION_ERROR,
                    format!("{}: pipe pod did not produce {}", ctx.meta.path(), pipe.file),
                )
            })?;
        let content = String::from_utf8(content).map_err(|_| {
            ExecutionError::fatal(
                INVALID_RESOURCE,
                format!("{}: {} is not valid UTF-8", ctx.meta.path(), pipe.file),
            )
        })?;

        let data_key = Path::new(&pipe.file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(pipe.key.as_str());
        let data_field = match pipe.kind {
            PipeKind::Secret => "stringData",
            PipeKind::ConfigMap => "data",
        };
        let artifact = self.artifact_ref(ctx, pipe);
        let obj = json!({
            "kind": artifact.kind,
            "metadata": { "name": artifact.name, "namespace": artifact.namespace },
            data_field: { data_key: content },
        });

        for obj in enhance(ctx, vec![obj]).await? {
            ctx.client.apply(obj).await.map_err(|e| client_error(ctx, e))?;
        }
        Ok(())
    }

    async fn delete_pod(&self, ctx: &TaskContext<'_>, pod: &ObjectRef) -> Result<(), ExecutionError> {
        match ctx.client.delete(pod).await {
            Ok(_) | Err(ClientError::NotFound(_)) => Ok(()),
            Err(e) => Err(client_error(ctx, e)),
        }
    }
}

#[async_trait]
impl Task for PipeTask {
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<bool, ExecutionError> {
        let pod = self.render_pod(ctx).await?;
        let pod_ref = object_ref(ctx, &pod)?;

        if self.all_artifacts_exist(ctx).await? {
            self.delete_pod(ctx, &pod_ref).await?;
            return Ok(true);
        }

        let applied = ctx.client.apply(pod).await.map_err(|e| client_error(ctx, e))?;
        if is_failed(&applied) {
            return Err(ExecutionError::fatal(
                TASK_EXECUTION_ERROR,
                format!("{}: pipe pod {pod_ref} failed", ctx.meta.path()),
            ));
        }
        if !is_healthy(&applied) {
            return Ok(false);
        }

        for pipe in &self.pipes {
            self.create_artifact(ctx, &pod_ref, pipe).await?;
        }
        self.delete_pod(ctx, &pod_ref).await?;
        Ok(true)
    }
}
