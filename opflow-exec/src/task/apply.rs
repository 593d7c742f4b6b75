use async_trait::async_trait;

use crate::executor::ExecutionError;
use crate::health::is_healthy;
use crate::task::resources::{client_error, object_ref, render_resources};
use crate::task::{Task, TaskContext};

/// Applies rendered resources and reports done once all of them are healthy.
pub struct ApplyTask {
    resources: Vec<String>,
}

impl ApplyTask {
    pub fn new(resources: Vec<String>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl Task for ApplyTask {
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<bool, ExecutionError> {
        let objects = render_resources(ctx, &self.resources).await?;

        let mut healthy = true;
        for obj in objects {
            let obj_ref = object_ref(ctx, &obj)?;
            let applied = ctx.client.apply(obj).await.map_err(|e| client_error(ctx, e))?;
            if !is_healthy(&applied) {
                tracing::debug!(object = %obj_ref, task = %ctx.meta.path(), "object not healthy yet");
                healthy = false;
            }
        }
        Ok(healthy)
    }
}
