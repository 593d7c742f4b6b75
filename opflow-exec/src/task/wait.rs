use async_trait::async_trait;

use crate::executor::ExecutionError;
use crate::health::is_healthy;
use crate::task::resources::{client_error, object_ref, render_resources};
use crate::task::{Task, TaskContext};

/// Waits, without modifying anything, until every rendered resource exists and is healthy.
pub struct WaitTask {
    resources: Vec<String>,
}

impl WaitTask {
    pub fn new(resources: Vec<String>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl Task for WaitTask {
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<bool, ExecutionError> {
        let objects = render_resources(ctx, &self.resources).await?;

        let mut ready = true;
        for obj in &objects {
            let obj_ref = object_ref(ctx, obj)?;
            match ctx.client.get(&obj_ref).await.map_err(|e| client_error(ctx, e))? {
                Some(current) if is_healthy(&current) => {}
                _ => ready = false,
            }
        }
        Ok(ready)
    }
}
