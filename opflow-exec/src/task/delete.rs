use async_trait::async_trait;

use crate::client::ClientError;
use crate::executor::ExecutionError;
use crate::task::resources::{client_error, object_ref, render_resources};
use crate::task::{Task, TaskContext};

/// Deletes rendered resources. Objects that are already gone count as deleted.
pub struct DeleteTask {
    resources: Vec<String>,
}

impl DeleteTask {
    pub fn new(resources: Vec<String>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl Task for DeleteTask {
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<bool, ExecutionError> {
        let objects = render_resources(ctx, &self.resources).await?;

        for obj in &objects {
            let obj_ref = object_ref(ctx, obj)?;
            match ctx.client.delete(&obj_ref).await {
                Ok(_) | Err(ClientError::NotFound(_)) => {}
                Err(e) => return Err(client_error(ctx, e)),
            }
        }
        Ok(true)
    }
}
