use async_trait::async_trait;

use opflow_core::types::DummyTaskSpec;

use crate::executor::{ExecutionError, TASK_EXECUTION_ERROR};
use crate::task::{Task, TaskContext};

/// Test task with a scripted outcome.
pub struct DummyTask {
    spec: DummyTaskSpec,
}

impl DummyTask {
    pub fn new(spec: DummyTaskSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Task for DummyTask {
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<bool, ExecutionError> {
        if self.spec.want_err {
            let message = format!("{}: dummy error", ctx.meta.path());
            return Err(if self.spec.fatal {
                ExecutionError::fatal(TASK_EXECUTION_ERROR, message)
            } else {
                ExecutionError::transient(message)
            });
        }
        Ok(self.spec.done)
    }
}
