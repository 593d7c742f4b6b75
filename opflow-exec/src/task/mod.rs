//! The closed set of task kinds and the context they run in.
//!
//! Every task must be idempotent: the engine re-runs every unfinished task on each pass
//! and relies on repeated runs converging on the same remote state.

mod apply;
mod delete;
mod dummy;
mod pipe;
mod resources;
mod wait;

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;

use opflow_core::types::{
    TaskMetadata, TaskSpec, APPLY_TASK_KIND, DELETE_TASK_KIND, DUMMY_TASK_KIND, PIPE_TASK_KIND,
    WAIT_TASK_KIND,
};

use crate::client::RemoteClient;
use crate::enhancer::Enhancer;
use crate::executor::ExecutionError;

pub use apply::ApplyTask;
pub use delete::DeleteTask;
pub use dummy::DummyTask;
pub use pipe::{pipe_pod_name, PipeTask, PIPE_POD_ANNOTATION};
pub use wait::WaitTask;

/// Everything a task may touch while running.
pub struct TaskContext<'a> {
    pub client: &'a dyn RemoteClient,
    pub enhancer: &'a dyn Enhancer,
    pub meta: TaskMetadata,
    pub templates: &'a BTreeMap<String, String>,
    pub params: &'a BTreeMap<String, String>,
    pub pipes: &'a BTreeMap<String, String>,
}

#[async_trait]
pub trait Task: Send + Sync {
    /// Returns `Ok(true)` once the task's effect is in place, `Ok(false)` while it is
    /// still converging. A non-fatal error is retried on the next pass.
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<bool, ExecutionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Apply,
    Delete,
    Wait,
    Pipe,
    Dummy,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Apply => APPLY_TASK_KIND,
            TaskKind::Delete => DELETE_TASK_KIND,
            TaskKind::Wait => WAIT_TASK_KIND,
            TaskKind::Pipe => PIPE_TASK_KIND,
            TaskKind::Dummy => DUMMY_TASK_KIND,
        }
    }
}

impl FromStr for TaskKind {
    type Err = TaskBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            APPLY_TASK_KIND => Ok(TaskKind::Apply),
            DELETE_TASK_KIND => Ok(TaskKind::Delete),
            WAIT_TASK_KIND => Ok(TaskKind::Wait),
            PIPE_TASK_KIND => Ok(TaskKind::Pipe),
            DUMMY_TASK_KIND => Ok(TaskKind::Dummy),
            other => Err(TaskBuildError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskBuildError {
    #[error("unknown task kind {0:?}")]
    UnknownKind(String),
    #[error("invalid {kind} task {name}: {message}")]
    InvalidSpec {
        kind: &'static str,
        name: String,
        message: String,
    },
}

/// Builds the runnable task for a catalogue entry.
pub fn build_task(spec: &TaskSpec) -> Result<Box<dyn Task>, TaskBuildError> {
    let kind: TaskKind = spec.kind.parse()?;
    let invalid = |message: &str| TaskBuildError::InvalidSpec {
        kind: kind.as_str(),
        name: spec.name.clone(),
        message: message.to_string(),
    };
    let resources = || {
        let resources = &spec.spec.resource.resources;
        if resources.is_empty() {
            Err(invalid("no resources"))
        } else {
            Ok(resources.clone())
        }
    };

    let task: Box<dyn Task> = match kind {
        TaskKind::Apply => Box::new(ApplyTask::new(resources()?)),
        TaskKind::Delete => Box::new(DeleteTask::new(resources()?)),
        TaskKind::Wait => Box::new(WaitTask::new(resources()?)),
        TaskKind::Pipe => {
            let pipe = &spec.spec.pipe;
            let pod = pipe.pod.clone().ok_or_else(|| invalid("no pod template"))?;
            if pipe.pipe.is_empty() {
                return Err(invalid("no pipe entries"));
            }
            Box::new(PipeTask::new(pod, pipe.pipe.clone()))
        }
        TaskKind::Dummy => Box::new(DummyTask::new(spec.spec.dummy.clone())),
    };
    Ok(task)
}
