use opflow_core::types::{Metadata, TaskMetadata};

use crate::client::RemoteClient;
use crate::enhancer::Enhancer;
use crate::executor::active_plan::ActivePlan;
use crate::executor::events::{Event, EventSink, InstanceRef};
use crate::executor::result::{
    ExecutionError, INVALID_TASK_SPEC, UNKNOWN_TASK_KIND, UNKNOWN_TASK_NAME,
};
use crate::task::{build_task, TaskBuildError, TaskContext};

pub(crate) struct StepDeps<'a> {
    pub client: &'a dyn RemoteClient,
    pub enhancer: &'a dyn Enhancer,
    pub event_sink: &'a dyn EventSink,
}

/// Position of the step inside the active plan.
pub(crate) struct StepContext<'a> {
    pub plan: &'a ActivePlan,
    pub meta: &'a Metadata,
    pub instance: &'a InstanceRef,
    pub phase: usize,
    pub step: usize,
}

/// What running a step's tasks once produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepRun {
    pub tasks_left: usize,
    /// At least one task failed transiently.
    pub errored: bool,
}

/// Runs every task of the step in order. A fatal or structural error stops the step
/// immediately; transient failures are reported and the remaining tasks still run.
pub(crate) async fn run_step(ctx: StepContext<'_>, deps: StepDeps<'_>) -> Result<StepRun, ExecutionError> {
    let phase = &ctx.plan.spec().phases[ctx.phase];
    let step = &phase.steps[ctx.step];

    let mut run = StepRun {
        tasks_left: step.tasks.len(),
        errored: false,
    };

    for (ti, task_name) in step.tasks.iter().enumerate() {
        let meta = TaskMetadata::new(ctx.meta, ctx.plan.name(), &phase.name, &step.name, task_name);

        let Some(spec) = ctx.plan.task_spec(ctx.phase, ctx.step, ti) else {
            return Err(ExecutionError::structural(
                UNKNOWN_TASK_NAME,
                format!("{}: missing task", meta.path()),
            ));
        };
        let task = build_task(spec).map_err(|e| {
            let event_name = match e {
                TaskBuildError::UnknownKind(_) => UNKNOWN_TASK_KIND,
                TaskBuildError::InvalidSpec { .. } => INVALID_TASK_SPEC,
            };
            ExecutionError::structural(event_name, format!("{}: failed to build task: {e}", meta.path()))
        })?;

        deps.event_sink
            .emit(Event::TaskStarted {
                instance: ctx.instance.clone(),
                plan: ctx.plan.name().to_string(),
                phase: phase.name.clone(),
                step: step.name.clone(),
                task: task_name.clone(),
            })
            .await;

        let task_ctx = TaskContext {
            client: deps.client,
            enhancer: deps.enhancer,
            meta,
            templates: ctx.plan.templates(),
            params: ctx.plan.params(),
            pipes: ctx.plan.pipes(),
        };
        let event = match task.run(&task_ctx).await {
            Ok(done) => {
                if done {
                    run.tasks_left -= 1;
                }
                Event::TaskFinished {
                    instance: ctx.instance.clone(),
                    plan: ctx.plan.name().to_string(),
                    phase: phase.name.clone(),
                    step: step.name.clone(),
                    task: task_name.clone(),
                    done,
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                run.errored = true;
                Event::TaskFailed {
                    instance: ctx.instance.clone(),
                    plan: ctx.plan.name().to_string(),
                    phase: phase.name.clone(),
                    step: step.name.clone(),
                    task: task_name.clone(),
                    message: e.message,
                }
            }
        };
        deps.event_sink.emit(event).await;
    }

    Ok(run)
}
