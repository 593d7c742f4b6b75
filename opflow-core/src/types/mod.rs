mod instance;
mod metadata;
mod operator;
mod plan;
mod status;
mod task;

pub use instance::{AggregatedStatus, Instance, InstanceSpec, InstanceStatus};
pub use metadata::{Metadata, TaskMetadata};
pub use operator::{OperatorVersion, Parameter, DEPLOY_PLAN_NAME, UPDATE_PLAN_NAME};
pub use plan::{Phase, Plan, Step, Strategy};
pub use status::{ExecutionStatus, PhaseStatus, PlanStatus, StepStatus};
pub use task::{
    DummyTaskSpec, PipeKind, PipeSpec, PipeTaskSpec, ResourceTaskSpec, TaskParams, TaskSpec,
    APPLY_TASK_KIND, DELETE_TASK_KIND, DUMMY_TASK_KIND, PIPE_TASK_KIND, WAIT_TASK_KIND,
};
