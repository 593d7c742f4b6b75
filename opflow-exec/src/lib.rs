#![forbid(unsafe_code)]

//! Plan execution for opflow: the single-pass engine, the task runtime, the remote
//! system seams and the reconcile driver that feeds the engine.

pub mod client;
pub mod enhancer;
pub mod executor;
pub mod health;
pub mod reconcile;
pub mod task;

pub use crate::client::{ClientError, DirClient, MemoryClient, ObjectRef, RemoteClient};
pub use crate::enhancer::{EnhanceError, Enhancer, LabelEnhancer};
pub use crate::executor::{
    execute, ActivePlan, ErrorKind, Event, EventSink, ExecutionError, ExecutionOutcome, Executor,
};
pub use crate::reconcile::{
    plan_to_execute, prepare_plan_execution, ReconcileError, ReconcileOutcome, Reconciler,
    ReconcilerConfig,
};
pub use crate::task::{build_task, Task, TaskBuildError, TaskContext, TaskKind};
