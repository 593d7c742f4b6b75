mod active_plan;
mod engine;
pub mod events;
pub mod metrics;
mod result;
mod step_runner;

pub use active_plan::ActivePlan;
pub use engine::{execute, Executor};
pub use events::{
    CompositeEventSink, Event, EventSink, InstanceRef, NoOpEventSink, StdoutEventSink,
    StoreEventSink, TracingEventSink,
};
pub use metrics::{MetricsCollector, MetricsEventSink, PassMetrics};
pub use result::{
    ErrorKind, ExecutionError, ExecutionOutcome, CLIENT_ERROR, INVALID_PLAN, INVALID_RESOURCE,
    INVALID_TASK_SPEC, MISSING_PHASE_STATUS, MISSING_STEP_STATUS, TASK_EXECUTION_ERROR,
    TEMPLATE_RENDER_ERROR, UNKNOWN_TASK_KIND, UNKNOWN_TASK_NAME,
};
