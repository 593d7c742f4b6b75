use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use opflow_core::types::{ExecutionStatus, Metadata};
use opflow_store::{NewEvent, StateStore};

/// The instance an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub namespace: String,
    pub name: String,
}

impl InstanceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl From<&Metadata> for InstanceRef {
    fn from(meta: &Metadata) -> Self {
        Self::new(&meta.instance_namespace, &meta.instance_name)
    }
}

impl std::fmt::Display for InstanceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PlanTriggered {
        instance: InstanceRef,
        plan: String,
    },
    PlanSkipped {
        instance: InstanceRef,
        plan: String,
        status: ExecutionStatus,
    },
    PlanStarted {
        instance: InstanceRef,
        plan: String,
    },
    PhaseStarted {
        instance: InstanceRef,
        plan: String,
        phase: String,
    },
    StepStarted {
        instance: InstanceRef,
        plan: String,
        phase: String,
        step: String,
    },
    TaskStarted {
        instance: InstanceRef,
        plan: String,
        phase: String,
        step: String,
        task: String,
    },
    TaskFinished {
        instance: InstanceRef,
        plan: String,
        phase: String,
        step: String,
        task: String,
        done: bool,
    },
    TaskFailed {
        instance: InstanceRef,
        plan: String,
        phase: String,
        step: String,
        task: String,
        message: String,
    },
    StepBlocked {
        instance: InstanceRef,
        plan: String,
        phase: String,
        step: String,
    },
    StepCompleted {
        instance: InstanceRef,
        plan: String,
        phase: String,
        step: String,
    },
    PhaseBlocked {
        instance: InstanceRef,
        plan: String,
        phase: String,
    },
    PhaseCompleted {
        instance: InstanceRef,
        plan: String,
        phase: String,
    },
    PlanCompleted {
        instance: InstanceRef,
        plan: String,
    },
    FatalError {
        instance: InstanceRef,
        plan: String,
        event_name: String,
        message: String,
    },
    PlanFinished {
        instance: InstanceRef,
        plan: String,
        status: ExecutionStatus,
    },
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::PlanTriggered { .. } => "plan.triggered",
            Event::PlanSkipped { .. } => "plan.skipped",
            Event::PlanStarted { .. } => "plan.started",
            Event::PhaseStarted { .. } => "phase.started",
            Event::StepStarted { .. } => "step.started",
            Event::TaskStarted { .. } => "task.started",
            Event::TaskFinished { .. } => "task.finished",
            Event::TaskFailed { .. } => "task.failed",
            Event::StepBlocked { .. } => "step.blocked",
            Event::StepCompleted { .. } => "step.completed",
            Event::PhaseBlocked { .. } => "phase.blocked",
            Event::PhaseCompleted { .. } => "phase.completed",
            Event::PlanCompleted { .. } => "plan.completed",
            Event::FatalError { .. } => "plan.fatal_error",
            Event::PlanFinished { .. } => "plan.finished",
        }
    }

    pub fn instance(&self) -> &InstanceRef {
        match self {
            Event::PlanTriggered { instance, .. }
            | Event::PlanSkipped { instance, .. }
            | Event::PlanStarted { instance, .. }
            | Event::PhaseStarted { instance, .. }
            | Event::StepStarted { instance, .. }
            | Event::TaskStarted { instance, .. }
            | Event::TaskFinished { instance, .. }
            | Event::TaskFailed { instance, .. }
            | Event::StepBlocked { instance, .. }
            | Event::StepCompleted { instance, .. }
            | Event::PhaseBlocked { instance, .. }
            | Event::PhaseCompleted { instance, .. }
            | Event::PlanCompleted { instance, .. }
            | Event::FatalError { instance, .. }
            | Event::PlanFinished { instance, .. } => instance,
        }
    }

    /// Event body without the instance, as stored and printed.
    pub fn payload(&self) -> Value {
        match self {
            Event::PlanTriggered { plan, .. }
            | Event::PlanStarted { plan, .. }
            | Event::PlanCompleted { plan, .. } => json!({ "plan": plan }),
            Event::PlanSkipped { plan, status, .. } | Event::PlanFinished { plan, status, .. } => {
                json!({ "plan": plan, "status": status.as_str() })
            }
            Event::PhaseStarted { plan, phase, .. }
            | Event::PhaseBlocked { plan, phase, .. }
            | Event::PhaseCompleted { plan, phase, .. } => {
                json!({ "plan": plan, "phase": phase })
            }
            Event::StepStarted {
                plan, phase, step, ..
            }
            | Event::StepBlocked {
                plan, phase, step, ..
            }
            | Event::StepCompleted {
                plan, phase, step, ..
            } => json!({ "plan": plan, "phase": phase, "step": step }),
            Event::TaskStarted {
                plan,
                phase,
                step,
                task,
                ..
            } => json!({ "plan": plan, "phase": phase, "step": step, "task": task }),
            Event::TaskFinished {
                plan,
                phase,
                step,
                task,
                done,
                ..
            } => json!({ "plan": plan, "phase": phase, "step": step, "task": task, "done": done }),
            Event::TaskFailed {
                plan,
                phase,
                step,
                task,
                message,
                ..
            } => json!({
                "plan": plan,
                "phase": phase,
                "step": step,
                "task": task,
                "message": message
            }),
            Event::FatalError {
                plan,
                event_name,
                message,
                ..
            } => json!({ "plan": plan, "event_name": event_name, "message": message }),
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

pub struct StoreEventSink {
    store: Arc<dyn StateStore>,
}

impl StoreEventSink {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventSink for StoreEventSink {
    async fn emit(&self, event: Event) {
        let instance = event.instance();
        let new_event = NewEvent {
            namespace: instance.namespace.clone(),
            instance: instance.name.clone(),
            r#type: event.event_type().to_string(),
            payload: event.payload(),
        };
        if let Err(e) = self.store.append_event(new_event).await {
            tracing::warn!(error = %e, event = event.event_type(), "failed to store event");
        }
    }
}

/// Prints one JSON object per event.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        let mut body = event.payload();
        if let Value::Object(map) = &mut body {
            map.insert("type".to_string(), json!(event.event_type()));
            map.insert("instance".to_string(), json!(event.instance().to_string()));
        }
        println!("{}", serde_json::to_string(&body).unwrap_or_default());
    }
}

pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: Event) {
        let instance = event.instance().to_string();
        let kind = event.event_type();
        match &event {
            Event::FatalError {
                plan,
                event_name,
                message,
                ..
            } => {
                tracing::error!(%instance, plan = %plan, event_name = %event_name, error = %message, "{kind}");
            }
            Event::TaskFailed { task, message, .. } => {
                tracing::warn!(%instance, task = %task, error = %message, "{kind}");
            }
            Event::StepBlocked { step, .. } => {
                tracing::debug!(%instance, step = %step, "{kind}");
            }
            Event::PhaseBlocked { phase, .. } => {
                tracing::debug!(%instance, phase = %phase, "{kind}");
            }
            _ => {
                let payload = event.payload();
                tracing::info!(%instance, %payload, "{kind}");
            }
        }
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
