#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use opflow_core::types::{
    DummyTaskSpec, Metadata, Phase, Plan, PlanStatus, Step, Strategy, TaskParams, TaskSpec,
};
use opflow_exec::executor::{ActivePlan, Event, EventSink};

// Event sink that keeps every event for inspection
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn types(&self) -> Vec<&'static str> {
        self.events().iter().map(Event::event_type).collect()
    }

    /// Names of the tasks that were started, in order.
    pub fn started_tasks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::TaskStarted { task, .. } => Some(task),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn meta() -> Metadata {
    Metadata {
        operator_name: "demo".to_string(),
        operator_version_name: "demo-1.0.0".to_string(),
        operator_version: "1.0.0".to_string(),
        app_version: "2.1".to_string(),
        instance_name: "demo-1".to_string(),
        instance_namespace: "default".to_string(),
        instance_uid: uuid::Uuid::new_v4(),
    }
}

fn dummy_spec(name: &str, spec: DummyTaskSpec) -> TaskSpec {
    TaskSpec {
        name: name.to_string(),
        kind: "Dummy".to_string(),
        spec: TaskParams {
            dummy: spec,
            ..Default::default()
        },
    }
}

pub fn done(name: &str) -> TaskSpec {
    dummy_spec(
        name,
        DummyTaskSpec {
            done: true,
            ..Default::default()
        },
    )
}

pub fn pending(name: &str) -> TaskSpec {
    dummy_spec(name, DummyTaskSpec::default())
}

pub fn transient(name: &str) -> TaskSpec {
    dummy_spec(
        name,
        DummyTaskSpec {
            want_err: true,
            ..Default::default()
        },
    )
}

pub fn fatal(name: &str) -> TaskSpec {
    dummy_spec(
        name,
        DummyTaskSpec {
            want_err: true,
            fatal: true,
            done: false,
        },
    )
}

pub fn step(name: &str, tasks: &[&str]) -> Step {
    Step {
        name: name.to_string(),
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn phase(name: &str, strategy: Strategy, steps: Vec<Step>) -> Phase {
    Phase {
        name: name.to_string(),
        strategy,
        steps,
    }
}

pub fn plan(strategy: Strategy, phases: Vec<Phase>) -> Plan {
    Plan { strategy, phases }
}

/// Active plan with a freshly provisioned status and no templates.
pub fn active(spec: Plan, tasks: Vec<TaskSpec>) -> ActivePlan {
    let status = PlanStatus::provision("deploy", &spec);
    with_status(spec, status, tasks)
}

pub fn with_status(spec: Plan, status: PlanStatus, tasks: Vec<TaskSpec>) -> ActivePlan {
    ActivePlan::new(
        "deploy",
        spec,
        status,
        tasks,
        BTreeMap::new(),
        BTreeMap::new(),
        BTreeMap::new(),
    )
}
