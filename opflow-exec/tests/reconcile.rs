mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use opflow_core::types::{ExecutionStatus, Instance};
use opflow_core::{parse_instance, parse_operator_version, OperatorVersion};
use opflow_exec::executor::{ErrorKind, MetricsCollector, MetricsEventSink, StoreEventSink};
use opflow_exec::reconcile::{metadata, PlanSelectionError};
use opflow_exec::{
    plan_to_execute, prepare_plan_execution, LabelEnhancer, MemoryClient, ReconcileError,
    Reconciler, ReconcilerConfig,
};
use opflow_store::{MemoryStore, StateStore};

use common::{now, RecordingSink};

const OPERATOR_VERSION: &str = r#"
name: web-1.0.0
namespace: default
operator: web
version: 1.0.0
appVersion: "2.4"
parameters:
  - name: replicas
    default: "1"
  - name: image
    default: nginx
  - name: backup_schedule
    trigger: backup
plans:
  deploy:
    strategy: serial
    phases:
      - name: main
        strategy: serial
        steps:
          - name: app
            tasks: [app]
  update:
    phases:
      - name: main
        steps:
          - name: app
            tasks: [app]
  backup:
    phases:
      - name: main
        steps:
          - name: snapshot
            tasks: [noop]
tasks:
  - name: app
    kind: Apply
    spec:
      resources: [deployment.yaml]
  - name: noop
    kind: Dummy
    spec:
      done: true
templates:
  deployment.yaml: |
    kind: Deployment
    metadata:
      name: {{ .Name }}
    spec:
      replicas: {{ .Params.replicas }}
      image: {{ .Params.image }}
"#;

const INSTANCE: &str = r#"
name: site
namespace: default
uid: 7f1b7a4e-3a53-4c1b-9d43-0c7c1e0f7a11
spec:
  operatorVersion: web-1.0.0
  parameters:
    replicas: "2"
"#;

fn operator_version() -> OperatorVersion {
    parse_operator_version(OPERATOR_VERSION).unwrap()
}

fn instance() -> Instance {
    parse_instance(INSTANCE).unwrap()
}

struct Harness {
    store: Arc<MemoryStore>,
    client: Arc<MemoryClient>,
    sink: Arc<RecordingSink>,
    reconciler: Reconciler,
}

async fn harness(config: ReconcilerConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.put_operator_version(&operator_version()).await.unwrap();
    store.put_instance(&instance()).await.unwrap();
    let client = Arc::new(MemoryClient::new());
    let sink = RecordingSink::new();
    let reconciler = Reconciler::new(
        store.clone(),
        client.clone(),
        Arc::new(LabelEnhancer),
        sink.clone(),
        config,
    );
    Harness {
        store,
        client,
        sink,
        reconciler,
    }
}

#[tokio::test]
async fn new_instance_runs_deploy_to_completion() {
    let h = harness(ReconcilerConfig::default()).await;
    h.client.set_status_on_apply("Deployment", json!({ "ready": false }));

    let first = h.reconciler.reconcile("default", "site", now()).await.unwrap();
    assert_eq!(first.plan.as_deref(), Some("deploy"));
    assert_eq!(first.status.as_ref().unwrap().status, ExecutionStatus::InProgress);
    assert!(!first.is_settled());

    let stored = h.store.get_instance("default", "site").await.unwrap().unwrap();
    let aggregated = stored.status.aggregated.clone().unwrap();
    assert_eq!(aggregated.active_plan_name, "deploy");
    assert_eq!(aggregated.status, ExecutionStatus::InProgress);
    assert_eq!(
        stored.status.last_applied_parameters,
        Some(BTreeMap::from([("replicas".to_string(), "2".to_string())]))
    );

    h.client.set_status_on_apply("Deployment", json!({ "ready": true }));
    let second = h.reconciler.reconcile("default", "site", now()).await.unwrap();
    let status = second.status.unwrap();
    assert_eq!(status.status, ExecutionStatus::Completed);
    assert_eq!(status.last_finished_run, Some(now()));

    let types = h.sink.types();
    assert_eq!(types.iter().filter(|t| **t == "plan.triggered").count(), 1);
    assert_eq!(types.last(), Some(&"plan.finished"));

    let idle = h.reconciler.reconcile("default", "site", now()).await.unwrap();
    assert_eq!(idle.passes, 0);
    assert_eq!(idle.plan.as_deref(), Some("deploy"));
    assert!(idle.is_settled());
}

#[tokio::test]
async fn rendered_objects_use_resolved_parameters() {
    let h = harness(ReconcilerConfig::default()).await;

    h.reconciler.reconcile("default", "site", now()).await.unwrap();

    let deployment = h
        .client
        .object(&opflow_exec::ObjectRef::new("Deployment", "default", "site"))
        .expect("deployment applied");
    assert_eq!(deployment["spec"]["replicas"], json!(2));
    assert_eq!(deployment["spec"]["image"], json!("nginx"));
    assert_eq!(
        deployment["metadata"]["ownerReferences"][0]["uid"],
        json!("7f1b7a4e-3a53-4c1b-9d43-0c7c1e0f7a11")
    );
}

#[tokio::test]
async fn run_until_terminal_drives_plan_and_respects_max_passes() {
    let h = harness(ReconcilerConfig {
        poll_interval: Duration::from_millis(1),
        max_passes: Some(3),
    })
    .await;
    h.client.set_status_on_apply("Deployment", json!({ "ready": false }));

    let stuck = h.reconciler.run_until_terminal("default", "site").await.unwrap();
    assert_eq!(stuck.passes, 3);
    assert!(!stuck.is_settled());

    h.client.set_status_on_apply("Deployment", json!({ "ready": true }));
    let done = h.reconciler.run_until_terminal("default", "site").await.unwrap();
    assert_eq!(done.passes, 1);
    assert_eq!(done.status.unwrap().status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn missing_instance_is_reported() {
    let h = harness(ReconcilerConfig::default()).await;

    let err = h.reconciler.reconcile("default", "nope", now()).await.unwrap_err();

    assert!(matches!(err, ReconcileError::InstanceNotFound { .. }));
}

#[tokio::test]
async fn fatal_task_error_is_persisted() {
    let h = harness(ReconcilerConfig::default()).await;
    let mut ov = operator_version();
    ov.plans.get_mut("deploy").unwrap().phases[0].steps[0].tasks = vec!["ghost".to_string()];
    h.store.put_operator_version(&ov).await.unwrap();

    let outcome = h.reconciler.reconcile("default", "site", now()).await.unwrap();

    assert!(outcome.is_fatal());
    assert_eq!(outcome.error.unwrap().event_name, "UnknownTaskName");
    let stored = h.store.get_instance("default", "site").await.unwrap().unwrap();
    assert_eq!(
        stored.status.plan_status["deploy"].status,
        ExecutionStatus::FatalError
    );
}

fn with_duplicate_pipe_keys(mut ov: OperatorVersion) -> OperatorVersion {
    let pipe = |name: &str| {
        serde_yaml::from_str::<opflow_core::types::TaskSpec>(&format!(
            "name: {name}\nkind: Pipe\nspec:\n  pod: pod.yaml\n  pipe:\n    - file: /out/a\n      kind: Secret\n      key: shared\n"
        ))
        .unwrap()
    };
    ov.tasks.push(pipe("p1"));
    ov.tasks.push(pipe("p2"));
    ov.plans.get_mut("deploy").unwrap().phases[0].steps[0].tasks =
        vec!["p1".to_string(), "p2".to_string()];
    ov
}

#[tokio::test]
async fn unpreparable_plan_leaves_stored_status_untouched() {
    let h = harness(ReconcilerConfig::default()).await;
    h.store
        .put_operator_version(&with_duplicate_pipe_keys(operator_version()))
        .await
        .unwrap();

    let outcome = h.reconciler.reconcile("default", "site", now()).await.unwrap();

    assert_eq!(outcome.plan.as_deref(), Some("deploy"));
    assert!(outcome.status.is_none());
    assert!(outcome.is_fatal());
    assert!(outcome.is_settled());
    assert_eq!(outcome.error.unwrap().event_name, "InvalidPlan");
    assert!(h.sink.types().contains(&"plan.fatal_error"));
    let stored = h.store.get_instance("default", "site").await.unwrap().unwrap();
    assert!(stored.status.plan_status.is_empty());
    assert!(stored.status.aggregated.is_none());

    h.store.put_operator_version(&operator_version()).await.unwrap();
    h.client.set_status_on_apply("Deployment", json!({ "ready": true }));
    let resumed = h.reconciler.reconcile("default", "site", now()).await.unwrap();
    assert!(resumed.error.is_none());
    assert_eq!(resumed.status.unwrap().status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn request_for_running_plan_is_consumed() {
    let h = harness(ReconcilerConfig::default()).await;
    h.client.set_status_on_apply("Deployment", json!({ "ready": false }));
    h.reconciler.reconcile("default", "site", now()).await.unwrap();

    let mut requested = h.store.get_instance("default", "site").await.unwrap().unwrap();
    requested.spec.plan_execution = Some("deploy".to_string());
    h.store.put_instance(&requested).await.unwrap();

    h.client.set_status_on_apply("Deployment", json!({ "ready": true }));
    let done = h.reconciler.reconcile("default", "site", now()).await.unwrap();
    assert_eq!(done.status.unwrap().status, ExecutionStatus::Completed);

    let stored = h.store.get_instance("default", "site").await.unwrap().unwrap();
    assert_eq!(stored.spec.plan_execution, None);
    let idle = h.reconciler.reconcile("default", "site", now()).await.unwrap();
    assert_eq!(idle.passes, 0);
    assert_eq!(h.sink.types().iter().filter(|t| **t == "plan.triggered").count(), 1);
}

#[tokio::test]
async fn events_reach_the_store_and_metrics() {
    let store = Arc::new(MemoryStore::new());
    store.put_operator_version(&operator_version()).await.unwrap();
    store.put_instance(&instance()).await.unwrap();
    let collector = Arc::new(MetricsCollector::new());
    let sink = Arc::new(MetricsEventSink::new(
        collector.clone(),
        Arc::new(StoreEventSink::new(store.clone())),
    ));
    let reconciler = Reconciler::new(
        store.clone(),
        Arc::new(MemoryClient::new()),
        Arc::new(LabelEnhancer),
        sink,
        ReconcilerConfig::default(),
    );

    reconciler.reconcile("default", "site", now()).await.unwrap();

    let events = store.list_events("default", "site").await.unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types.first(), Some(&"plan.triggered"));
    assert!(types.contains(&"task.started"));
    assert_eq!(types.last(), Some(&"plan.finished"));
    assert_eq!(events[0].payload, json!({ "plan": "deploy" }));

    let metrics = collector.get_metrics().await;
    assert_eq!(metrics.passes, 1);
    assert_eq!(metrics.tasks_run, 1);
    assert_eq!(metrics.tasks_done, 1);
    assert_eq!(metrics.status, Some(ExecutionStatus::Completed));
}

fn completed(mut instance: Instance, ov: &OperatorVersion, plan: &str) -> Instance {
    let mut status = opflow_core::PlanStatus::provision(plan, ov.plan(plan).unwrap());
    status.status = ExecutionStatus::Completed;
    instance.update_plan_status(status);
    instance.status.last_applied_parameters = Some(instance.spec.parameters.clone());
    instance
}

#[test]
fn plan_selection_follows_parameter_triggers() {
    let ov = operator_version();

    assert_eq!(plan_to_execute(&instance(), &ov).unwrap().as_deref(), Some("deploy"));

    let settled = completed(instance(), &ov, "deploy");
    assert_eq!(plan_to_execute(&settled, &ov).unwrap(), None);

    let mut scaled = settled.clone();
    scaled.spec.parameters.insert("replicas".to_string(), "5".to_string());
    assert_eq!(plan_to_execute(&scaled, &ov).unwrap().as_deref(), Some("update"));

    let mut scheduled = settled.clone();
    scheduled
        .spec
        .parameters
        .insert("backup_schedule".to_string(), "@daily".to_string());
    assert_eq!(plan_to_execute(&scheduled, &ov).unwrap().as_deref(), Some("backup"));

    let mut both = scheduled.clone();
    both.spec.parameters.insert("replicas".to_string(), "5".to_string());
    assert!(matches!(
        plan_to_execute(&both, &ov),
        Err(PlanSelectionError::ConflictingTriggers(_))
    ));

    let mut explicit = both.clone();
    explicit.spec.plan_execution = Some("backup".to_string());
    assert_eq!(plan_to_execute(&explicit, &ov).unwrap().as_deref(), Some("backup"));

    explicit.spec.plan_execution = Some("restore".to_string());
    assert_eq!(
        plan_to_execute(&explicit, &ov),
        Err(PlanSelectionError::UnknownPlan("restore".to_string()))
    );
}

#[test]
fn plan_in_progress_is_not_restarted() {
    let ov = operator_version();
    let mut running = instance();
    running.update_plan_status(opflow_core::PlanStatus::provision(
        "deploy",
        ov.plan("deploy").unwrap(),
    ));
    running.status.last_applied_parameters = Some(running.spec.parameters.clone());

    assert_eq!(plan_to_execute(&running, &ov).unwrap(), None);

    running.spec.plan_execution = Some("deploy".to_string());
    assert_eq!(plan_to_execute(&running, &ov).unwrap(), None);
}

#[test]
fn update_falls_back_to_deploy_when_not_defined() {
    let mut ov = operator_version();
    ov.plans.remove("update");
    let mut changed = completed(instance(), &ov, "deploy");
    changed.spec.parameters.insert("image".to_string(), "caddy".to_string());

    assert_eq!(plan_to_execute(&changed, &ov).unwrap().as_deref(), Some("deploy"));
}

#[test]
fn prepare_rejects_unknown_plans_and_duplicate_pipe_keys() {
    let ov = operator_version();
    let inst = instance();
    let meta = metadata(&inst, &ov);

    let err = prepare_plan_execution(&inst, &ov, "restore", &meta).unwrap_err();
    assert_eq!(err.event_name, "InvalidPlan");
    assert_eq!(err.kind, ErrorKind::Structural);

    let ov = with_duplicate_pipe_keys(ov);
    let err = prepare_plan_execution(&inst, &ov, "deploy", &meta).unwrap_err();
    assert_eq!(err.event_name, "InvalidPlan");
    assert!(err.message.contains("shared"));
}

#[test]
fn prepared_plan_carries_params_and_pipes() {
    let ov = operator_version();
    let inst = instance();
    let meta = metadata(&inst, &ov);

    let plan = prepare_plan_execution(&inst, &ov, "deploy", &meta).unwrap();

    assert_eq!(plan.name(), "deploy");
    assert_eq!(plan.params()["replicas"], "2");
    assert_eq!(plan.params()["image"], "nginx");
    assert_eq!(plan.params()["backup_schedule"], "");
    assert!(plan.pipes().is_empty());
    assert_eq!(plan.status().status, ExecutionStatus::Pending);
    assert_eq!(meta.operator_name, "web");
    assert_eq!(meta.app_version, "2.4");
}
