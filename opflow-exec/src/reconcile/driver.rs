use std::sync::Arc;

use chrono::{DateTime, Utc};

use opflow_core::types::{ExecutionStatus, Instance, Metadata, OperatorVersion, PlanStatus};
use opflow_core::{params_map, pipes_map};
use opflow_store::{namespace_or_default, StateStore, StoreError};

use crate::client::RemoteClient;
use crate::enhancer::Enhancer;
use crate::executor::{
    ActivePlan, Event, EventSink, ExecutionError, Executor, InstanceRef,
    INVALID_PLAN,
};
use crate::reconcile::config::ReconcilerConfig;
use crate::reconcile::plan_selection::{plan_to_execute, PlanSelectionError};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("instance {namespace}/{name} not found")]
    InstanceNotFound { namespace: String, name: String },
    #[error("operator version {namespace}/{name} not found")]
    OperatorVersionNotFound { namespace: String, name: String },
    #[error(transparent)]
    PlanSelection(#[from] PlanSelectionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of one reconcile pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// The plan that was executed, or the last plan run when nothing was active.
    pub plan: Option<String>,
    pub status: Option<PlanStatus>,
    /// Set when the pass ended the plan with a fatal error, or when the plan could not be
    /// prepared (then `status` is `None` and nothing was persisted).
    pub error: Option<ExecutionError>,
    pub passes: usize,
}

impl ReconcileOutcome {
    fn idle(instance: &Instance) -> Self {
        let plan = instance.status.aggregated.as_ref().map(|a| a.active_plan_name.clone());
        let status = plan
            .as_ref()
            .and_then(|p| instance.status.plan_status.get(p))
            .cloned();
        Self {
            plan,
            status,
            error: None,
            passes: 0,
        }
    }

    /// True when no plan is active or the active plan reached a terminal state.
    pub fn is_settled(&self) -> bool {
        self.status.as_ref().map_or(true, PlanStatus::is_terminal)
    }

    pub fn is_fatal(&self) -> bool {
        self.error.as_ref().is_some_and(ExecutionError::is_fatal)
            || self
                .status
                .as_ref()
                .is_some_and(|s| s.status == ExecutionStatus::FatalError)
    }
}

/// Identity of `instance` and its operator version, as seen by templates and events.
pub fn metadata(instance: &Instance, operator_version: &OperatorVersion) -> Metadata {
    Metadata {
        operator_name: operator_version.operator.clone(),
        operator_version_name: operator_version.name.clone(),
        operator_version: operator_version.version.clone(),
        app_version: operator_version.app_version.clone(),
        instance_name: instance.name.clone(),
        instance_namespace: namespace_or_default(&instance.namespace).to_string(),
        instance_uid: instance.uid,
    }
}

/// Assembles the engine input for `plan_name`: the plan spec, its current (or freshly
/// provisioned) status, the task catalogue, templates, params and pipes.
pub fn prepare_plan_execution(
    instance: &Instance,
    operator_version: &OperatorVersion,
    plan_name: &str,
    meta: &Metadata,
) -> Result<ActivePlan, ExecutionError> {
    let plan = operator_version.plan(plan_name).ok_or_else(|| {
        ExecutionError::structural(
            INVALID_PLAN,
            format!(
                "{}/{}: plan {plan_name} not found in operator version {}",
                instance.namespace, instance.name, operator_version.name
            ),
        )
    })?;

    let status = instance
        .status
        .plan_status
        .get(plan_name)
        .cloned()
        .unwrap_or_else(|| PlanStatus::provision(plan_name, plan));

    let params = params_map(instance, operator_version);
    let pipes = pipes_map(plan_name, plan, &operator_version.tasks, meta).map_err(|e| {
        ExecutionError::structural(
            INVALID_PLAN,
            format!("{}/{}: plan {plan_name}: {e}", instance.namespace, instance.name),
        )
    })?;

    Ok(ActivePlan::new(
        plan_name,
        plan.clone(),
        status,
        operator_version.tasks.clone(),
        operator_version.templates.clone(),
        params,
        pipes,
    ))
}

/// Drops an explicit request for the plan that is already running, so it does not
/// restart once that plan finishes.
fn consume_running_plan_request(instance: &mut Instance) {
    let running = instance.plan_in_progress().map(|p| p.name.clone());
    if running.is_some() && instance.spec.plan_execution == running {
        instance.spec.plan_execution = None;
    }
}

/// Loads instances from a store, decides which plan to run and advances it one pass
/// at a time, persisting the status after every pass.
pub struct Reconciler {
    store: Arc<dyn StateStore>,
    executor: Executor,
    event_sink: Arc<dyn EventSink>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn StateStore>,
        client: Arc<dyn RemoteClient>,
        enhancer: Arc<dyn Enhancer>,
        event_sink: Arc<dyn EventSink>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            executor: Executor::new(client, enhancer, event_sink.clone()),
            event_sink,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub async fn reconcile(
        &self,
        namespace: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let mut instance = self.store.get_instance(namespace, name).await?.ok_or_else(|| {
            ReconcileError::InstanceNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
        })?;
        let ov_name = instance.spec.operator_version.clone();
        let operator_version = self
            .store
            .get_operator_version(namespace, &ov_name)
            .await?
            .ok_or_else(|| ReconcileError::OperatorVersionNotFound {
                namespace: namespace.to_string(),
                name: ov_name,
            })?;
        let meta = metadata(&instance, &operator_version);
        let instance_ref = InstanceRef::from(&meta);

        match plan_to_execute(&instance, &operator_version)? {
            Some(plan_name) => {
                self.start_plan(&mut instance, &operator_version, &plan_name, &instance_ref)
                    .await
            }
            None => consume_running_plan_request(&mut instance),
        }

        let Some(active) = instance.plan_in_progress().map(|p| p.name.clone()) else {
            tracing::debug!(instance = %instance_ref, "no plan in progress");
            return Ok(ReconcileOutcome::idle(&instance));
        };

        let plan = match prepare_plan_execution(&instance, &operator_version, &active, &meta) {
            Ok(plan) => plan,
            Err(err) => {
                // Nothing is persisted: the plan resumes once the catalogue is fixed.
                tracing::warn!(
                    instance = %instance_ref,
                    plan = %active,
                    error = %err,
                    "plan cannot be prepared"
                );
                self.event_sink
                    .emit(Event::FatalError {
                        instance: instance_ref,
                        plan: active.clone(),
                        event_name: err.event_name.clone(),
                        message: err.message.clone(),
                    })
                    .await;
                return Ok(ReconcileOutcome {
                    plan: Some(active),
                    status: None,
                    error: Some(err),
                    passes: 1,
                });
            }
        };
        let outcome = self.executor.execute(&plan, &meta, now).await;

        let status = outcome.status.clone();
        instance.update_plan_status(outcome.status);
        self.store.put_instance(&instance).await?;

        if status.is_terminal() {
            tracing::info!(instance = %instance_ref, plan = %active, status = %status.status, "plan finished");
            self.event_sink
                .emit(Event::PlanFinished {
                    instance: instance_ref,
                    plan: active.clone(),
                    status: status.status,
                })
                .await;
        }

        Ok(ReconcileOutcome {
            plan: Some(active),
            status: Some(status),
            error: outcome.error,
            passes: 1,
        })
    }

    /// Reconciles repeatedly until the active plan is terminal, nothing is active,
    /// or `max_passes` is reached.
    pub async fn run_until_terminal(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let mut passes = 0;
        loop {
            let mut outcome = self.reconcile(namespace, name, Utc::now()).await?;
            let idle = outcome.passes == 0;
            passes += outcome.passes;
            outcome.passes = passes;

            let exhausted = self.config.max_passes.is_some_and(|max| passes >= max);
            if idle || outcome.is_settled() || exhausted {
                if exhausted && !outcome.is_settled() {
                    tracing::warn!(namespace, name, passes, "stopped before the plan finished");
                }
                return Ok(outcome);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn start_plan(
        &self,
        instance: &mut Instance,
        operator_version: &OperatorVersion,
        plan_name: &str,
        instance_ref: &InstanceRef,
    ) {
        let Some(plan) = operator_version.plan(plan_name) else {
            return;
        };
        tracing::info!(instance = %instance_ref, plan = plan_name, "starting plan");
        instance.update_plan_status(PlanStatus::provision(plan_name, plan));
        instance.status.last_applied_parameters = Some(instance.spec.parameters.clone());
        if instance.spec.plan_execution.as_deref() == Some(plan_name) {
            instance.spec.plan_execution = None;
        }
        self.event_sink
            .emit(Event::PlanTriggered {
                instance: instance_ref.clone(),
                plan: plan_name.to_string(),
            })
            .await;
    }
}
