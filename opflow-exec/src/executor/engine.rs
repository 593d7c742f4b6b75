use std::sync::Arc;

use chrono::{DateTime, Utc};

use opflow_core::types::{ExecutionStatus, Metadata, PlanStatus, Strategy};

use crate::client::RemoteClient;
use crate::enhancer::Enhancer;
use crate::executor::active_plan::ActivePlan;
use crate::executor::events::{Event, EventSink, InstanceRef, NoOpEventSink};
use crate::executor::result::{
    ExecutionError, ExecutionOutcome, MISSING_PHASE_STATUS, MISSING_STEP_STATUS,
};
use crate::executor::step_runner::{run_step, StepContext, StepDeps};

/// Advances an active plan by one pass.
pub struct Executor {
    client: Arc<dyn RemoteClient>,
    enhancer: Arc<dyn Enhancer>,
    event_sink: Arc<dyn EventSink>,
}

/// Whether an element is entered, skipped as already finished, or blocks the walk.
enum Eligibility {
    Enter,
    Finished,
    Stop,
}

fn eligibility(status: ExecutionStatus) -> Eligibility {
    if status.is_finished() {
        Eligibility::Finished
    } else if status.is_running() {
        Eligibility::Enter
    } else {
        Eligibility::Stop
    }
}

impl Executor {
    pub fn new(
        client: Arc<dyn RemoteClient>,
        enhancer: Arc<dyn Enhancer>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            client,
            enhancer,
            event_sink,
        }
    }

    /// Runs one pass over `plan` and returns its new status.
    ///
    /// Phases, steps and tasks are visited in declaration order. A serial phase (or plan)
    /// stops at the first step (or phase) that did not complete; a parallel one keeps going.
    /// Every unfinished task in a visited step runs again, so tasks must be idempotent.
    /// A plan already in a terminal state is returned unchanged.
    pub async fn execute(&self, plan: &ActivePlan, meta: &Metadata, now: DateTime<Utc>) -> ExecutionOutcome {
        let instance = InstanceRef::from(meta);

        if plan.status().is_terminal() {
            self.emit(Event::PlanSkipped {
                instance,
                plan: plan.name().to_string(),
                status: plan.status().status,
            })
            .await;
            return ExecutionOutcome::ok(plan.status().clone());
        }

        let mut status = plan.status().clone();
        status.status = ExecutionStatus::InProgress;
        self.emit(Event::PlanStarted {
            instance: instance.clone(),
            plan: plan.name().to_string(),
        })
        .await;

        let spec = plan.spec();
        let mut phases_left = spec.phases.len();

        for (pi, phase) in spec.phases.iter().enumerate() {
            let slot = plan.phase_slot(pi);
            let Some(ps) = slot.status else {
                status.status = ExecutionStatus::FatalError;
                let err = ExecutionError::structural(
                    MISSING_PHASE_STATUS,
                    format!("{instance}: missing phase status {}.{}", plan.name(), phase.name),
                );
                return self.abort(plan, &instance, status, err).await;
            };

            match eligibility(status.phases[ps].status) {
                Eligibility::Finished => {
                    phases_left -= 1;
                    continue;
                }
                Eligibility::Stop => break,
                Eligibility::Enter => {
                    status.phases[ps].status = ExecutionStatus::InProgress;
                    self.emit(Event::PhaseStarted {
                        instance: instance.clone(),
                        plan: plan.name().to_string(),
                        phase: phase.name.clone(),
                    })
                    .await;
                }
            }

            let mut steps_left = phase.steps.len();
            for (si, step) in phase.steps.iter().enumerate() {
                let Some(ss) = slot.steps[si].status else {
                    status.phases[ps].status = ExecutionStatus::FatalError;
                    status.status = ExecutionStatus::FatalError;
                    let err = ExecutionError::structural(
                        MISSING_STEP_STATUS,
                        format!(
                            "{instance}: missing step status {}.{}.{}",
                            plan.name(),
                            phase.name,
                            step.name
                        ),
                    );
                    return self.abort(plan, &instance, status, err).await;
                };

                match eligibility(status.phases[ps].steps[ss].status) {
                    Eligibility::Finished => {
                        steps_left -= 1;
                        continue;
                    }
                    Eligibility::Stop => break,
                    Eligibility::Enter => {
                        status.phases[ps].steps[ss].status = ExecutionStatus::InProgress;
                        self.emit(Event::StepStarted {
                            instance: instance.clone(),
                            plan: plan.name().to_string(),
                            phase: phase.name.clone(),
                            step: step.name.clone(),
                        })
                        .await;
                    }
                }

                let ctx = StepContext {
                    plan,
                    meta,
                    instance: &instance,
                    phase: pi,
                    step: si,
                };
                let deps = StepDeps {
                    client: self.client.as_ref(),
                    enhancer: self.enhancer.as_ref(),
                    event_sink: self.event_sink.as_ref(),
                };
                let run = match run_step(ctx, deps).await {
                    Ok(run) => run,
                    Err(err) => {
                        status.phases[ps].steps[ss].status = ExecutionStatus::FatalError;
                        status.phases[ps].status = ExecutionStatus::FatalError;
                        status.status = ExecutionStatus::FatalError;
                        return self.abort(plan, &instance, status, err).await;
                    }
                };

                if run.errored {
                    status.phases[ps].steps[ss].status = ExecutionStatus::Error;
                }

                if run.tasks_left > 0 {
                    if phase.strategy == Strategy::Serial {
                        self.emit(Event::StepBlocked {
                            instance: instance.clone(),
                            plan: plan.name().to_string(),
                            phase: phase.name.clone(),
                            step: step.name.clone(),
                        })
                        .await;
                        break;
                    }
                } else {
                    status.phases[ps].steps[ss].status = ExecutionStatus::Completed;
                    steps_left -= 1;
                    self.emit(Event::StepCompleted {
                        instance: instance.clone(),
                        plan: plan.name().to_string(),
                        phase: phase.name.clone(),
                        step: step.name.clone(),
                    })
                    .await;
                }
            }

            if steps_left > 0 {
                if spec.strategy == Strategy::Serial {
                    self.emit(Event::PhaseBlocked {
                        instance: instance.clone(),
                        plan: plan.name().to_string(),
                        phase: phase.name.clone(),
                    })
                    .await;
                    break;
                }
            } else {
                status.phases[ps].status = ExecutionStatus::Completed;
                phases_left -= 1;
                self.emit(Event::PhaseCompleted {
                    instance: instance.clone(),
                    plan: plan.name().to_string(),
                    phase: phase.name.clone(),
                })
                .await;
            }
        }

        if phases_left == 0 {
            status.status = ExecutionStatus::Completed;
            status.last_finished_run = Some(now);
            self.emit(Event::PlanCompleted {
                instance,
                plan: plan.name().to_string(),
            })
            .await;
        }

        ExecutionOutcome::ok(status)
    }

    async fn abort(
        &self,
        plan: &ActivePlan,
        instance: &InstanceRef,
        status: PlanStatus,
        err: ExecutionError,
    ) -> ExecutionOutcome {
        self.emit(Event::FatalError {
            instance: instance.clone(),
            plan: plan.name().to_string(),
            event_name: err.event_name.clone(),
            message: err.message.clone(),
        })
        .await;
        ExecutionOutcome::failed(status, err)
    }

    async fn emit(&self, event: Event) {
        self.event_sink.emit(event).await;
    }
}

/// Single-pass entry point without an event sink.
pub async fn execute(
    plan: &ActivePlan,
    meta: &Metadata,
    client: Arc<dyn RemoteClient>,
    enhancer: Arc<dyn Enhancer>,
    now: DateTime<Utc>,
) -> ExecutionOutcome {
    Executor::new(client, enhancer, Arc::new(NoOpEventSink))
        .execute(plan, meta, now)
        .await
}
