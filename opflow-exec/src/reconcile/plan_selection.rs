use std::collections::{BTreeMap, BTreeSet};

use opflow_core::parameter_diff;
use opflow_core::types::{Instance, OperatorVersion, DEPLOY_PLAN_NAME, UPDATE_PLAN_NAME};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanSelectionError {
    #[error("plan {0} is not defined by the operator version")]
    UnknownPlan(String),
    #[error("changed parameters trigger different plans: {}", .0.iter().cloned().collect::<Vec<_>>().join(", "))]
    ConflictingTriggers(BTreeSet<String>),
}

/// Decides which plan, if any, should be started for `instance`.
///
/// An explicitly requested plan wins. An instance that never ran a plan gets `deploy`.
/// Otherwise parameters changed since the last started plan select the plan their
/// `trigger` names, falling back to `update` when defined and `deploy` otherwise.
/// A plan that is already in progress is not started again; the reconciler then clears an
/// explicit request for it instead of starting it.
pub fn plan_to_execute(
    instance: &Instance,
    operator_version: &OperatorVersion,
) -> Result<Option<String>, PlanSelectionError> {
    let selected = match &instance.spec.plan_execution {
        Some(plan) => Some(plan.clone()),
        None if !instance.has_run_any_plan() => Some(DEPLOY_PLAN_NAME.to_string()),
        None => triggered_plan(instance, operator_version)?,
    };

    let Some(plan) = selected else {
        return Ok(None);
    };
    if operator_version.plan(&plan).is_none() {
        return Err(PlanSelectionError::UnknownPlan(plan));
    }
    if instance.plan_in_progress().is_some_and(|p| p.name == plan) {
        return Ok(None);
    }
    Ok(Some(plan))
}

fn triggered_plan(
    instance: &Instance,
    operator_version: &OperatorVersion,
) -> Result<Option<String>, PlanSelectionError> {
    let empty = BTreeMap::new();
    let last_applied = instance.status.last_applied_parameters.as_ref().unwrap_or(&empty);
    let changed = parameter_diff(last_applied, &instance.spec.parameters);
    if changed.is_empty() {
        return Ok(None);
    }

    let default_trigger = if operator_version.plan(UPDATE_PLAN_NAME).is_some() {
        UPDATE_PLAN_NAME
    } else {
        DEPLOY_PLAN_NAME
    };
    let plans: BTreeSet<String> = changed
        .keys()
        .map(|key| {
            operator_version
                .parameter(key)
                .and_then(|p| p.trigger.clone())
                .unwrap_or_else(|| default_trigger.to_string())
        })
        .collect();

    let mut iter = plans.iter();
    match (iter.next(), iter.next()) {
        (Some(plan), None) => Ok(Some(plan.clone())),
        (None, _) => Ok(None),
        _ => Err(PlanSelectionError::ConflictingTriggers(plans)),
    }
}
