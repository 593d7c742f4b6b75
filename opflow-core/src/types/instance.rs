use std::collections::BTreeMap;

use uuid::Uuid;

use crate::types::{ExecutionStatus, PlanStatus};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Instance {
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub uid: Uuid,

    pub spec: InstanceSpec,

    #[serde(default)]
    pub status: InstanceStatus,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InstanceSpec {
    /// Name of the operator version in the instance's namespace.
    #[serde(rename = "operatorVersion")]
    pub operator_version: String,

    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    /// Explicitly requested plan; takes precedence over parameter triggers.
    #[serde(rename = "planExecution", default, skip_serializing_if = "Option::is_none")]
    pub plan_execution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct InstanceStatus {
    #[serde(rename = "planStatus", default)]
    pub plan_status: BTreeMap<String, PlanStatus>,

    #[serde(rename = "aggregatedStatus", default, skip_serializing_if = "Option::is_none")]
    pub aggregated: Option<AggregatedStatus>,

    /// Parameters the last started plan was run with.
    #[serde(
        rename = "lastAppliedParameters",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_applied_parameters: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AggregatedStatus {
    #[serde(rename = "activePlanName")]
    pub active_plan_name: String,
    pub status: ExecutionStatus,
}

impl Instance {
    /// The plan currently executing, if any.
    pub fn plan_in_progress(&self) -> Option<&PlanStatus> {
        let active = self.status.aggregated.as_ref()?;
        self.status
            .plan_status
            .get(&active.active_plan_name)
            .filter(|p| !p.status.is_terminal())
    }

    /// Records `status` as the instance's status for its plan and refreshes the aggregate.
    pub fn update_plan_status(&mut self, status: PlanStatus) {
        self.status.aggregated = Some(AggregatedStatus {
            active_plan_name: status.name.clone(),
            status: status.status,
        });
        self.status.plan_status.insert(status.name.clone(), status);
    }

    pub fn has_run_any_plan(&self) -> bool {
        self.status.aggregated.is_some()
    }
}
