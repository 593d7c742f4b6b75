use chrono::{DateTime, Utc};

use crate::types::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum ExecutionStatus {
    #[default]
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETE")]
    Completed,
    /// Retryable: the element stays eligible for execution on the next pass.
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "FATAL_ERROR")]
    FatalError,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::InProgress => "IN_PROGRESS",
            ExecutionStatus::Completed => "COMPLETE",
            ExecutionStatus::Error => "ERROR",
            ExecutionStatus::FatalError => "FATAL_ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::FatalError)
    }

    pub fn is_finished(&self) -> bool {
        *self == ExecutionStatus::Completed
    }

    /// Pending, in-progress and (transiently) errored elements may keep executing.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Pending | ExecutionStatus::InProgress | ExecutionStatus::Error
        )
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StepStatus {
    pub name: String,
    #[serde(default)]
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PhaseStatus {
    pub name: String,
    #[serde(default)]
    pub status: ExecutionStatus,
    #[serde(default)]
    pub steps: Vec<StepStatus>,
}

impl PhaseStatus {
    pub fn step(&self, name: &str) -> Option<&StepStatus> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn step_index(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct PlanStatus {
    pub name: String,
    #[serde(default)]
    pub status: ExecutionStatus,
    #[serde(rename = "lastFinishedRun", default, skip_serializing_if = "Option::is_none")]
    pub last_finished_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub phases: Vec<PhaseStatus>,
}

impl PlanStatus {
    /// Fresh `Pending` status tree with one entry per phase and step of `plan`.
    pub fn provision(plan_name: &str, plan: &Plan) -> Self {
        Self {
            name: plan_name.to_string(),
            status: ExecutionStatus::Pending,
            last_finished_run: None,
            phases: plan
                .phases
                .iter()
                .map(|ph| PhaseStatus {
                    name: ph.name.clone(),
                    status: ExecutionStatus::Pending,
                    steps: ph
                        .steps
                        .iter()
                        .map(|st| StepStatus {
                            name: st.name.clone(),
                            status: ExecutionStatus::Pending,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseStatus> {
        self.phases.iter().find(|p| p.name == name)
    }

    pub fn phase_index(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name == name)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Renders the status as an indented tree, one line per plan/phase/step.
    pub fn to_tree(&self) -> String {
        let mut out = format!("Plan {} [{}]\n", self.name, self.status);
        for ph in &self.phases {
            out.push_str(&format!("  Phase {} [{}]\n", ph.name, ph.status));
            for st in &ph.steps {
                out.push_str(&format!("    Step {} [{}]\n", st.name, st.status));
            }
        }
        out
    }
}
