use uuid::Uuid;

/// Identity of the operator and the owning instance for one engine invocation.
/// Used for naming and diagnostics only.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Metadata {
    pub operator_name: String,
    pub operator_version_name: String,
    pub operator_version: String,
    pub app_version: String,
    pub instance_name: String,
    pub instance_namespace: String,
    pub instance_uid: Uuid,
}

/// Execution metadata scoped to a single task of a plan.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct TaskMetadata {
    #[serde(flatten)]
    pub meta: Metadata,
    pub plan_name: String,
    pub phase_name: String,
    pub step_name: String,
    pub task_name: String,
}

impl TaskMetadata {
    pub fn new(meta: &Metadata, plan: &str, phase: &str, step: &str, task: &str) -> Self {
        Self {
            meta: meta.clone(),
            plan_name: plan.to_string(),
            phase_name: phase.to_string(),
            step_name: step.to_string(),
            task_name: task.to_string(),
        }
    }

    /// `namespace/instance plan.phase.step.task`, used in error messages.
    pub fn path(&self) -> String {
        format!(
            "{}/{} {}.{}.{}.{}",
            self.meta.instance_namespace,
            self.meta.instance_name,
            self.plan_name,
            self.phase_name,
            self.step_name,
            self.task_name
        )
    }
}
