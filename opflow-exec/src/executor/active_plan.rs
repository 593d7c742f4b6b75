use std::collections::BTreeMap;

use opflow_core::types::{Plan, PlanStatus, TaskSpec};

/// Everything one engine pass needs. Assembled fresh by the driver for every pass.
///
/// On construction the plan definition is aligned positionally with the status tree and the task
/// catalogue, so the engine addresses statuses and tasks by index. Entries the status
/// tree or catalogue lack are kept as `None` and reported when the engine reaches them.
#[derive(Debug, Clone)]
pub struct ActivePlan {
    name: String,
    spec: Plan,
    status: PlanStatus,
    tasks: Vec<TaskSpec>,
    templates: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    pipes: BTreeMap<String, String>,
    layout: Vec<PhaseSlot>,
}

#[derive(Debug, Clone)]
pub(crate) struct PhaseSlot {
    pub status: Option<usize>,
    pub steps: Vec<StepSlot>,
}

#[derive(Debug, Clone)]
pub(crate) struct StepSlot {
    pub status: Option<usize>,
    pub tasks: Vec<Option<usize>>,
}

impl ActivePlan {
    pub fn new(
        name: impl Into<String>,
        spec: Plan,
        status: PlanStatus,
        tasks: Vec<TaskSpec>,
        templates: BTreeMap<String, String>,
        params: BTreeMap<String, String>,
        pipes: BTreeMap<String, String>,
    ) -> Self {
        let layout = build_layout(&spec, &status, &tasks);
        Self {
            name: name.into(),
            spec,
            status,
            tasks,
            templates,
            params,
            pipes,
            layout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &Plan {
        &self.spec
    }

    pub fn status(&self) -> &PlanStatus {
        &self.status
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn templates(&self) -> &BTreeMap<String, String> {
        &self.templates
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn pipes(&self) -> &BTreeMap<String, String> {
        &self.pipes
    }

    pub(crate) fn phase_slot(&self, phase: usize) -> &PhaseSlot {
        &self.layout[phase]
    }

    pub(crate) fn task_spec(&self, phase: usize, step: usize, task: usize) -> Option<&TaskSpec> {
        self.layout[phase].steps[step].tasks[task].map(|i| &self.tasks[i])
    }
}

fn build_layout(spec: &Plan, status: &PlanStatus, tasks: &[TaskSpec]) -> Vec<PhaseSlot> {
    spec.phases
        .iter()
        .map(|ph| {
            let phase_idx = status.phase_index(&ph.name);
            let phase_status = phase_idx.map(|i| &status.phases[i]);
            PhaseSlot {
                status: phase_idx,
                steps: ph
                    .steps
                    .iter()
                    .map(|st| StepSlot {
                        status: phase_status.and_then(|p| p.step_index(&st.name)),
                        tasks: st
                            .tasks
                            .iter()
                            .map(|tn| tasks.iter().position(|t| &t.name == tn))
                            .collect(),
                    })
                    .collect(),
            }
        })
        .collect()
}
