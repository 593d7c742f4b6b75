use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Metadata, Plan, TaskMetadata, TaskSpec};

/// Upper bound for artifact identifiers (DNS subdomain length).
pub const MAX_ARTIFACT_NAME_LEN: usize = 253;

static INVALID_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9.\-]").expect("valid regex"));

/// Deterministic, plan-scoped identifier for the artifact a pipe task produces for `key`.
pub fn pipe_artifact_name(meta: &TaskMetadata, key: &str) -> String {
    let raw = format!(
        "{}.{}.{}.{}.{}.{}",
        meta.meta.instance_name, meta.plan_name, meta.phase_name, meta.step_name, meta.task_name, key
    )
    .to_lowercase();
    let mut name = INVALID_CHARS_RE.replace_all(&raw, "-").into_owned();
    name.truncate(MAX_ARTIFACT_NAME_LEN);
    name.trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

/// Builds the `{{ .Pipes.<key> }}` map for every pipe task referenced by `plan`.
///
/// Pipe keys are plan-scoped: the same key declared twice anywhere in the plan is an error,
/// and so are two keys whose sanitised artifact names coincide.
pub fn pipes_map(
    plan_name: &str,
    plan: &Plan,
    tasks: &[TaskSpec],
    meta: &Metadata,
) -> Result<BTreeMap<String, String>, PipeError> {
    let mut pipes = BTreeMap::new();
    let mut names = BTreeSet::new();

    for ph in &plan.phases {
        for st in &ph.steps {
            for tn in &st.tasks {
                let Some(task) = tasks.iter().find(|t| &t.name == tn) else {
                    continue;
                };
                if !task.is_pipe() {
                    continue;
                }
                let tmeta = TaskMetadata::new(meta, plan_name, &ph.name, &st.name, tn);
                for pipe in &task.spec.pipe.pipe {
                    if pipes.contains_key(&pipe.key) {
                        return Err(PipeError::DuplicateKey(pipe.key.clone()));
                    }
                    let name = pipe_artifact_name(&tmeta, &pipe.key);
                    if !names.insert(name.clone()) {
                        return Err(PipeError::DuplicateArtifact {
                            key: pipe.key.clone(),
                            name,
                        });
                    }
                    pipes.insert(pipe.key.clone(), name);
                }
            }
        }
    }

    Ok(pipes)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipeError {
    #[error("duplicated pipe key {0}")]
    DuplicateKey(String),
    #[error("pipe key {key} maps to artifact {name}, which another key already uses")]
    DuplicateArtifact { key: String, name: String },
}
