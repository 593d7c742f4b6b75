pub const APPLY_TASK_KIND: &str = "Apply";
pub const DELETE_TASK_KIND: &str = "Delete";
pub const WAIT_TASK_KIND: &str = "Wait";
pub const PIPE_TASK_KIND: &str = "Pipe";
pub const DUMMY_TASK_KIND: &str = "Dummy";

/// Catalogue entry for a task. `kind` is kept as a free-form tag so that an
/// unknown kind surfaces when the task is built, not when the document is read.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub spec: TaskParams,
}

impl TaskSpec {
    pub fn is_pipe(&self) -> bool {
        self.kind == PIPE_TASK_KIND
    }
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct TaskParams {
    #[serde(flatten)]
    pub resource: ResourceTaskSpec,
    #[serde(flatten)]
    pub dummy: DummyTaskSpec,
    #[serde(flatten)]
    pub pipe: PipeTaskSpec,
}

/// Shared by apply, delete and wait tasks: template names to render.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ResourceTaskSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct DummyTaskSpec {
    #[serde(rename = "wantErr", default, skip_serializing_if = "std::ops::Not::not")]
    pub want_err: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct PipeTaskSpec {
    /// Template name of the ephemeral unit that produces the artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipe: Vec<PipeSpec>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PipeSpec {
    /// Path of the file the pipe unit writes.
    pub file: String,
    pub kind: PipeKind,
    /// Plan-scoped key templates use as `{{ .Pipes.<key> }}`.
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PipeKind {
    Secret,
    ConfigMap,
}

impl PipeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipeKind::Secret => "Secret",
            PipeKind::ConfigMap => "ConfigMap",
        }
    }
}
