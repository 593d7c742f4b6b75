use opflow_core::types::PlanStatus;

use crate::client::ClientError;

pub const MISSING_PHASE_STATUS: &str = "MissingPhaseStatus";
pub const MISSING_STEP_STATUS: &str = "MissingStepStatus";
pub const UNKNOWN_TASK_NAME: &str = "UnknownTaskName";
pub const UNKNOWN_TASK_KIND: &str = "UnknownTaskKind";
pub const INVALID_TASK_SPEC: &str = "InvalidTaskSpec";
pub const INVALID_PLAN: &str = "InvalidPlan";
pub const TASK_EXECUTION_ERROR: &str = "TaskExecutionError";
pub const TEMPLATE_RENDER_ERROR: &str = "TemplateRenderError";
pub const INVALID_RESOURCE: &str = "InvalidResource";
pub const CLIENT_ERROR: &str = "ClientError";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The plan, its status tree or the task catalogue are inconsistent.
    Structural,
    /// A task reported an unrecoverable condition.
    Fatal,
    /// A task failed but may succeed on a later pass.
    Transient,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Structural => "structural",
            ErrorKind::Fatal => "fatal",
            ErrorKind::Transient => "transient",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub kind: ErrorKind,
    /// Name under which the driver reports this error to the user.
    pub event_name: String,
    pub message: String,
}

impl ExecutionError {
    pub fn new(kind: ErrorKind, event_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            event_name: event_name.into(),
            message: message.into(),
        }
    }

    pub fn structural(event_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, event_name, message)
    }

    pub fn fatal(event_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fatal, event_name, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, TASK_EXECUTION_ERROR, message)
    }

    /// Fatal and structural errors abort the plan permanently.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Structural | ErrorKind::Fatal)
    }
}

impl From<ClientError> for ExecutionError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Invalid(_) => ExecutionError::fatal(INVALID_RESOURCE, e.to_string()),
            _ => ExecutionError::new(ErrorKind::Transient, CLIENT_ERROR, e.to_string()),
        }
    }
}

/// Result of one engine pass: the new status, plus the error that aborted the pass, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub status: PlanStatus,
    pub error: Option<ExecutionError>,
}

impl ExecutionOutcome {
    pub fn ok(status: PlanStatus) -> Self {
        Self { status, error: None }
    }

    pub fn failed(status: PlanStatus, error: ExecutionError) -> Self {
        Self {
            status,
            error: Some(error),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn into_result(self) -> Result<PlanStatus, (PlanStatus, ExecutionError)> {
        match self.error {
            None => Ok(self.status),
            Some(e) => Err((self.status, e)),
        }
    }
}
