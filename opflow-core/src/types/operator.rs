use std::collections::BTreeMap;

use crate::types::{Plan, TaskSpec};

pub const DEPLOY_PLAN_NAME: &str = "deploy";
pub const UPDATE_PLAN_NAME: &str = "update";

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Plan to run when this parameter changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The operator's catalogue: plans, tasks, templates and parameter defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OperatorVersion {
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    pub operator: String,

    pub version: String,

    #[serde(rename = "appVersion", default)]
    pub app_version: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub plans: BTreeMap<String, Plan>,

    #[serde(default)]
    pub tasks: Vec<TaskSpec>,

    /// Raw template sources keyed by file name.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

impl OperatorVersion {
    pub fn plan(&self, name: &str) -> Option<&Plan> {
        self.plans.get(name)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}
