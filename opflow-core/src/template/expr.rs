use std::sync::LazyLock;

use regex::Regex;

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-]+$").expect("valid regex"));

/// A single `{{ ... }}` reference inside a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateExpr {
    Params(String),
    Pipes(String),
    Name,
    Namespace,
    OperatorName,
    OperatorVersion,
    AppVersion,
    PlanName,
    PhaseName,
    StepName,
    TaskName,
}

pub fn parse_template_expr(input: &str) -> Result<TemplateExpr, TemplateExprError> {
    let s = input.trim();
    let s = s.strip_prefix('.').unwrap_or(s);
    if s.is_empty() {
        return Err(TemplateExprError::Empty);
    }

    if let Some(rest) = s.strip_prefix("Params") {
        return Ok(TemplateExpr::Params(parse_key("Params", rest)?));
    }
    if let Some(rest) = s.strip_prefix("Pipes") {
        return Ok(TemplateExpr::Pipes(parse_key("Pipes", rest)?));
    }

    match s {
        "Name" => Ok(TemplateExpr::Name),
        "Namespace" => Ok(TemplateExpr::Namespace),
        "OperatorName" => Ok(TemplateExpr::OperatorName),
        "OperatorVersion" => Ok(TemplateExpr::OperatorVersion),
        "AppVersion" => Ok(TemplateExpr::AppVersion),
        "PlanName" => Ok(TemplateExpr::PlanName),
        "PhaseName" => Ok(TemplateExpr::PhaseName),
        "StepName" => Ok(TemplateExpr::StepName),
        "TaskName" => Ok(TemplateExpr::TaskName),
        other => Err(TemplateExprError::UnknownRoot(other.to_string())),
    }
}

fn parse_key(root: &'static str, rest: &str) -> Result<String, TemplateExprError> {
    let Some(key) = rest.strip_prefix('.') else {
        return Err(TemplateExprError::MissingKey(root));
    };
    if !KEY_RE.is_match(key) {
        return Err(TemplateExprError::InvalidKey(key.to_string()));
    }
    Ok(key.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateExprError {
    #[error("empty template expression")]
    Empty,
    #[error("unknown template root: {0}")]
    UnknownRoot(String),
    #[error("{0} reference must name a key (e.g. .{0}.name)")]
    MissingKey(&'static str),
    #[error("invalid key: {0}")]
    InvalidKey(String),
}
