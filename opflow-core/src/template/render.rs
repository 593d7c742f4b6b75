use std::collections::BTreeMap;

use serde::Deserialize;

use super::expr::TemplateExpr;
use super::parse::{parse_template, Segment, Template, TemplateError};
use crate::types::TaskMetadata;

/// Values a template may reference while rendering one task's resources.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub params: &'a BTreeMap<String, String>,
    pub pipes: &'a BTreeMap<String, String>,
    pub meta: &'a TaskMetadata,
}

impl RenderContext<'_> {
    fn resolve(&self, expr: &TemplateExpr) -> Result<String, TemplateError> {
        let meta = &self.meta.meta;
        let value = match expr {
            TemplateExpr::Params(key) => self
                .params
                .get(key)
                .cloned()
                .ok_or_else(|| TemplateError::MissingParam(key.clone()))?,
            TemplateExpr::Pipes(key) => self
                .pipes
                .get(key)
                .cloned()
                .ok_or_else(|| TemplateError::MissingPipe(key.clone()))?,
            TemplateExpr::Name => meta.instance_name.clone(),
            TemplateExpr::Namespace => meta.instance_namespace.clone(),
            TemplateExpr::OperatorName => meta.operator_name.clone(),
            TemplateExpr::OperatorVersion => meta.operator_version.clone(),
            TemplateExpr::AppVersion => meta.app_version.clone(),
            TemplateExpr::PlanName => self.meta.plan_name.clone(),
            TemplateExpr::PhaseName => self.meta.phase_name.clone(),
            TemplateExpr::StepName => self.meta.step_name.clone(),
            TemplateExpr::TaskName => self.meta.task_name.clone(),
        };
        Ok(value)
    }
}

pub fn render(template: &Template, ctx: &RenderContext<'_>) -> Result<String, TemplateError> {
    let mut out = String::new();
    for seg in &template.segments {
        match seg {
            Segment::Literal(s) => out.push_str(s),
            Segment::Expr(e) => out.push_str(&ctx.resolve(e)?),
        }
    }
    Ok(out)
}

pub fn render_str(input: &str, ctx: &RenderContext<'_>) -> Result<String, TemplateError> {
    render(&parse_template(input)?, ctx)
}

/// Renders the named template and parses the result as one or more YAML documents.
/// Empty documents are skipped.
pub fn render_objects(
    templates: &BTreeMap<String, String>,
    name: &str,
    ctx: &RenderContext<'_>,
) -> Result<Vec<serde_json::Value>, TemplateError> {
    let source = templates
        .get(name)
        .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
    let rendered = render_str(source, ctx)?;

    let mut objects = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(&rendered) {
        let value = serde_json::Value::deserialize(doc).map_err(|e| {
            TemplateError::InvalidDocument {
                name: name.to_string(),
                message: e.to_string(),
            }
        })?;
        if !value.is_null() {
            objects.push(value);
        }
    }
    Ok(objects)
}
