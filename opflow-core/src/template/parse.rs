use super::expr::{parse_template_expr, TemplateExpr, TemplateExprError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Expr(TemplateExpr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    pub fn exprs(&self) -> impl Iterator<Item = &TemplateExpr> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Expr(e) => Some(e),
            Segment::Literal(_) => None,
        })
    }
}

pub fn parse_template(input: &str) -> Result<Template, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }
        let after_open = &rest[start + 2..];
        // No nesting support.
        let Some(end) = after_open.find("}}") else {
            return Err(TemplateError::UnclosedExpression);
        };
        let expr = parse_template_expr(&after_open[..end])?;
        segments.push(Segment::Expr(expr));
        rest = &after_open[end + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(Template { segments })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid template expression: {0}")]
    InvalidExpr(#[from] TemplateExprError),
    #[error("unclosed template expression (missing '}}}}')")]
    UnclosedExpression,
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("missing parameter: {0}")]
    MissingParam(String),
    #[error("missing pipe: {0}")]
    MissingPipe(String),
    #[error("rendered template {name} is not valid YAML: {message}")]
    InvalidDocument { name: String, message: String },
}
