mod expr;
mod parse;
mod render;

pub use expr::{parse_template_expr, TemplateExpr, TemplateExprError};
pub use parse::{parse_template, Segment, Template, TemplateError};
pub use render::{render, render_objects, render_str, RenderContext};
