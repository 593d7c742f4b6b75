#![forbid(unsafe_code)]

//! Data model for the opflow plan execution engine: plan and task specs, the
//! execution status tree, operator catalogues and instances, template rendering
//! and the plan-scoped pipe map.

pub mod error;
pub mod params;
pub mod parser;
pub mod pipes;
pub mod template;
pub mod types;

pub use crate::error::ParseError;
pub use crate::params::{parameter_diff, params_map};
pub use crate::parser::{
    parse_document_str, parse_instance, parse_operator_version, Document, DocumentFormat,
    ParsedDocument,
};
pub use crate::pipes::{pipe_artifact_name, pipes_map, PipeError};
pub use crate::template::{RenderContext, TemplateError};
pub use crate::types::{ExecutionStatus, Instance, Metadata, OperatorVersion, Plan, PlanStatus};
