use serde_json::Value;

use opflow_core::template::{render_objects, RenderContext};

use crate::client::{ClientError, ObjectRef};
use crate::executor::{ExecutionError, INVALID_RESOURCE, TEMPLATE_RENDER_ERROR};
use crate::task::TaskContext;

/// Renders the named templates and runs the enhancer over the result.
pub(crate) async fn render_resources(
    ctx: &TaskContext<'_>,
    names: &[String],
) -> Result<Vec<Value>, ExecutionError> {
    let render_ctx = RenderContext {
        params: ctx.params,
        pipes: ctx.pipes,
        meta: &ctx.meta,
    };
    let mut objects = Vec::new();
    for name in names {
        let rendered = render_objects(ctx.templates, name, &render_ctx).map_err(|e| {
            ExecutionError::fatal(
                TEMPLATE_RENDER_ERROR,
                format!("{}: rendering {name}: {e}", ctx.meta.path()),
            )
        })?;
        objects.extend(rendered);
    }
    enhance(ctx, objects).await
}

pub(crate) async fn enhance(
    ctx: &TaskContext<'_>,
    objects: Vec<Value>,
) -> Result<Vec<Value>, ExecutionError> {
    ctx.enhancer
        .enhance(objects, &ctx.meta)
        .await
        .map_err(|e| ExecutionError::fatal(INVALID_RESOURCE, format!("{}: {e}", ctx.meta.path())))
}

pub(crate) fn object_ref(ctx: &TaskContext<'_>, obj: &Value) -> Result<ObjectRef, ExecutionError> {
    ObjectRef::from_object(obj).map_err(|e| client_error(ctx, e))
}

/// Prefixes a client failure with the task path, keeping its fatal/transient class.
pub(crate) fn client_error(ctx: &TaskContext<'_>, e: ClientError) -> ExecutionError {
    let mut err = ExecutionError::from(e);
    err.message = format!("{}: {}", ctx.meta.path(), err.message);
    err
}
