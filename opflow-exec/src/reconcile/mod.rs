//! Drives instances towards the plan their spec asks for.

mod config;
mod driver;
mod plan_selection;

pub use config::ReconcilerConfig;
pub use driver::{
    metadata, prepare_plan_execution, ReconcileError, ReconcileOutcome, Reconciler,
};
pub use plan_selection::{plan_to_execute, PlanSelectionError};
