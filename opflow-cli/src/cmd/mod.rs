pub mod apply;
pub mod events;
pub mod execute;
pub mod params;
pub mod pipes;
pub mod reconcile;
pub mod status;
