use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Delay between passes in [`Reconciler::run_until_terminal`](super::Reconciler::run_until_terminal).
    pub poll_interval: Duration,
    /// Stop after this many passes even if the plan is not terminal. `None` means no limit.
    pub max_passes: Option<usize>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_passes: Some(1000),
        }
    }
}
