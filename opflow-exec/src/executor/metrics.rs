use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use opflow_core::types::ExecutionStatus;

use crate::executor::{Event, EventSink};

/// Counters for the passes observed by a [`MetricsEventSink`].
#[derive(Debug, Clone, Default)]
pub struct PassMetrics {
    pub plan: String,
    pub status: Option<ExecutionStatus>,
    pub started_at: Option<Instant>,
    pub total_duration: Option<Duration>,
    pub passes: usize,
    pub tasks_run: usize,
    pub tasks_done: usize,
    pub tasks_failed: usize,
    pub steps_completed: usize,
    pub phases_completed: usize,
    pub fatal_errors: usize,
}

impl PassMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "plan": self.plan,
            "status": self.status.map(|s| s.as_str()),
            "duration_ms": self.total_duration.map(|d| d.as_millis() as u64),
            "passes": self.passes,
            "tasks": {
                "run": self.tasks_run,
                "done": self.tasks_done,
                "failed": self.tasks_failed,
            },
            "steps_completed": self.steps_completed,
            "phases_completed": self.phases_completed,
            "fatal_errors": self.fatal_errors,
        })
    }

    fn record(&mut self, event: &Event) {
        match event {
            Event::PlanStarted { plan, .. } | Event::PlanSkipped { plan, .. } => {
                self.plan = plan.clone();
                self.passes += 1;
            }
            Event::TaskStarted { .. } => self.tasks_run += 1,
            Event::TaskFinished { done: true, .. } => self.tasks_done += 1,
            Event::TaskFailed { .. } => self.tasks_failed += 1,
            Event::StepCompleted { .. } => self.steps_completed += 1,
            Event::PhaseCompleted { .. } => self.phases_completed += 1,
            Event::FatalError { .. } => self.fatal_errors += 1,
            Event::PlanFinished { status, .. } => {
                self.status = Some(*status);
                if let Some(started) = self.started_at {
                    self.total_duration = Some(started.elapsed());
                }
            }
            _ => {}
        }
    }
}

#[derive(Default)]
pub struct MetricsCollector {
    metrics: Mutex<PassMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Mutex::new(PassMetrics::new()),
        }
    }

    pub async fn record(&self, event: &Event) {
        self.metrics.lock().await.record(event);
    }

    pub async fn get_metrics(&self) -> PassMetrics {
        self.metrics.lock().await.clone()
    }
}

/// Counts events, then forwards them to `base`.
pub struct MetricsEventSink {
    collector: Arc<MetricsCollector>,
    base: Arc<dyn EventSink>,
}

impl MetricsEventSink {
    pub fn new(collector: Arc<MetricsCollector>, base: Arc<dyn EventSink>) -> Self {
        Self { collector, base }
    }
}

#[async_trait]
impl EventSink for MetricsEventSink {
    async fn emit(&self, event: Event) {
        self.collector.record(&event).await;
        self.base.emit(event).await;
    }
}
