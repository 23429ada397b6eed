//! Stage transition notification port.

use crate::domain::models::Stage;

/// Sink for the two transition events. Consumers (skill loaders, exporters)
/// are external; the controller only fires the events.
pub trait StageNotifier: Send + Sync {
    fn on_stage_enter(&self, stage: Stage);
    fn on_stage_exit(&self, from: Stage, to: Stage);
}

/// Notifier that records transitions to the tracing log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl StageNotifier for TracingNotifier {
    fn on_stage_enter(&self, stage: Stage) {
        tracing::info!(stage = %stage, "stage entered");
    }

    fn on_stage_exit(&self, from: Stage, to: Stage) {
        tracing::info!(from = %from, to = %to, "stage exited");
    }
}
