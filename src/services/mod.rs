pub mod controller;
pub mod gate;
pub mod render;
pub mod reprompt;
pub mod schema;

#[cfg(test)]
pub(crate) mod testutil;

pub use controller::{ControllerError, TodoOverrides, TransitionOutcome, WorkflowController};
pub use gate::GateEvaluator;
pub use render::render_reprompt;
pub use reprompt::{
    FailureHook, RepromptScheduler, SchedulerConfig, SchedulerError, SchedulerHandle,
    SchedulerStatus,
};
pub use schema::SchemaRegistry;
