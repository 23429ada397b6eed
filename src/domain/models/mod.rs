//! Domain models for the workflow-enforcement engine.

pub mod config;
pub mod gate;
pub mod record;
pub mod stage;
pub mod workflow;

pub use config::{Config, GateConfig, LoggingConfig, SchedulerConfig};
pub use gate::{GateAction, GateResult};
pub use record::{
    EvidenceRecord, EvidenceType, TodoMetadata, TodoPriority, TodoRecord, TodoStatus, VerifiedBy,
};
pub use stage::{Stage, STAGE_ORDER};
pub use workflow::WorkflowState;
