//! Stageward - Staged Workflow Enforcement
//!
//! Stageward drives agentic work through a fixed stage pipeline
//! (STARTUP through LEARN), holding every stage exit behind a quality gate
//! that validates recorded outputs against declarative record schemas. A
//! background reprompt scheduler re-checks the active stage and writes
//! corrective reprompts when the gate rejects.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): stages, records, workflow state, and the
//!   port contracts
//! - **Service Layer** (`services`): schema registry, gate evaluator,
//!   transition controller, reprompt scheduler
//! - **Adapters** (`adapters`): filesystem persistence, evidence probing,
//!   readiness checks
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, EvidenceRecord, GateAction, GateConfig, GateResult, Stage, TodoPriority, TodoRecord,
    WorkflowState, STAGE_ORDER,
};
pub use domain::ports::{
    EvidenceProbe, ReadinessChecker, ReadinessReport, StageNotifier, StateStore, StoreError,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{GateEvaluator, SchemaRegistry, TransitionOutcome, WorkflowController};
