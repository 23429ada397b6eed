//! Persistence port for workflow state and gate audit logs.

use crate::domain::models::{GateResult, WorkflowState};

use super::errors::StoreError;

/// Durable storage for one-document-per-workflow state plus an append-only
/// gate-result log.
///
/// `save` must replace the whole document and flush before returning, so a
/// concurrent reader never observes a torn write. `append_gate_result`
/// assigns a fresh sequence number per entry; interleaved writers (the
/// controller and the reprompt scheduler) therefore never overwrite each
/// other's records.
pub trait StateStore: Send + Sync {
    /// Replace the persisted document for this workflow.
    fn save(&self, state: &mut WorkflowState) -> Result<(), StoreError>;

    /// Load the persisted document wholesale.
    fn load(&self, workflow_id: &str) -> Result<WorkflowState, StoreError>;

    /// Whether a document exists for this workflow.
    fn exists(&self, workflow_id: &str) -> bool;

    /// Append an immutable gate-result entry; returns its sequence number.
    fn append_gate_result(&self, workflow_id: &str, result: &GateResult)
        -> Result<u64, StoreError>;

    /// Write a rendered reprompt document alongside the gate log.
    fn write_reprompt(
        &self,
        workflow_id: &str,
        stage: &str,
        seq: u64,
        text: &str,
    ) -> Result<(), StoreError>;

    /// Directory evidence-file locations default into. Used by the record
    /// factories when no explicit location is given.
    fn evidence_dir(&self, workflow_id: &str) -> std::path::PathBuf;
}
