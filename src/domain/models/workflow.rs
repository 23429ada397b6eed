//! Workflow aggregate root.
//!
//! One `WorkflowState` owns everything a workflow produces: todos, evidence,
//! per-stage outputs, retry counters, and the completed-stage history. It is
//! created once at startup, mutated by every factory call and transition,
//! persisted wholesale after each mutation, and never deleted — terminal
//! stages stop further transitions but the record remains for audit.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::stage::Stage;

/// Aggregate state for one workflow, also the persisted document shape.
///
/// Serialized as a single JSON document and replaced in full on every save,
/// so a reader never observes a torn write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Unique id, `YYYYMMDD_HHMMSS_xxxxxxxx`.
    pub workflow_id: String,
    /// Stage the workflow is currently in.
    pub current_stage: Stage,
    /// Stages exited through a passing gate, in order.
    pub completed_stages: Vec<Stage>,
    /// Todo records, wire shape.
    pub todos: Vec<Value>,
    /// Evidence records, wire shape (wrapped under `evidence`).
    pub evidence: Vec<Value>,
    /// Untyped stage outputs recorded against each stage attempt.
    #[serde(default)]
    pub outputs: HashMap<String, Vec<Value>>,
    /// Workflow start time.
    pub start_time: DateTime<Utc>,
    /// Failed gate attempts per stage.
    pub retry_counts: HashMap<Stage, u32>,
    /// The objective this workflow is enforcing progress toward.
    pub user_objective: String,
    /// Last save time, RFC 3339.
    pub timestamp: String,
}

impl WorkflowState {
    /// Create a fresh workflow in `Startup`.
    pub fn new(user_objective: impl Into<String>) -> Self {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let workflow_id = format!("{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..8]);
        Self {
            workflow_id,
            current_stage: Stage::Startup,
            completed_stages: Vec::new(),
            todos: Vec::new(),
            evidence: Vec::new(),
            outputs: HashMap::new(),
            start_time: now,
            retry_counts: HashMap::new(),
            user_objective: user_objective.into(),
            timestamp: now.to_rfc3339(),
        }
    }

    /// Short id embedded in evidence ids.
    pub fn short_id(&self) -> &str {
        &self.workflow_id[..self.workflow_id.len().min(8)]
    }

    /// Failed gate attempts for a stage.
    pub fn retry_count(&self, stage: Stage) -> u32 {
        self.retry_counts.get(&stage).copied().unwrap_or(0)
    }

    /// Record a failed gate attempt for a stage.
    pub fn increment_retry(&mut self, stage: Stage) -> u32 {
        let count = self.retry_counts.entry(stage).or_insert(0);
        *count += 1;
        *count
    }

    /// Record an untyped output against a stage attempt.
    pub fn record_output(&mut self, stage: Stage, output: Value) {
        self.outputs.entry(stage.as_str().to_string()).or_default().push(output);
    }

    /// Everything the gate sees when evaluating `stage`: outputs recorded
    /// against that stage only. Artifacts from a different stage attempt do
    /// not carry over — the second review does not inherit the first's.
    pub fn stage_outputs(&self, stage: Stage) -> Vec<Value> {
        self.outputs.get(stage.as_str()).cloned().unwrap_or_default()
    }

    /// Next evidence sequence number for a stage, 1-based.
    ///
    /// Counts existing evidence ids with the stage's gate-name prefix, so
    /// the embedded `-NNN` suffix keeps incrementing per stage.
    pub fn next_evidence_seq(&self, stage: Stage) -> u32 {
        let prefix = format!("E-{}-", stage.gate_name());
        let count = self
            .evidence
            .iter()
            .filter_map(|e| e.get("evidence").and_then(|e| e.get("id")).and_then(Value::as_str))
            .filter(|id| id.starts_with(&prefix))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// Touch the save timestamp. Called by the store on every save.
    pub fn touch(&mut self) {
        self.timestamp = Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_workflow_starts_in_startup() {
        let state = WorkflowState::new("ship the feature");
        assert_eq!(state.current_stage, Stage::Startup);
        assert!(state.completed_stages.is_empty());
        assert_eq!(state.retry_count(Stage::Plan), 0);
        assert_eq!(state.user_objective, "ship the feature");
        // YYYYMMDD_HHMMSS_xxxxxxxx
        assert_eq!(state.workflow_id.len(), 24);
    }

    #[test]
    fn test_retry_counter_increments_per_stage() {
        let mut state = WorkflowState::new("obj");
        assert_eq!(state.increment_retry(Stage::Plan), 1);
        assert_eq!(state.increment_retry(Stage::Plan), 2);
        assert_eq!(state.retry_count(Stage::Plan), 2);
        assert_eq!(state.retry_count(Stage::Test), 0);
    }

    #[test]
    fn test_stage_outputs_are_isolated_per_stage() {
        let mut state = WorkflowState::new("obj");
        state.record_output(Stage::Review, json!({"review_gate": {"approved": true}}));
        assert_eq!(state.stage_outputs(Stage::Review).len(), 1);
        assert!(state.stage_outputs(Stage::ReviewPost).is_empty());
    }

    #[test]
    fn test_evidence_seq_counts_gate_name_prefix() {
        let mut state = WorkflowState::new("obj");
        assert_eq!(state.next_evidence_seq(Stage::Plan), 1);
        state.evidence.push(json!({"evidence": {"id": "E-PLAN-abc-001"}}));
        state.evidence.push(json!({"evidence": {"id": "E-PLAN-abc-002"}}));
        state.evidence.push(json!({"evidence": {"id": "E-TEST-abc-001"}}));
        assert_eq!(state.next_evidence_seq(Stage::Plan), 3);
        assert_eq!(state.next_evidence_seq(Stage::Test), 2);
        // ReviewPost shares the REVIEW prefix.
        state.evidence.push(json!({"evidence": {"id": "E-REVIEW-abc-001"}}));
        assert_eq!(state.next_evidence_seq(Stage::ReviewPost), 2);
    }

    #[test]
    fn test_document_serde_roundtrip() {
        let mut state = WorkflowState::new("obj");
        state.increment_retry(Stage::Implement);
        state.todos.push(json!({"id": "1.1"}));
        state.record_output(Stage::Plan, json!({"id": "1.1"}));
        let doc = serde_json::to_string(&state).unwrap();
        let back: WorkflowState = serde_json::from_str(&doc).unwrap();
        assert_eq!(state, back);
        // Retry map keys serialize as stage names.
        let value: Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(value["retry_counts"]["IMPLEMENT"], 1);
        assert_eq!(value["current_stage"], "STARTUP");
    }
}
