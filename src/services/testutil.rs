//! Shared in-memory test doubles for service-level tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::models::{GateResult, WorkflowState};
use crate::domain::ports::{
    CheckOutcome, ReadinessChecker, ReadinessReport, StateStore, StoreError,
};

/// In-memory state store: full-replace document map plus an append-only
/// gate log, mirroring the fs adapter's contract.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, WorkflowState>>,
    gate_log: Mutex<Vec<(String, GateResult)>>,
    reprompts: Mutex<Vec<(String, String, u64, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gate_log_len(&self) -> usize {
        self.gate_log.lock().unwrap().len()
    }

    pub fn last_gate_result(&self) -> Option<GateResult> {
        self.gate_log.lock().unwrap().last().map(|(_, r)| r.clone())
    }

    pub fn reprompt_count(&self) -> usize {
        self.reprompts.lock().unwrap().len()
    }
}

impl StateStore for MemoryStore {
    fn save(&self, state: &mut WorkflowState) -> Result<(), StoreError> {
        state.touch();
        self.documents
            .lock()
            .unwrap()
            .insert(state.workflow_id.clone(), state.clone());
        Ok(())
    }

    fn load(&self, workflow_id: &str) -> Result<WorkflowState, StoreError> {
        self.documents
            .lock()
            .unwrap()
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(workflow_id.to_string()))
    }

    fn exists(&self, workflow_id: &str) -> bool {
        self.documents.lock().unwrap().contains_key(workflow_id)
    }

    fn append_gate_result(
        &self,
        workflow_id: &str,
        result: &GateResult,
    ) -> Result<u64, StoreError> {
        let mut log = self.gate_log.lock().unwrap();
        log.push((workflow_id.to_string(), result.clone()));
        Ok(log.len() as u64)
    }

    fn write_reprompt(
        &self,
        workflow_id: &str,
        stage: &str,
        seq: u64,
        text: &str,
    ) -> Result<(), StoreError> {
        self.reprompts.lock().unwrap().push((
            workflow_id.to_string(),
            stage.to_string(),
            seq,
            text.to_string(),
        ));
        Ok(())
    }

    fn evidence_dir(&self, workflow_id: &str) -> PathBuf {
        std::env::temp_dir().join("stageward-test").join(workflow_id).join("evidence")
    }
}

/// Readiness checker with a fixed verdict.
pub struct StaticReadiness {
    pub pass: bool,
}

#[async_trait]
impl ReadinessChecker for StaticReadiness {
    async fn run_checks(&self) -> ReadinessReport {
        if self.pass {
            ReadinessReport::new(vec![CheckOutcome::pass("workflow_dir")])
        } else {
            ReadinessReport::new(vec![
                CheckOutcome::pass("workflow_dir"),
                CheckOutcome::fail("state_store", "round-trip failed"),
            ])
        }
    }
}

/// A schema-valid todo in wire shape.
pub fn valid_todo_value(stage: &str) -> Value {
    json!({
        "id": "1.1",
        "content": "Do the thing",
        "status": "pending",
        "priority": "high",
        "metadata": {
            "objective": "Do the thing",
            "success_criteria": "Thing done",
            "fail_criteria": "Thing not done",
            "evidence_required": "log",
            "evidence_location": "/tmp/wf/evidence/1.1.log",
            "agent_model": "Claude",
            "workflow": "PLAN→REVIEW→DISRUPT→IMPLEMENT→TEST→REVIEW→VALIDATE→LEARN",
            "blocked_by": [],
            "parallel": false,
            "workflow_stage": stage,
            "instructions_set": "AGENTS.md",
            "time_budget": "≤60m",
            "reviewer": "gpt-5.2"
        }
    })
}

/// A schema-valid evidence record in wire shape.
pub fn valid_evidence_value(stage: &str, seq: u32) -> Value {
    json!({
        "evidence": {
            "id": format!("E-{stage}-testwf01-{seq:03}"),
            "type": "log",
            "claim": "artifact recorded",
            "location": format!("/tmp/wf/evidence/{}.log", stage.to_lowercase()),
            "timestamp": "2026-01-04T07:00:00Z",
            "verified": true,
            "verified_by": "agent"
        }
    })
}
