//! Shared fixtures for integration tests.

use serde_json::{json, Value};

use stageward::Stage;

/// Wire-shape records that satisfy each gate's required schemas. `stage`
/// is the gate name (REVIEW_POST submits under REVIEW).
pub fn todo_record(stage: &str) -> Value {
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

pub fn evidence_record(stage: &str, seq: u32) -> Value {
    json!({
        "evidence": {
            "id": format!("E-{stage}-itest001-{seq:03}"),
            "type": "log",
            "claim": "artifact recorded",
            "location": format!("/tmp/wf/evidence/{}.log", stage.to_lowercase()),
            "timestamp": "2026-01-04T07:00:00Z",
            "verified": true,
            "verified_by": "agent"
        }
    })
}

pub fn review_gate_record(stage: &str) -> Value {
    json!({
        "review_gate": {
            "stage": stage,
            "agent": "reviewer",
            "timestamp": "2026-01-04T07:05:00Z",
            "criteria_checked": ["completeness", "evidence"],
            "approved": true,
            "action": "proceed"
        }
    })
}

pub fn conflict_record() -> Value {
    json!({
        "conflict": {
            "id": "C-20260104T070000",
            "type": "plan_disagreement",
            "parties": ["executor", "disruptor"],
            "positions": ["ship now", "harden first"],
            "resolution": "harden first"
        }
    })
}

pub fn metrics_record(workflow_id: &str) -> Value {
    json!({
        "metrics": {
            "workflow_id": workflow_id,
            "timestamp": "2026-01-04T08:00:00Z",
            "total_time_min": 42,
            "stages": {"PLAN": 10, "IMPLEMENT": 20},
            "agents": {"executor": 1},
            "evidence": {"count": 6},
            "quality": {"gate_failures": 1}
        }
    })
}

pub fn skill_record() -> Value {
    json!({
        "skill": {
            "name": "json-schema-validation",
            "source": "workflow",
            "purpose": "validate artifacts before gate checks",
            "interface": "validate(record, schema) -> errors",
            "tested": true,
            "evidence_location": "/tmp/wf/evidence/skill.log"
        }
    })
}

/// Everything a stage's gate requires, keyed by the stage itself.
pub fn satisfying_records(stage: Stage, workflow_id: &str) -> Vec<Value> {
    let gate = stage.gate_name();
    match gate {
        "PLAN" | "IMPLEMENT" => vec![todo_record(gate), evidence_record(gate, 1)],
        "REVIEW" | "VALIDATE" => vec![review_gate_record(gate), evidence_record(gate, 1)],
        "DISRUPT" => vec![conflict_record(), evidence_record(gate, 1)],
        "TEST" => vec![evidence_record(gate, 1), metrics_record(workflow_id)],
        "LEARN" => vec![skill_record(), metrics_record(workflow_id)],
        _ => Vec::new(),
    }
}
