//! Reprompt document rendering.
//!
//! Turns a `GateResult` into the corrective-instruction text shown to the
//! operator and written next to the gate log. Output is deterministic for a
//! given result and workflow state: timestamps come from the result, never
//! from the clock.

use std::fmt::Write as _;

use serde_json::Value;

use crate::domain::models::{GateAction, GateResult, Stage, WorkflowState};

use super::schema::SchemaRegistry;

const RULE_HEAVY: &str =
    "================================================================================";
const RULE_LIGHT: &str =
    "--------------------------------------------------------------------------------";

/// Render the full reprompt document for a failed (or passing) gate check.
pub fn render_reprompt(
    stage: Stage,
    result: &GateResult,
    state: &WorkflowState,
    registry: &SchemaRegistry,
    max_retries: u32,
) -> String {
    let required = registry.required_for(stage);
    let missing: Vec<&str> = required
        .iter()
        .filter(|r| !result.checked.iter().any(|c| c.as_str() == **r))
        .copied()
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out, "⛔ QUALITY GATE FAILED");
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out);
    let _ = writeln!(out, "STAGE:        {}", result.stage);
    let _ = writeln!(out, "ATTEMPT:      {}/{max_retries}", result.retry + 1);
    let _ = writeln!(out, "TIMESTAMP:    {}", result.timestamp);
    let _ = writeln!(out, "ACTION:       {}", result.action.as_str().to_uppercase());
    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE_LIGHT}");
    let _ = writeln!(out, "ERRORS ({}):", result.errors.len());
    let _ = writeln!(out, "{RULE_LIGHT}");
    for error in &result.errors {
        let _ = writeln!(out, "  ❌ {error}");
    }

    if !missing.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{RULE_LIGHT}");
        let _ = writeln!(out, "REQUIRED SCHEMAS NOT SATISFIED:");
        let _ = writeln!(out, "{RULE_LIGHT}");
        for name in &missing {
            let _ = writeln!(out, "  ⚠️  {name}: {}", registry.description(name));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE_LIGHT}");
    let _ = writeln!(out, "SCHEMAS CHECKED:");
    let _ = writeln!(out, "{RULE_LIGHT}");
    for name in &result.checked {
        let marker = if required.iter().any(|r| *r == name.as_str()) { "✅" } else { "ℹ️" };
        let _ = writeln!(out, "  {marker} {name}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE_HEAVY}");
    let _ = writeln!(out, "CORRECTIVE ACTION REQUIRED");
    let _ = writeln!(out, "{RULE_HEAVY}");

    match result.action {
        GateAction::Proceed => {
            let _ = writeln!(out, "\nINSTRUCTION: Gate passed. No corrective action needed.");
        }
        GateAction::Revise => {
            let _ = writeln!(out, "\nINSTRUCTION: Fix errors and resubmit stage output.");
            let _ = writeln!(out);
            let _ = writeln!(out, "CHECKLIST:");
            let _ = writeln!(out, "  [ ] All required fields present");
            let _ = writeln!(out, "  [ ] Enum values valid (status, priority, evidence_required, etc.)");
            let _ = writeln!(out, "  [ ] Paths absolute");
            let _ = writeln!(out, "  [ ] Evidence file exists at location");
            let _ = writeln!(out, "  [ ] Timestamps RFC 3339");
            let _ = writeln!(out);
            let _ = writeln!(out, "RESUBMIT COMMAND:");
            let _ = writeln!(
                out,
                "  stageward check --id {} --stage {}",
                state.workflow_id, result.stage
            );
            let _ = writeln!(out);
            let _ = writeln!(out, "REQUIRED SCHEMAS: {required:?}");
        }
        GateAction::Escalate => {
            let _ = writeln!(
                out,
                "\nINSTRUCTION: Max retries ({max_retries}) exceeded. Escalating to a \
                 higher-capability operator."
            );
            let _ = writeln!(out);
            let _ = writeln!(out, "HANDOFF TEMPLATE:");
            let _ = writeln!(out, "{}", render_handoff(stage, result, state));
        }
        GateAction::Stop => {
            let _ = writeln!(out, "\nINSTRUCTION: Critical failure. Workflow terminated.");
            let _ = writeln!(out);
            let _ = writeln!(out, "RECOVERY TEMPLATE:");
            let _ = writeln!(out, "{}", render_recovery(result));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE_HEAVY}");
    out
}

/// Handoff document for escalation: everything another operator needs to
/// resume without re-deriving context.
pub fn render_handoff(stage: Stage, result: &GateResult, state: &WorkflowState) -> String {
    let todos_remaining: Vec<&Value> = state
        .todos
        .iter()
        .filter(|t| t.get("status").and_then(Value::as_str) != Some("completed"))
        .collect();
    let evidence_ids: Vec<&str> = state
        .evidence
        .iter()
        .filter_map(|e| e.get("evidence").and_then(|e| e.get("id")).and_then(Value::as_str))
        .collect();
    let completed: Vec<&str> = state.completed_stages.iter().map(Stage::as_str).collect();

    let handoff = serde_json::json!({
        "handoff": {
            "from_agent": "executor",
            "to_agent": "escalation_operator",
            "timestamp": result.timestamp,
            "context": {
                "user_objective": state.user_objective,
                "current_stage": stage.as_str(),
                "completed_stages": completed,
                "todos_remaining": todos_remaining,
                "evidence_collected": evidence_ids,
                "blockers": result.errors,
                "assumptions": [],
                "memory_refs": []
            },
            "instructions": format!(
                "Quality gate failed after {} attempts. Review and fix.",
                result.retry
            ),
            "expected_output": format!(
                "Valid {} output passing all schema validations",
                result.stage
            )
        }
    });
    serde_json::to_string_pretty(&handoff).unwrap_or_default()
}

/// Recovery record template emitted on STOP.
fn render_recovery(result: &GateResult) -> String {
    // R-YYYYMMDDTHHMMSS, derived from the result timestamp.
    let compact: String = result
        .timestamp
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'T')
        .take(15)
        .collect();
    let recovery = serde_json::json!({
        "recovery": {
            "id": format!("R-{compact}"),
            "trigger": "quality_gate_critical_failure",
            "rollback_to": "last_checkpoint",
            "state_before": "state/current.json",
            "state_after": "state/current.json",
            "success": false,
            "resume_stage": result.stage
        }
    });
    serde_json::to_string_pretty(&recovery).unwrap_or_default()
}
