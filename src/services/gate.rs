//! Quality gate evaluation.
//!
//! A gate decides whether a stage's recorded outputs are good enough to
//! exit the stage. The evaluator is a pure function of (stage config,
//! outputs, retry count) plus an audit-log side channel; it never fails on
//! malformed input — records that match no schema simply contribute nothing.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::models::{GateAction, GateConfig, GateResult, Stage};
use crate::domain::ports::{EvidenceProbe, StateStore, StoreError};

use super::schema::SchemaRegistry;

/// Stage-exit gate evaluator.
#[derive(Clone)]
pub struct GateEvaluator {
    registry: SchemaRegistry,
    config: GateConfig,
    probe: Arc<dyn EvidenceProbe>,
}

impl GateEvaluator {
    pub fn new(config: GateConfig, probe: Arc<dyn EvidenceProbe>) -> Self {
        Self { registry: SchemaRegistry::new(), config, probe }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Evaluate a stage's outputs and select an action.
    ///
    /// Action priority: valid → `Proceed`; retry budget exhausted →
    /// `Escalate` (checked first so an exhausted stage never degrades to
    /// `Stop`); more errors than the stop threshold → `Stop`; otherwise
    /// `Revise`.
    pub fn evaluate(&self, stage: Stage, outputs: &[Value], retry: u32) -> GateResult {
        let mut checked: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for output in outputs {
            let Some(schema_name) = self.registry.detect(output) else {
                continue;
            };
            let (_, schema_errors) = self.registry.validate(output, schema_name);
            if !checked.iter().any(|c| c == schema_name) {
                checked.push(schema_name.to_string());
            }
            errors.extend(schema_errors.into_iter().map(|e| format!("[{schema_name}] {e}")));
        }

        for required in self.registry.required_for(stage) {
            if !checked.iter().any(|c| c == *required) {
                errors.push(format!("Missing required schema: {required}"));
            }
        }

        if self.config.enforce_evidence_files {
            for output in outputs {
                let location = output
                    .get("evidence")
                    .and_then(|e| e.get("location"))
                    .and_then(Value::as_str);
                if let Some(location) = location {
                    if !location.is_empty() && !self.probe.exists(Path::new(location)) {
                        errors.push(format!("Evidence file missing: {location}"));
                    }
                }
            }
        }

        let action = if errors.is_empty() {
            GateAction::Proceed
        } else if retry >= self.config.max_retries {
            GateAction::Escalate
        } else if errors.len() > self.config.stop_error_threshold {
            GateAction::Stop
        } else {
            GateAction::Revise
        };

        let result = GateResult::new(stage.gate_name(), checked, errors, action, retry);
        tracing::debug!(
            stage = %stage,
            action = %result.action,
            errors = result.errors.len(),
            checked = ?result.checked,
            "gate evaluated"
        );
        result
    }

    /// Evaluate and append the result to the workflow's gate log.
    ///
    /// Returns the result and its log sequence number. Every evaluation gets
    /// a distinct, sequence-numbered entry, so checks from the controller
    /// and the scheduler can interleave without overwriting each other.
    pub fn evaluate_and_log(
        &self,
        store: &dyn StateStore,
        workflow_id: &str,
        stage: Stage,
        outputs: &[Value],
        retry: u32,
    ) -> Result<(GateResult, u64), StoreError> {
        let result = self.evaluate(stage, outputs, retry);
        let seq = store.append_gate_result(workflow_id, &result)?;
        Ok((result, seq))
    }
}
