//! Quality gate verdicts and audit records.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Verdict produced by a quality gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    /// All required schemas satisfied; the transition may proceed.
    Proceed,
    /// Fix and resubmit; the caller increments its retry counter.
    Revise,
    /// Retry budget exhausted; hand off to a higher-capability operator.
    Escalate,
    /// Unrecoverable within this budget; the workflow moves to Failed.
    Stop,
}

impl GateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Revise => "revise",
            Self::Escalate => "escalate",
            Self::Stop => "stop",
        }
    }
}

impl std::fmt::Display for GateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one quality gate evaluation.
///
/// Created fresh per evaluation and appended to the gate log; never mutated.
/// `stage` carries the gate name (`REVIEW_POST` is recorded as `REVIEW`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    /// Gate name of the evaluated stage.
    pub stage: String,
    /// Whether the evaluation produced zero errors.
    pub valid: bool,
    /// Deduplicated schema names that were detected and validated.
    pub checked: Vec<String>,
    /// Accumulated violations, in detection order.
    pub errors: Vec<String>,
    /// Selected action.
    pub action: GateAction,
    /// Retry count the evaluation was run with.
    pub retry: u32,
    /// RFC 3339 creation timestamp.
    pub timestamp: String,
}

impl GateResult {
    /// Build a result; `valid` is derived from the error list.
    pub fn new(
        stage: impl Into<String>,
        checked: Vec<String>,
        errors: Vec<String>,
        action: GateAction,
        retry: u32,
    ) -> Self {
        Self {
            stage: stage.into(),
            valid: errors.is_empty(),
            checked,
            errors,
            action,
            retry,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
