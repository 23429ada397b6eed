//! Typed workflow artifacts: todo and evidence records.
//!
//! These are the discriminated forms used at the system boundary. The gate
//! pipeline itself operates on untyped JSON so external, hand-written
//! artifacts flow through the same validation path; `to_value` produces the
//! exact wire shape the schema registry expects.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of a todo record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Failed,
}

impl Default for TodoStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Priority of a todo record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    High,
    Medium,
    Low,
}

impl TodoPriority {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl Default for TodoPriority {
    fn default() -> Self {
        Self::Medium
    }
}

/// The 13 required metadata fields of a todo record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoMetadata {
    pub objective: String,
    pub success_criteria: String,
    pub fail_criteria: String,
    pub evidence_required: String,
    pub evidence_location: String,
    pub agent_model: String,
    pub workflow: String,
    pub blocked_by: Vec<String>,
    pub parallel: bool,
    pub workflow_stage: String,
    pub instructions_set: String,
    pub time_budget: String,
    pub reviewer: String,
}

/// A fully specified unit of work: 4 top-level fields plus 13 metadata
/// fields, all required non-empty by the `todo` schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoRecord {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub metadata: TodoMetadata,
}

impl TodoRecord {
    /// Wire shape consumed by the schema registry and the state document.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Kind of artifact an evidence record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Log,
    Output,
    TestResult,
    Diff,
    Screenshot,
    ApiResponse,
}

impl Default for EvidenceType {
    fn default() -> Self {
        Self::Log
    }
}

/// Who vouched for an evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifiedBy {
    #[serde(rename = "agent")]
    Agent,
    #[serde(rename = "third-party")]
    ThirdParty,
    #[serde(rename = "user")]
    User,
}

/// An artifact asserting a verifiable claim, backed by a file at `location`.
///
/// Ids follow `E-{STAGE}-{shortid}-{seq:03}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub evidence_type: EvidenceType,
    pub claim: String,
    pub location: String,
    pub timestamp: String,
    pub verified: bool,
    pub verified_by: VerifiedBy,
}

impl EvidenceRecord {
    /// Build a record with the standard defaults: type `log`, current
    /// timestamp, `verified=true`, `verified_by=agent`.
    pub fn new(id: impl Into<String>, claim: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            evidence_type: EvidenceType::Log,
            claim: claim.into(),
            location: location.into(),
            timestamp: Utc::now().to_rfc3339(),
            verified: true,
            verified_by: VerifiedBy::Agent,
        }
    }

    /// Wire shape: evidence travels wrapped under an `evidence` key.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "evidence": self })
    }
}
