//! Declarative schema registry and validator.
//!
//! Each artifact schema is a data-only rule set (required fields,
//! nested-required fields, enums, id patterns, shape checks) interpreted by
//! one generic routine, so adding a schema is a data change, not a code
//! change. Validation accumulates every violation; it never short-circuits
//! and never fails on malformed input.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::models::Stage;

/// Sub-objects that may carry nested required fields.
const NESTED_KEYS: [&str; 2] = ["metadata", "context"];

/// Expected JSON shape for a typed field rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    List,
    Int,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::List => value.is_array(),
            Self::Int => value.is_i64() || value.is_u64(),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::List => "list",
            Self::Int => "int",
        }
    }
}

/// One declarative schema: the full rule set for an artifact shape.
#[derive(Debug, Clone)]
pub struct SchemaRule {
    /// Schema name, also the wrapper key for wrapped artifacts.
    pub name: &'static str,
    /// One-line description used by reprompt rendering.
    pub description: &'static str,
    /// Required top-level fields; must be present and non-empty.
    pub required: &'static [&'static str],
    /// Required fields one level under `metadata` or `context`.
    pub nested_required: &'static [(&'static str, &'static [&'static str])],
    /// Enum-constrained fields and their allowed values.
    pub enums: &'static [(&'static str, &'static [&'static str])],
    /// Pattern-constrained identifier fields.
    pub patterns: &'static [(&'static str, &'static str)],
    /// Shape-constrained fields.
    pub kinds: &'static [(&'static str, FieldKind)],
}

const EVIDENCE_ID_PATTERN: &str = r"^E-[A-Z]+-[\w.]+-\d{3}$";

/// The statically configured schema set.
static SCHEMAS: [SchemaRule; 9] = [
    SchemaRule {
        name: "todo",
        description: "Task with 17 fields: id, content, status, priority, metadata.*",
        required: &["id", "content", "status", "priority", "metadata"],
        nested_required: &[(
            "metadata",
            &[
                "objective",
                "success_criteria",
                "fail_criteria",
                "evidence_required",
                "evidence_location",
                "agent_model",
                "workflow",
                "blocked_by",
                "parallel",
                "workflow_stage",
                "instructions_set",
                "time_budget",
                "reviewer",
            ],
        )],
        enums: &[
            ("status", &["pending", "in_progress", "completed", "blocked", "failed"]),
            ("priority", &["high", "medium", "low"]),
            (
                "evidence_required",
                &["log", "output", "test_result", "diff", "screenshot", "api_response"],
            ),
            (
                "workflow_stage",
                &["PLAN", "REVIEW", "DISRUPT", "IMPLEMENT", "TEST", "VALIDATE", "LEARN"],
            ),
            ("agent_model", &["Claude", "GPT", "Ollama"]),
        ],
        patterns: &[],
        kinds: &[("blocked_by", FieldKind::List), ("parallel", FieldKind::Bool)],
    },
    SchemaRule {
        name: "evidence",
        description: "Proof with id (E-{stage}-{task}-{seq}), type, claim, location, verified",
        required: &["id", "type", "claim", "location", "timestamp", "verified", "verified_by"],
        nested_required: &[],
        enums: &[
            ("type", &["log", "output", "test_result", "diff", "screenshot", "api_response"]),
            ("verified_by", &["agent", "third-party", "user"]),
        ],
        patterns: &[("id", EVIDENCE_ID_PATTERN)],
        kinds: &[("verified", FieldKind::Bool)],
    },
    SchemaRule {
        name: "review_gate",
        description: "Gate result with stage, agent, criteria_checked[], approved, action",
        required: &["stage", "agent", "timestamp", "criteria_checked", "approved", "action"],
        nested_required: &[],
        enums: &[
            ("action", &["proceed", "revise", "escalate"]),
            ("stage", &["PLAN", "REVIEW", "DISRUPT", "IMPLEMENT", "TEST", "VALIDATE", "LEARN"]),
        ],
        patterns: &[],
        kinds: &[("criteria_checked", FieldKind::List), ("approved", FieldKind::Bool)],
    },
    SchemaRule {
        name: "conflict",
        description: "Dispute with id, type, parties[], positions[], resolution",
        required: &["id", "type", "parties", "positions"],
        nested_required: &[],
        enums: &[(
            "type",
            &["plan_disagreement", "evidence_dispute", "priority_conflict", "resource_conflict"],
        )],
        patterns: &[("id", r"^C-\d{8}T\d{6}$")],
        kinds: &[("parties", FieldKind::List), ("positions", FieldKind::List)],
    },
    SchemaRule {
        name: "metrics",
        description: "Stats with workflow_id, stages.*, agents.*, evidence.*, quality.*",
        required: &["workflow_id", "timestamp", "total_time_min", "stages", "agents", "evidence", "quality"],
        nested_required: &[],
        enums: &[],
        patterns: &[],
        kinds: &[("total_time_min", FieldKind::Int)],
    },
    SchemaRule {
        name: "skill",
        description: "Capability with name, source, purpose, interface, tested, evidence_location",
        required: &["name", "source", "purpose", "interface", "tested", "evidence_location"],
        nested_required: &[],
        enums: &[],
        patterns: &[],
        kinds: &[("tested", FieldKind::Bool)],
    },
    SchemaRule {
        name: "startup",
        description: "Readiness result with mcp_verified, scheduler_active, memory_ok, env_ready",
        required: &["mcp_verified", "scheduler_active", "memory_ok", "env_ready", "workflow_dir", "timestamp"],
        nested_required: &[],
        enums: &[],
        patterns: &[],
        kinds: &[
            ("mcp_verified", FieldKind::Bool),
            ("scheduler_active", FieldKind::Bool),
            ("memory_ok", FieldKind::Bool),
            ("env_ready", FieldKind::Bool),
        ],
    },
    SchemaRule {
        name: "recovery",
        description: "Rollback record with id, trigger, rollback_to, states, resume_stage",
        required: &["id", "trigger", "rollback_to", "state_before", "state_after", "success", "resume_stage"],
        nested_required: &[],
        enums: &[(
            "resume_stage",
            &["PLAN", "REVIEW", "DISRUPT", "IMPLEMENT", "TEST", "VALIDATE", "LEARN"],
        )],
        patterns: &[("id", r"^R-\d{8}T\d{6}$")],
        kinds: &[("success", FieldKind::Bool)],
    },
    SchemaRule {
        name: "handoff",
        description: "Transfer with from_agent, to_agent, context.*, instructions",
        required: &["from_agent", "to_agent", "timestamp", "context"],
        nested_required: &[(
            "context",
            &[
                "user_objective",
                "current_stage",
                "completed_stages",
                "todos_remaining",
                "evidence_collected",
                "blockers",
                "assumptions",
                "memory_refs",
            ],
        )],
        enums: &[],
        patterns: &[],
        kinds: &[
            ("completed_stages", FieldKind::List),
            ("todos_remaining", FieldKind::List),
            ("evidence_collected", FieldKind::List),
            ("blockers", FieldKind::List),
            ("assumptions", FieldKind::List),
            ("memory_refs", FieldKind::List),
        ],
    },
];

/// Wrapper keys checked by `detect`, in fixed priority order.
const DETECT_ORDER: [&str; 8] = [
    "evidence", "handoff", "review_gate", "conflict", "metrics", "skill", "startup", "recovery",
];

/// Schemas a stage's gate requires, keyed by gate name.
const QUALITY_GATES: [(&str, &[&str]); 7] = [
    ("PLAN", &["todo", "evidence"]),
    ("REVIEW", &["review_gate", "evidence"]),
    ("DISRUPT", &["conflict", "evidence"]),
    ("IMPLEMENT", &["todo", "evidence"]),
    ("TEST", &["evidence", "metrics"]),
    ("VALIDATE", &["review_gate", "evidence"]),
    ("LEARN", &["skill", "metrics"]),
];

fn compiled_patterns() -> &'static HashMap<&'static str, Regex> {
    static PATTERNS: OnceLock<HashMap<&'static str, Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let mut map = HashMap::new();
        for schema in &SCHEMAS {
            for (_, pattern) in schema.patterns {
                map.entry(*pattern)
                    .or_insert_with(|| Regex::new(pattern).expect("static schema pattern"));
            }
        }
        map
    })
}

/// Registry of the statically configured schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaRegistry;

impl SchemaRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Look up a schema rule by name.
    pub fn rule(&self, name: &str) -> Option<&'static SchemaRule> {
        SCHEMAS.iter().find(|s| s.name == name)
    }

    /// One-line description of a schema, for reprompt rendering.
    pub fn description(&self, name: &str) -> &'static str {
        self.rule(name).map_or("Unknown", |s| s.description)
    }

    /// Names of every registered schema, in declaration order.
    pub fn schema_names(&self) -> impl Iterator<Item = &'static str> {
        SCHEMAS.iter().map(|s| s.name)
    }

    /// Schemas required by a stage's gate. Empty for ungated stages.
    pub fn required_for(&self, stage: Stage) -> &'static [&'static str] {
        QUALITY_GATES
            .iter()
            .find(|(gate, _)| *gate == stage.gate_name())
            .map_or(&[], |(_, schemas)| *schemas)
    }

    /// Validate a record against a named schema, accumulating all
    /// violations. `valid == errors.is_empty()`.
    pub fn validate(&self, record: &Value, schema_name: &str) -> (bool, Vec<String>) {
        let Some(schema) = self.rule(schema_name) else {
            return (false, vec![format!("Unknown schema: {schema_name}")]);
        };

        let Some(mut data) = record.as_object() else {
            return (false, vec![format!("Expected an object for schema: {schema_name}")]);
        };

        // Unwrap one level of nesting, e.g. {"evidence": {...}} -> {...}.
        if let Some(inner) = data.get(schema.name).and_then(Value::as_object) {
            data = inner;
        }

        let mut errors = Vec::new();

        for field in schema.required {
            if is_missing(data.get(*field)) {
                errors.push(format!("Missing: {field}"));
            }
        }

        for (sub, fields) in schema.nested_required {
            let nested = data.get(*sub).and_then(Value::as_object);
            for field in *fields {
                if !nested.is_some_and(|n| n.contains_key(*field)) {
                    errors.push(format!("Missing: {sub}.{field}"));
                }
            }
        }

        for (field, allowed) in schema.enums {
            // Enum fields may live top-level or one level under a sub-object.
            let Some(value) = lookup(data, *field) else { continue };
            match value.as_str() {
                Some(text) => {
                    if !text.is_empty() && !allowed.contains(&text) {
                        errors.push(format!("{field}: '{text}' not in {allowed:?}"));
                    }
                }
                // Null is the required-field check's concern; any other
                // non-string shape can never match an allowed value.
                None if !value.is_null() => {
                    errors.push(format!("{field}: {value} not in {allowed:?}"));
                }
                None => {}
            }
        }

        for (field, pattern) in schema.patterns {
            // Absence is the required-field check's concern.
            if let Some(text) = data.get(*field).and_then(Value::as_str) {
                if !text.is_empty()
                    && compiled_patterns().get(pattern).is_some_and(|re| !re.is_match(text))
                {
                    errors.push(format!("{field}: pattern mismatch (expected {pattern})"));
                }
            }
        }

        for (field, kind) in schema.kinds {
            if let Some(value) = lookup(data, *field) {
                if !value.is_null() && !kind.matches(value) {
                    errors.push(format!("{field}: expected {}, got {}", kind.name(), kind_of(value)));
                }
            }
        }

        (errors.is_empty(), errors)
    }

    /// Infer a record's schema from its structure.
    ///
    /// Checks the distinguishing wrapper keys in fixed priority order, then
    /// falls back to detecting a todo via `metadata.objective`. `None` means
    /// "not applicable", never "invalid".
    pub fn detect(&self, record: &Value) -> Option<&'static str> {
        let data = record.as_object()?;
        for key in DETECT_ORDER {
            if data.contains_key(key) {
                return Some(key);
            }
        }
        if data
            .get("metadata")
            .and_then(Value::as_object)
            .is_some_and(|m| m.contains_key("objective"))
        {
            return Some("todo");
        }
        None
    }
}

/// Absent, null, or an empty string.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Top-level lookup with fallback into the nested sub-objects.
fn lookup<'a>(data: &'a serde_json::Map<String, Value>, field: &str) -> Option<&'a Value> {
    if let Some(value) = data.get(field) {
        return Some(value);
    }
    NESTED_KEYS
        .iter()
        .find_map(|sub| data.get(*sub).and_then(Value::as_object).and_then(|n| n.get(field)))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
