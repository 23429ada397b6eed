//! Startup readiness port.
//!
//! The controller admits `Startup → Plan` only after an aggregate pass from
//! these checks. Implementations may probe anything (directories, external
//! services); the controller consumes only the aggregate and the failing
//! names.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a single readiness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Stable check name, e.g. `workflow_dir`.
    pub name: String,
    pub passed: bool,
    /// Human-readable detail, populated on failure.
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(name: impl Into<String>) -> Self {
        Self { name: name.into(), passed: true, detail: String::new() }
    }

    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { name: name.into(), passed: false, detail: detail.into() }
    }
}

/// Aggregate of all startup checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub checks: Vec<CheckOutcome>,
}

impl ReadinessReport {
    pub fn new(checks: Vec<CheckOutcome>) -> Self {
        Self { checks }
    }

    /// True only when every check passed.
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Names of the failing checks.
    pub fn failing(&self) -> Vec<&str> {
        self.checks.iter().filter(|c| !c.passed).map(|c| c.name.as_str()).collect()
    }
}

/// Startup readiness checker.
#[async_trait]
pub trait ReadinessChecker: Send + Sync {
    async fn run_checks(&self) -> ReadinessReport;
}
