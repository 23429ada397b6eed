//! Workflow stage domain model.
//!
//! Stages form a fixed, totally ordered pipeline:
//!
//! ```text
//! Startup → Plan → Review → Disrupt → Implement → Test → ReviewPost
//!         → Validate → Learn → Complete
//! ```
//!
//! `Complete` and `Failed` are terminal and reachable from any stage; every
//! other transition must advance exactly one position in the order.

use serde::{Deserialize, Serialize};

/// A stage in the enforcement pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Readiness checks before any work is admitted.
    Startup,
    /// Objective decomposition into todos with evidence plans.
    Plan,
    /// First review pass over the plan.
    Review,
    /// Adversarial challenge of the plan.
    Disrupt,
    /// Execution of the planned work.
    Implement,
    /// Test execution and metric capture.
    Test,
    /// Second review pass, after testing.
    ReviewPost,
    /// Third-party validation.
    Validate,
    /// Skill extraction and retrospective.
    Learn,
    /// Terminal: workflow finished successfully.
    Complete,
    /// Terminal: workflow stopped by a gate or operator.
    Failed,
}

/// The orderable (non-terminal) pipeline, in transition order.
pub const STAGE_ORDER: [Stage; 9] = [
    Stage::Startup,
    Stage::Plan,
    Stage::Review,
    Stage::Disrupt,
    Stage::Implement,
    Stage::Test,
    Stage::ReviewPost,
    Stage::Validate,
    Stage::Learn,
];

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "STARTUP",
            Self::Plan => "PLAN",
            Self::Review => "REVIEW",
            Self::Disrupt => "DISRUPT",
            Self::Implement => "IMPLEMENT",
            Self::Test => "TEST",
            Self::ReviewPost => "REVIEW_POST",
            Self::Validate => "VALIDATE",
            Self::Learn => "LEARN",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "STARTUP" => Some(Self::Startup),
            "PLAN" => Some(Self::Plan),
            "REVIEW" => Some(Self::Review),
            "DISRUPT" => Some(Self::Disrupt),
            "IMPLEMENT" => Some(Self::Implement),
            "TEST" => Some(Self::Test),
            "REVIEW_POST" | "REVIEWPOST" => Some(Self::ReviewPost),
            "VALIDATE" => Some(Self::Validate),
            "LEARN" => Some(Self::Learn),
            "COMPLETE" => Some(Self::Complete),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Position in the fixed order, if this stage is orderable.
    pub fn order_index(&self) -> Option<usize> {
        STAGE_ORDER.iter().position(|s| s == self)
    }

    /// The next stage in the fixed order, if any.
    pub fn successor(&self) -> Option<Self> {
        let idx = self.order_index()?;
        STAGE_ORDER.get(idx + 1).copied()
    }

    /// Name used for gate-requirement lookup and gate logs.
    ///
    /// Both review occurrences share one required-schema set, so
    /// `ReviewPost` normalizes to `REVIEW`.
    pub fn gate_name(&self) -> &'static str {
        match self {
            Self::ReviewPost => "REVIEW",
            other => other.as_str(),
        }
    }

    /// Whether a gate is evaluated when exiting this stage.
    pub fn is_gated(&self) -> bool {
        !matches!(self, Self::Startup | Self::Complete | Self::Failed)
    }

    /// Whether `target` is a legal transition from this stage.
    ///
    /// Terminal targets are always permitted; anything else must be the
    /// immediate successor. Terminal stages admit nothing.
    pub fn can_transition_to(&self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if target.is_terminal() {
            return true;
        }
        self.successor() == Some(target)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
