//! Stage transition controller.
//!
//! Owns one workflow's aggregate state and enforces the pipeline: every
//! attempted exit from a gated stage runs the quality gate, Startup → Plan
//! requires a passing readiness aggregate, and the whole state document is
//! persisted synchronously after each mutation. A freshly constructed
//! controller rehydrated from the store resumes with identical semantics.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::domain::models::{
    EvidenceRecord, GateAction, GateResult, Stage, TodoMetadata, TodoPriority, TodoRecord, TodoStatus,
    WorkflowState,
};
use crate::domain::ports::{
    ReadinessChecker, ReadinessReport, StageNotifier, StateStore, StoreError,
};

use super::gate::GateEvaluator;
use super::render::render_reprompt;

/// Fatal controller errors. Gate failures and order violations are not
/// errors — they are `TransitionOutcome` values the caller branches on.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A record factory produced a schema-violating artifact. State is left
    /// untouched.
    #[error("Schema-invalid {schema} record: {errors:?}")]
    InvalidRecord { schema: &'static str, errors: Vec<String> },
}

/// Outcome of a transition attempt.
#[derive(Debug)]
pub enum TransitionOutcome {
    /// Gate passed (or none applied); the workflow advanced.
    Transitioned { from: Stage, to: Stage },
    /// The requested target violates the fixed stage order. State unchanged.
    InvalidOrder { from: Stage, requested: Stage },
    /// The workflow is in a terminal stage; nothing moves.
    Terminal { stage: Stage },
    /// Startup readiness aggregate failed; still in Startup.
    NotReady { failing: Vec<String> },
    /// The gate rejected the exit. On Revise/Escalate the stage's retry
    /// counter was incremented; on Stop the workflow was forced to Failed.
    GateFailed { result: GateResult, reprompt: String },
}

impl TransitionOutcome {
    /// Whether the workflow actually advanced.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }
}

/// Optional overrides for `create_todo`.
#[derive(Debug, Default, Clone)]
pub struct TodoOverrides {
    pub objective: Option<String>,
    pub success_criteria: Option<String>,
    pub fail_criteria: Option<String>,
    pub evidence_required: Option<String>,
    pub evidence_location: Option<String>,
    pub agent_model: Option<String>,
    pub blocked_by: Vec<String>,
    pub parallel: bool,
    pub time_budget: Option<String>,
    pub reviewer: Option<String>,
}

/// The core state machine driving one workflow.
pub struct WorkflowController {
    state: WorkflowState,
    store: Arc<dyn StateStore>,
    evaluator: GateEvaluator,
    notifier: Arc<dyn StageNotifier>,
    readiness: Arc<dyn ReadinessChecker>,
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl WorkflowController {
    /// Create a new workflow and persist its initial document.
    pub fn create(
        user_objective: impl Into<String>,
        store: Arc<dyn StateStore>,
        evaluator: GateEvaluator,
        notifier: Arc<dyn StageNotifier>,
        readiness: Arc<dyn ReadinessChecker>,
    ) -> Result<Self, ControllerError> {
        let mut state = WorkflowState::new(user_objective);
        store.save(&mut state)?;
        Ok(Self { state, store, evaluator, notifier, readiness })
    }

    /// Rehydrate a controller from the persisted document.
    pub fn resume(
        workflow_id: &str,
        store: Arc<dyn StateStore>,
        evaluator: GateEvaluator,
        notifier: Arc<dyn StageNotifier>,
        readiness: Arc<dyn ReadinessChecker>,
    ) -> Result<Self, ControllerError> {
        let state = store.load(workflow_id)?;
        Ok(Self { state, store, evaluator, notifier, readiness })
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn evaluator(&self) -> &GateEvaluator {
        &self.evaluator
    }

    /// Run the startup readiness checks without transitioning.
    pub async fn run_readiness(&self) -> ReadinessReport {
        self.readiness.run_checks().await
    }

    /// Attempt a transition to `target`.
    ///
    /// Gate rejections and order violations come back as outcomes; only
    /// persistence failures are errors.
    pub async fn transition(&mut self, target: Stage) -> Result<TransitionOutcome, ControllerError> {
        let from = self.state.current_stage;

        if from.is_terminal() {
            tracing::warn!(stage = %from, "transition requested on terminal workflow");
            return Ok(TransitionOutcome::Terminal { stage: from });
        }

        if !from.can_transition_to(target) {
            tracing::warn!(from = %from, requested = %target, "invalid transition rejected");
            return Ok(TransitionOutcome::InvalidOrder { from, requested: target });
        }

        // Startup has no gate; it is guarded by the readiness aggregate.
        if from == Stage::Startup && !target.is_terminal() {
            let report = self.readiness.run_checks().await;
            if !report.all_passed() {
                let failing: Vec<String> =
                    report.failing().into_iter().map(str::to_string).collect();
                tracing::warn!(?failing, "startup readiness failed");
                return Ok(TransitionOutcome::NotReady { failing });
            }
        }

        if from.is_gated() {
            let outputs = self.state.stage_outputs(from);
            let retry = self.state.retry_count(from);
            let (result, seq) = self.evaluator.evaluate_and_log(
                self.store.as_ref(),
                &self.state.workflow_id,
                from,
                &outputs,
                retry,
            )?;

            if result.action != GateAction::Proceed {
                let reprompt = render_reprompt(
                    from,
                    &result,
                    &self.state,
                    self.evaluator.registry(),
                    self.evaluator.max_retries(),
                );
                self.store.write_reprompt(
                    &self.state.workflow_id,
                    result.stage.as_str(),
                    seq,
                    &reprompt,
                )?;

                match result.action {
                    GateAction::Stop => {
                        // Unrecoverable: force the terminal state and keep
                        // the record for audit.
                        self.state.current_stage = Stage::Failed;
                    }
                    _ => {
                        self.state.increment_retry(from);
                    }
                }
                self.store.save(&mut self.state)?;
                return Ok(TransitionOutcome::GateFailed { result, reprompt });
            }
        }

        self.state.completed_stages.push(from);
        self.notifier.on_stage_exit(from, target);
        self.state.current_stage = target;
        self.notifier.on_stage_enter(target);
        self.store.save(&mut self.state)?;
        tracing::info!(from = %from, to = %target, "stage transitioned");

        Ok(TransitionOutcome::Transitioned { from, to: target })
    }

    /// Run a single gate check against the current stage (or an explicit
    /// one) without transitioning or touching retry counters.
    pub fn check(&self, stage: Option<Stage>) -> Result<(GateResult, u64), StoreError> {
        let stage = stage.unwrap_or(self.state.current_stage);
        let outputs = self.state.stage_outputs(stage);
        let retry = self.state.retry_count(stage);
        let (result, seq) = self.evaluator.evaluate_and_log(
            self.store.as_ref(),
            &self.state.workflow_id,
            stage,
            &outputs,
            retry,
        )?;
        if result.action != GateAction::Proceed {
            let reprompt = render_reprompt(
                stage,
                &result,
                &self.state,
                self.evaluator.registry(),
                self.evaluator.max_retries(),
            );
            self.store
                .write_reprompt(&self.state.workflow_id, result.stage.as_str(), seq, &reprompt)?;
        }
        Ok((result, seq))
    }

    /// Record an untyped stage output (review gates, conflicts, metrics,
    /// skills submitted from outside).
    pub fn record_output(&mut self, stage: Stage, output: Value) -> Result<(), ControllerError> {
        self.state.record_output(stage, output);
        self.store.save(&mut self.state)?;
        Ok(())
    }

    /// Build, validate, and append a schema-valid 17-field todo.
    ///
    /// A schema-violating construction fails loudly and leaves state
    /// untouched.
    pub fn create_todo(
        &mut self,
        content: impl Into<String>,
        priority: TodoPriority,
        overrides: TodoOverrides,
    ) -> Result<TodoRecord, ControllerError> {
        let content = content.into();
        let id = format!("{}.1", self.state.todos.len() + 1);
        let evidence_location = overrides.evidence_location.unwrap_or_else(|| {
            self.store
                .evidence_dir(&self.state.workflow_id)
                .join(format!("{id}.log"))
                .display()
                .to_string()
        });

        let todo = TodoRecord {
            id,
            content: content.clone(),
            status: TodoStatus::Pending,
            priority,
            metadata: TodoMetadata {
                objective: overrides.objective.unwrap_or_else(|| content.clone()),
                success_criteria: overrides
                    .success_criteria
                    .unwrap_or_else(|| "Task completed".to_string()),
                fail_criteria: overrides
                    .fail_criteria
                    .unwrap_or_else(|| "Task not completed".to_string()),
                evidence_required: overrides.evidence_required.unwrap_or_else(|| "log".to_string()),
                evidence_location,
                agent_model: overrides.agent_model.unwrap_or_else(|| "Claude".to_string()),
                workflow: "PLAN→REVIEW→DISRUPT→IMPLEMENT→TEST→REVIEW→VALIDATE→LEARN".to_string(),
                blocked_by: overrides.blocked_by,
                parallel: overrides.parallel,
                workflow_stage: self.state.current_stage.gate_name().to_string(),
                instructions_set: "AGENTS.md".to_string(),
                time_budget: overrides.time_budget.unwrap_or_else(|| "≤60m".to_string()),
                reviewer: overrides.reviewer.unwrap_or_else(|| "gpt-5.2".to_string()),
            },
        };

        let value = todo.to_value();
        let (valid, errors) = self.evaluator.registry().validate(&value, "todo");
        if !valid {
            return Err(ControllerError::InvalidRecord { schema: "todo", errors });
        }

        self.state.todos.push(value.clone());
        self.state.record_output(self.state.current_stage, value);
        self.store.save(&mut self.state)?;
        Ok(todo)
    }

    /// Build, validate, and append an evidence record for `stage` with a
    /// per-stage auto-incrementing sequence embedded in its id.
    pub fn create_evidence(
        &mut self,
        stage: Stage,
        claim: impl Into<String>,
        location: Option<String>,
    ) -> Result<EvidenceRecord, ControllerError> {
        let seq = self.state.next_evidence_seq(stage);
        let id = format!("E-{}-{}-{seq:03}", stage.gate_name(), self.state.short_id());
        let location = location.unwrap_or_else(|| {
            self.store
                .evidence_dir(&self.state.workflow_id)
                .join(format!("{}.log", stage.gate_name().to_lowercase()))
                .display()
                .to_string()
        });
        let record = EvidenceRecord::new(id, claim, location);

        let value = record.to_value();
        let (valid, errors) = self.evaluator.registry().validate(&value, "evidence");
        if !valid {
            return Err(ControllerError::InvalidRecord { schema: "evidence", errors });
        }

        self.state.evidence.push(value.clone());
        self.state.record_output(stage, value);
        self.store.save(&mut self.state)?;
        Ok(record)
    }
}
