//! Background reprompt scheduler.
//!
//! Periodically re-runs the quality gate against the current stage's
//! recorded outputs and writes a fresh reprompt when the gate rejects. The
//! scheduler reads workflow state through the store on every tick, so it
//! observes controller mutations without sharing the controller; its retry
//! bookkeeping is local and advisory and never touches the persisted
//! per-stage counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};

use crate::domain::models::{GateAction, GateResult, Stage};
use crate::domain::ports::StateStore;

use super::gate::GateEvaluator;
use super::render::render_reprompt;

/// Configuration for the reprompt scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between gate checks.
    pub interval: Duration,
    /// How long `stop` waits for the loop to exit before giving up.
    pub join_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl SchedulerConfig {
    /// Create config with a custom interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval, ..Default::default() }
    }
}

/// Scheduler errors. The loop itself never dies on a failed check; only
/// shutdown can fail, and only by timing out.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The loop did not exit within the join timeout. The stop request
    /// stands, so the detached task exits at its next wakeup.
    #[error("scheduler did not stop within {0:?}")]
    JoinTimeout(Duration),
}

/// Snapshot of scheduler state, taken under the status lock.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStatus {
    /// Whether the loop is running.
    pub active: bool,
    /// Checks performed, including skipped ticks.
    pub check_count: u64,
    /// Ticks skipped because the workflow was in an ungated stage.
    pub skip_count: u64,
    /// Ticks that failed on store I/O.
    pub fail_count: u64,
    /// Action selected by the most recent gate evaluation.
    pub last_action: Option<GateAction>,
    /// Gate name of the most recently checked stage.
    pub last_stage: Option<String>,
    /// Configured check interval.
    pub interval: Duration,
    /// Time until the next scheduled check, if the loop is running.
    pub next_check_in: Option<Duration>,
}

#[derive(Debug, Default)]
struct StatusInner {
    active: bool,
    check_count: u64,
    skip_count: u64,
    fail_count: u64,
    last_action: Option<GateAction>,
    last_stage: Option<String>,
    interval: Duration,
    deadline: Option<Instant>,
}

impl StatusInner {
    fn snapshot(&self) -> SchedulerStatus {
        SchedulerStatus {
            active: self.active,
            check_count: self.check_count,
            skip_count: self.skip_count,
            fail_count: self.fail_count,
            last_action: self.last_action,
            last_stage: self.last_stage.clone(),
            interval: self.interval,
            next_check_in: self
                .deadline
                .filter(|_| self.active)
                .map(|d| d.saturating_duration_since(Instant::now())),
        }
    }
}

/// Handle to control a spawned scheduler.
pub struct SchedulerHandle {
    stop_flag: Arc<AtomicBool>,
    reset_flag: Arc<AtomicBool>,
    trigger_flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
    status: Arc<RwLock<StatusInner>>,
    join: Mutex<Option<JoinHandle<()>>>,
    join_timeout: Duration,
}

impl SchedulerHandle {
    /// Stop the loop and wait (bounded) for it to exit.
    ///
    /// Idempotent: stopping an already-stopped scheduler is a no-op.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        self.stop_flag.store(true, Ordering::Release);
        self.notify.notify_one();

        let Some(task) = self.join.lock().await.take() else {
            return Ok(());
        };
        match timeout(self.join_timeout, task).await {
            Ok(join_result) => {
                if let Err(e) = join_result {
                    tracing::warn!(error = %e, "scheduler task join failed");
                }
                Ok(())
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.join_timeout, "scheduler stop timed out");
                Err(SchedulerError::JoinTimeout(self.join_timeout))
            }
        }
    }

    /// Push the next check a full interval into the future.
    pub fn reset(&self) {
        self.reset_flag.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Run a check now, then resume the regular cadence.
    pub fn trigger(&self) {
        self.trigger_flag.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    /// Whether stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    /// Current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        self.status.read().await.snapshot()
    }
}

/// Called with the gate result on every non-Proceed tick.
pub type FailureHook = Arc<dyn Fn(&GateResult) + Send + Sync>;

/// Periodic gate re-checker for one workflow.
pub struct RepromptScheduler {
    workflow_id: String,
    store: Arc<dyn StateStore>,
    evaluator: GateEvaluator,
    config: SchedulerConfig,
    on_failure: Option<FailureHook>,
    stop_flag: Arc<AtomicBool>,
    reset_flag: Arc<AtomicBool>,
    trigger_flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
    status: Arc<RwLock<StatusInner>>,
}

impl RepromptScheduler {
    pub fn new(
        workflow_id: impl Into<String>,
        store: Arc<dyn StateStore>,
        evaluator: GateEvaluator,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            store,
            evaluator,
            config,
            on_failure: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            reset_flag: Arc::new(AtomicBool::new(false)),
            trigger_flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            status: Arc::new(RwLock::new(StatusInner::default())),
        }
    }

    /// Register a hook invoked on every failed check.
    #[must_use]
    pub fn with_failure_hook(mut self, hook: impl Fn(&GateResult) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Arc::new(hook));
        self
    }

    /// Spawn the loop and return its control handle.
    pub fn spawn(self) -> SchedulerHandle {
        let stop_flag = self.stop_flag.clone();
        let reset_flag = self.reset_flag.clone();
        let trigger_flag = self.trigger_flag.clone();
        let notify = self.notify.clone();
        let status = self.status.clone();
        let join_timeout = self.config.join_timeout;

        let task = tokio::spawn(async move {
            self.run_loop().await;
        });

        SchedulerHandle {
            stop_flag,
            reset_flag,
            trigger_flag,
            notify,
            status,
            join: Mutex::new(Some(task)),
            join_timeout,
        }
    }

    async fn run_loop(self) {
        let mut retries: HashMap<Stage, u32> = HashMap::new();
        let mut last_stage: Option<Stage> = None;
        let mut deadline = Instant::now() + self.config.interval;
        {
            let mut status = self.status.write().await;
            status.active = true;
            status.interval = self.config.interval;
            status.deadline = Some(deadline);
        }
        tracing::info!(
            workflow_id = %self.workflow_id,
            interval = ?self.config.interval,
            "reprompt scheduler started"
        );

        loop {
            tokio::select! {
                () = sleep_until(deadline) => {
                    if self.stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    self.run_check(&mut retries, &mut last_stage, false).await;
                    deadline = Instant::now() + self.config.interval;
                }
                () = self.notify.notified() => {
                    if self.stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    if self.reset_flag.swap(false, Ordering::AcqRel) {
                        deadline = Instant::now() + self.config.interval;
                        tracing::debug!(workflow_id = %self.workflow_id, "scheduler timer reset");
                    }
                    if self.trigger_flag.swap(false, Ordering::AcqRel) {
                        self.run_check(&mut retries, &mut last_stage, true).await;
                        deadline = Instant::now() + self.config.interval;
                    }
                }
            }
            self.status.write().await.deadline = Some(deadline);

            if self.stop_flag.load(Ordering::Acquire) {
                break;
            }
        }

        {
            let mut status = self.status.write().await;
            status.active = false;
            status.deadline = None;
        }
        tracing::info!(workflow_id = %self.workflow_id, "reprompt scheduler stopped");
    }

    /// One tick: load state, evaluate the gate, write a reprompt on
    /// rejection. Failures are counted and logged, never fatal to the loop.
    ///
    /// A periodic tick that observes a stage change defers evaluation for
    /// one interval, so a freshly entered stage is not reprompted moments
    /// after the transition. `forced` ticks (trigger) always evaluate.
    async fn run_check(
        &self,
        retries: &mut HashMap<Stage, u32>,
        last_stage: &mut Option<Stage>,
        forced: bool,
    ) {
        let state = match self.store.load(&self.workflow_id) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(workflow_id = %self.workflow_id, error = %e, "scheduler check failed to load state");
                self.status.write().await.fail_count += 1;
                return;
            }
        };

        let stage = state.current_stage;
        let stage_changed = last_stage.is_some_and(|previous| previous != stage);
        *last_stage = Some(stage);
        {
            let mut status = self.status.write().await;
            status.check_count += 1;
            status.last_stage = Some(stage.gate_name().to_string());
        }

        // Startup and the terminal stages have nothing to re-check.
        if stage == Stage::Startup || stage.is_terminal() {
            let mut status = self.status.write().await;
            status.skip_count += 1;
            status.last_action = None;
            tracing::debug!(workflow_id = %self.workflow_id, stage = %stage, "scheduler skipped ungated stage");
            return;
        }

        if stage_changed && !forced {
            let mut status = self.status.write().await;
            status.skip_count += 1;
            status.last_action = None;
            tracing::debug!(workflow_id = %self.workflow_id, stage = %stage, "stage freshly entered, deferring check");
            return;
        }

        let retry = retries.get(&stage).copied().unwrap_or(0);
        let outputs = state.stage_outputs(stage);
        let logged = if outputs.is_empty() {
            let action = if retry >= self.evaluator.max_retries() {
                GateAction::Escalate
            } else {
                GateAction::Revise
            };
            let result = GateResult::new(
                stage.gate_name(),
                Vec::new(),
                vec!["No outputs recorded for stage".to_string()],
                action,
                retry,
            );
            self.store
                .append_gate_result(&self.workflow_id, &result)
                .map(|seq| (result, seq))
        } else {
            self.evaluator
                .evaluate_and_log(self.store.as_ref(), &self.workflow_id, stage, &outputs, retry)
        };

        let (result, seq) = match logged {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(workflow_id = %self.workflow_id, error = %e, "scheduler check failed to log result");
                self.status.write().await.fail_count += 1;
                return;
            }
        };

        if result.action == GateAction::Proceed {
            retries.remove(&stage);
        } else {
            let reprompt = render_reprompt(
                stage,
                &result,
                &state,
                self.evaluator.registry(),
                self.evaluator.max_retries(),
            );
            if let Err(e) = self.store.write_reprompt(
                &self.workflow_id,
                result.stage.as_str(),
                seq,
                &reprompt,
            ) {
                tracing::warn!(workflow_id = %self.workflow_id, error = %e, "scheduler failed to write reprompt");
                self.status.write().await.fail_count += 1;
            }
            *retries.entry(stage).or_insert(0) += 1;
            if let Some(hook) = &self.on_failure {
                hook(&result);
            }
        }

        self.status.write().await.last_action = Some(result.action);
        tracing::debug!(
            workflow_id = %self.workflow_id,
            stage = %stage,
            action = %result.action,
            "scheduler check completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GateConfig, WorkflowState};
    use crate::domain::ports::NullEvidenceProbe;
    use crate::services::testutil::{valid_evidence_value, valid_todo_value, MemoryStore};

    fn seeded_store(stage: Stage) -> (Arc<MemoryStore>, String) {
        let store = Arc::new(MemoryStore::new());
        let mut state = WorkflowState::new("background checks");
        state.current_stage = stage;
        store.save(&mut state).unwrap();
        (store, state.workflow_id)
    }

    fn scheduler(
        store: Arc<MemoryStore>,
        workflow_id: &str,
        interval: Duration,
    ) -> RepromptScheduler {
        let evaluator = GateEvaluator::new(GateConfig::default(), Arc::new(NullEvidenceProbe));
        RepromptScheduler::new(workflow_id, store, evaluator, SchedulerConfig::with_interval(interval))
    }

    #[test]
    fn test_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.join_timeout, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_check_writes_reprompt_for_empty_stage() {
        let (store, id) = seeded_store(Stage::Plan);
        let handle = scheduler(store.clone(), &id, Duration::from_secs(300)).spawn();

        tokio::time::sleep(Duration::from_secs(301)).await;
        let status = handle.status().await;
        assert!(status.active);
        assert_eq!(status.check_count, 1);
        assert_eq!(status.last_action, Some(GateAction::Revise));
        assert_eq!(status.last_stage.as_deref(), Some("PLAN"));
        assert_eq!(store.gate_log_len(), 1);
        assert_eq!(store.reprompt_count(), 1);
        let result = store.last_gate_result().unwrap();
        assert_eq!(result.errors, vec!["No outputs recorded for stage".to_string()]);

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_stage_proceeds_without_reprompt() {
        let (store, id) = seeded_store(Stage::Plan);
        let mut state = store.load(&id).unwrap();
        state.record_output(Stage::Plan, valid_todo_value("PLAN"));
        state.record_output(Stage::Plan, valid_evidence_value("PLAN", 1));
        store.save(&mut state).unwrap();

        let handle = scheduler(store.clone(), &id, Duration::from_secs(300)).spawn();
        tokio::time::sleep(Duration::from_secs(301)).await;

        let status = handle.status().await;
        assert_eq!(status.last_action, Some(GateAction::Proceed));
        assert_eq!(store.gate_log_len(), 1);
        assert_eq!(store.reprompt_count(), 0);

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ungated_stages_are_skipped() {
        for stage in [Stage::Startup, Stage::Complete, Stage::Failed] {
            let (store, id) = seeded_store(stage);
            let handle = scheduler(store.clone(), &id, Duration::from_secs(300)).spawn();
            tokio::time::sleep(Duration::from_secs(301)).await;

            let status = handle.status().await;
            assert_eq!(status.check_count, 1);
            assert_eq!(status.skip_count, 1);
            assert_eq!(status.last_action, None);
            assert_eq!(store.gate_log_len(), 0);

            handle.stop().await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_checks_immediately() {
        let (store, id) = seeded_store(Stage::Implement);
        let handle = scheduler(store.clone(), &id, Duration::from_secs(3600)).spawn();

        handle.trigger();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let status = handle.status().await;
        assert_eq!(status.check_count, 1);
        assert_eq!(status.last_stage.as_deref(), Some("IMPLEMENT"));
        assert_eq!(store.reprompt_count(), 1);

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_rebases_the_next_check() {
        let (store, id) = seeded_store(Stage::Plan);
        let handle = scheduler(store.clone(), &id, Duration::from_secs(300)).spawn();

        tokio::time::sleep(Duration::from_secs(200)).await;
        handle.reset();
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(handle.status().await.check_count, 0);

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(handle.status().await.check_count, 1);

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_halts_checks() {
        let (store, id) = seeded_store(Stage::Plan);
        let handle = scheduler(store.clone(), &id, Duration::from_secs(300)).spawn();

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(handle.status().await.check_count, 1);

        handle.stop().await.unwrap();
        handle.stop().await.unwrap();
        assert!(!handle.status().await.active);
        assert!(handle.is_stop_requested());

        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(handle.status().await.check_count, 1);
        assert_eq!(store.gate_log_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_workflow_counts_as_failure_not_death() {
        let store = Arc::new(MemoryStore::new());
        let handle = scheduler(store.clone(), "20990101_000000_deadbeef", Duration::from_secs(300))
            .spawn();

        tokio::time::sleep(Duration::from_secs(601)).await;
        let status = handle.status().await;
        assert!(status.active);
        assert_eq!(status.fail_count, 2);
        assert_eq!(status.check_count, 0);

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_after_stage_change_defers_one_interval() {
        let (store, id) = seeded_store(Stage::Plan);
        let handle = scheduler(store.clone(), &id, Duration::from_secs(300)).spawn();

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(handle.status().await.check_count, 1);
        assert_eq!(store.gate_log_len(), 1);

        // A foreground transition lands between ticks.
        let mut state = store.load(&id).unwrap();
        state.current_stage = Stage::Implement;
        store.save(&mut state).unwrap();

        // The next tick sees the fresh stage and holds off.
        tokio::time::sleep(Duration::from_secs(300)).await;
        let status = handle.status().await;
        assert_eq!(status.check_count, 2);
        assert_eq!(status.skip_count, 1);
        assert_eq!(status.last_action, None);
        assert_eq!(store.gate_log_len(), 1);

        // A full interval later the new stage is evaluated normally.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(store.gate_log_len(), 2);
        assert_eq!(handle.status().await.last_stage.as_deref(), Some("IMPLEMENT"));

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_evaluates_even_on_fresh_stage() {
        let (store, id) = seeded_store(Stage::Plan);
        let handle = scheduler(store.clone(), &id, Duration::from_secs(300)).spawn();

        tokio::time::sleep(Duration::from_secs(301)).await;
        let mut state = store.load(&id).unwrap();
        state.current_stage = Stage::Test;
        store.save(&mut state).unwrap();

        handle.trigger();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.gate_log_len(), 2);
        assert_eq!(handle.status().await.last_stage.as_deref(), Some("TEST"));

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_hook_fires_on_rejection_only() {
        use std::sync::atomic::AtomicUsize;

        let (store, id) = seeded_store(Stage::Plan);
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        let evaluator = GateEvaluator::new(GateConfig::default(), Arc::new(NullEvidenceProbe));
        let handle = RepromptScheduler::new(
            &id,
            store.clone(),
            evaluator,
            SchedulerConfig::with_interval(Duration::from_secs(300)),
        )
        .with_failure_hook(move |result| {
            assert_ne!(result.action, GateAction::Proceed);
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .spawn();

        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Satisfy the gate; the hook stays quiet on Proceed.
        let mut state = store.load(&id).unwrap();
        state.record_output(Stage::Plan, valid_todo_value("PLAN"));
        state.record_output(Stage::Plan, valid_evidence_value("PLAN", 1));
        store.save(&mut state).unwrap();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(handle.status().await.last_action, Some(GateAction::Proceed));

        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisory_retry_escalates_without_touching_state() {
        let (store, id) = seeded_store(Stage::Plan);
        let handle = scheduler(store.clone(), &id, Duration::from_secs(300)).spawn();

        for _ in 0..4 {
            tokio::time::sleep(Duration::from_secs(301)).await;
        }
        let result = store.last_gate_result().unwrap();
        assert_eq!(result.action, GateAction::Escalate);
        assert_eq!(result.retry, 3);

        // Persisted counters stay untouched.
        let state = store.load(&id).unwrap();
        assert_eq!(state.retry_count(Stage::Plan), 0);

        handle.stop().await.unwrap();
    }
}
