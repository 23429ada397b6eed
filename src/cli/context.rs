//! Shared wiring for CLI commands: config, store, and controller assembly.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::adapters::fs::{FsEvidenceProbe, FsReadinessChecker, JsonStateStore};
use crate::domain::models::config::Config;
use crate::domain::models::Stage;
use crate::domain::ports::TracingNotifier;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{GateEvaluator, WorkflowController};

/// Everything a command needs, built once per invocation.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<JsonStateStore>,
}

impl AppContext {
    pub fn new(config_path: Option<&Path>, state_root: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Some(root) = state_root {
            config.state_root = root.display().to_string();
        }
        let store = Arc::new(JsonStateStore::new(&config.state_root));
        Ok(Self { config, store })
    }

    pub fn evaluator(&self) -> GateEvaluator {
        GateEvaluator::new(self.config.gate.clone(), Arc::new(FsEvidenceProbe))
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.config.scheduler.interval_secs)
    }

    fn readiness(&self) -> Arc<FsReadinessChecker> {
        Arc::new(FsReadinessChecker::new(&self.config.state_root, self.scheduler_interval()))
    }

    /// Resolve an explicit workflow id, falling back to the most recent.
    pub fn resolve_id(&self, id: Option<String>) -> Result<String> {
        if let Some(id) = id {
            return Ok(id);
        }
        self.store
            .latest_workflow()?
            .with_context(|| format!("No persisted workflow state under {}", self.config.state_root))
    }

    /// Rehydrate a controller for an existing workflow.
    pub fn open(&self, id: Option<String>) -> Result<WorkflowController> {
        let id = self.resolve_id(id)?;
        let controller = WorkflowController::resume(
            &id,
            self.store.clone(),
            self.evaluator(),
            Arc::new(TracingNotifier),
            self.readiness(),
        )?;
        Ok(controller)
    }

    /// Create a fresh workflow.
    pub fn create(&self, objective: &str) -> Result<WorkflowController> {
        let controller = WorkflowController::create(
            objective,
            self.store.clone(),
            self.evaluator(),
            Arc::new(TracingNotifier),
            self.readiness(),
        )?;
        Ok(controller)
    }
}

/// Parse a stage name, accepting any case.
pub fn parse_stage(name: &str) -> Result<Stage> {
    Stage::from_str(name).with_context(|| {
        format!("Unknown stage: {name}. Expected one of STARTUP, PLAN, REVIEW, DISRUPT, IMPLEMENT, TEST, REVIEW_POST, VALIDATE, LEARN, COMPLETE, FAILED")
    })
}
