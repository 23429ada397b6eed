//! Filesystem implementation of the `StateStore`.
//!
//! One directory per workflow under the state root:
//!
//! ```text
//! <root>/<workflow_id>/
//!   state/current.json          whole-document workflow state
//!   logs/gate_<stage>_<seq>.json
//!   logs/reprompt_<stage>_<seq>.md
//!   evidence/  todo/  plans/  test/
//! ```
//!
//! Saves are crash-safe: the document is written to a temp file, fsynced,
//! then renamed over `current.json`, so a reader never sees a torn write.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::models::{GateResult, WorkflowState};
use crate::domain::ports::{StateStore, StoreError};

const WORKFLOW_DIRS: [&str; 6] = ["state", "logs", "evidence", "todo", "plans", "test"];

/// JSON-on-disk state store rooted at a configurable directory.
pub struct JsonStateStore {
    root: PathBuf,
    // Serializes gate-log sequence assignment within this process. Across
    // processes (watch vs transition) uniqueness comes from claiming the
    // final filename with `create_new`.
    seq_guard: Mutex<()>,
}

impl JsonStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), seq_guard: Mutex::new(()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The workflow's directory under the state root.
    pub fn workflow_dir(&self, workflow_id: &str) -> PathBuf {
        self.root.join(workflow_id)
    }

    fn state_path(&self, workflow_id: &str) -> PathBuf {
        self.workflow_dir(workflow_id).join("state").join("current.json")
    }

    fn logs_dir(&self, workflow_id: &str) -> PathBuf {
        self.workflow_dir(workflow_id).join("logs")
    }

    /// Create the workflow's directory skeleton.
    pub fn ensure_layout(&self, workflow_id: &str) -> Result<(), StoreError> {
        let base = self.workflow_dir(workflow_id);
        for dir in WORKFLOW_DIRS {
            let path = base.join(dir);
            fs::create_dir_all(&path).map_err(|e| StoreError::io(path, e))?;
        }
        Ok(())
    }

    /// List persisted workflow ids, newest first. Ids sort chronologically
    /// because they start with a UTC timestamp.
    pub fn list_workflows(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(&self.root).map_err(|e| StoreError::io(self.root.clone(), e))?;
        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().join("state").join("current.json").is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    /// The most recently created workflow, if any.
    pub fn latest_workflow(&self) -> Result<Option<String>, StoreError> {
        Ok(self.list_workflows()?.into_iter().next())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let parent = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent.to_path_buf(), e))?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp).map_err(|e| StoreError::io(tmp.clone(), e))?;
            file.write_all(bytes).map_err(|e| StoreError::io(tmp.clone(), e))?;
            file.sync_all().map_err(|e| StoreError::io(tmp.clone(), e))?;
        }
        fs::rename(&tmp, path).map_err(|e| StoreError::io(path.to_path_buf(), e))?;
        Ok(())
    }

    /// Next free sequence number across gate logs and reprompts for a stage.
    fn next_seq(&self, workflow_id: &str, stage: &str) -> Result<u64, StoreError> {
        let logs = self.logs_dir(workflow_id);
        if !logs.exists() {
            return Ok(1);
        }
        let prefix = format!("gate_{}_", stage.to_lowercase());
        let entries = fs::read_dir(&logs).map_err(|e| StoreError::io(logs.clone(), e))?;
        let max = entries
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().into_string().ok())
            .filter_map(|name| {
                name.strip_prefix(&prefix)
                    .and_then(|rest| rest.strip_suffix(".json"))
                    .and_then(|num| num.parse::<u64>().ok())
            })
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }
}

impl StateStore for JsonStateStore {
    fn save(&self, state: &mut WorkflowState) -> Result<(), StoreError> {
        state.touch();
        self.ensure_layout(&state.workflow_id)?;
        let bytes = serde_json::to_vec_pretty(state)?;
        self.write_atomic(&self.state_path(&state.workflow_id), &bytes)?;
        tracing::debug!(workflow_id = %state.workflow_id, "state document saved");
        Ok(())
    }

    fn load(&self, workflow_id: &str) -> Result<WorkflowState, StoreError> {
        let path = self.state_path(workflow_id);
        if !path.is_file() {
            return Err(StoreError::NotFound(workflow_id.to_string()));
        }
        let bytes = fs::read(&path).map_err(|e| StoreError::io(path.clone(), e))?;
        let state: WorkflowState = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt { path, reason: e.to_string() })?;
        if state.workflow_id != workflow_id {
            return Err(StoreError::Corrupt {
                path: self.state_path(workflow_id),
                reason: format!(
                    "document claims workflow {} but lives under {workflow_id}",
                    state.workflow_id
                ),
            });
        }
        Ok(state)
    }

    fn exists(&self, workflow_id: &str) -> bool {
        self.state_path(workflow_id).is_file()
    }

    fn append_gate_result(
        &self,
        workflow_id: &str,
        result: &GateResult,
    ) -> Result<u64, StoreError> {
        let _guard = self.seq_guard.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.ensure_layout(workflow_id)?;
        let logs = self.logs_dir(workflow_id);
        let stage = result.stage.to_lowercase();
        let bytes = serde_json::to_vec_pretty(result)?;

        // Claim the final filename exclusively. Another process may have
        // taken the scanned number already, so bump and retry on collision
        // instead of renaming over its entry.
        let mut seq = self.next_seq(workflow_id, &result.stage)?;
        loop {
            let path = logs.join(format!("gate_{stage}_{seq:03}.json"));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&bytes).map_err(|e| StoreError::io(path.clone(), e))?;
                    file.sync_all().map_err(|e| StoreError::io(path, e))?;
                    return Ok(seq);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => seq += 1,
                Err(e) => return Err(StoreError::io(path, e)),
            }
        }
    }

    fn write_reprompt(
        &self,
        workflow_id: &str,
        stage: &str,
        seq: u64,
        text: &str,
    ) -> Result<(), StoreError> {
        self.ensure_layout(workflow_id)?;
        let path = self
            .logs_dir(workflow_id)
            .join(format!("reprompt_{}_{seq:03}.md", stage.to_lowercase()));
        fs::write(&path, text).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    fn evidence_dir(&self, workflow_id: &str) -> PathBuf {
        self.workflow_dir(workflow_id).join("evidence")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GateAction, Stage};
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonStateStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_dir, store) = store();
        let mut state = WorkflowState::new("round trip");
        state.current_stage = Stage::Implement;
        state.increment_retry(Stage::Implement);
        store.save(&mut state).unwrap();

        let loaded = store.load(&state.workflow_id).unwrap();
        assert_eq!(loaded.workflow_id, state.workflow_id);
        assert_eq!(loaded.current_stage, Stage::Implement);
        assert_eq!(loaded.retry_count(Stage::Implement), 1);
        assert_eq!(loaded.user_objective, "round trip");
    }

    #[test]
    fn test_save_creates_directory_skeleton() {
        let (_dir, store) = store();
        let mut state = WorkflowState::new("layout");
        store.save(&mut state).unwrap();

        let base = store.workflow_dir(&state.workflow_id);
        for dir in WORKFLOW_DIRS {
            assert!(base.join(dir).is_dir(), "missing {dir}/");
        }
        assert!(!base.join("state").join("current.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.load("20990101_000000_deadbeef").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!store.exists("20990101_000000_deadbeef"));
    }

    #[test]
    fn test_load_rejects_corrupt_document() {
        let (_dir, store) = store();
        let mut state = WorkflowState::new("corrupt");
        store.save(&mut state).unwrap();

        let path = store.workflow_dir(&state.workflow_id).join("state").join("current.json");
        fs::write(&path, b"{ not json").unwrap();
        let err = store.load(&state.workflow_id).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_gate_log_sequences_are_monotonic_per_stage() {
        let (_dir, store) = store();
        let mut state = WorkflowState::new("gates");
        store.save(&mut state).unwrap();

        let result = GateResult::new("PLAN", vec![], vec!["x".into()], GateAction::Revise, 0);
        assert_eq!(store.append_gate_result(&state.workflow_id, &result).unwrap(), 1);
        assert_eq!(store.append_gate_result(&state.workflow_id, &result).unwrap(), 2);

        let other = GateResult::new("TEST", vec![], vec![], GateAction::Proceed, 0);
        assert_eq!(store.append_gate_result(&state.workflow_id, &other).unwrap(), 1);

        let logs = store.workflow_dir(&state.workflow_id).join("logs");
        assert!(logs.join("gate_plan_001.json").is_file());
        assert!(logs.join("gate_plan_002.json").is_file());
        assert!(logs.join("gate_test_001.json").is_file());
    }

    #[test]
    fn test_concurrent_stores_never_reuse_sequence_numbers() {
        let (_dir, store) = store();
        let mut state = WorkflowState::new("contention");
        store.save(&mut state).unwrap();
        let id = state.workflow_id.clone();
        let root = store.root().to_path_buf();

        // Two independent store handles over one root, as separate watch
        // and transition processes would have.
        let writer = |root: PathBuf, id: String| {
            std::thread::spawn(move || {
                let store = JsonStateStore::new(root);
                let result =
                    GateResult::new("PLAN", vec![], vec!["x".into()], GateAction::Revise, 0);
                (0..50)
                    .map(|_| store.append_gate_result(&id, &result).unwrap())
                    .collect::<Vec<u64>>()
            })
        };
        let a = writer(root.clone(), id.clone());
        let b = writer(root, id.clone());

        let mut seqs = a.join().unwrap();
        seqs.extend(b.join().unwrap());
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), 100, "writers shared a sequence number");
        assert_eq!(seqs, (1..=100).collect::<Vec<u64>>());

        let logs = fs::read_dir(store.logs_dir(&id)).unwrap().count();
        assert_eq!(logs, 100);
    }

    #[test]
    fn test_reprompt_lands_next_to_gate_log() {
        let (_dir, store) = store();
        let mut state = WorkflowState::new("reprompts");
        store.save(&mut state).unwrap();

        store.write_reprompt(&state.workflow_id, "REVIEW", 2, "fix it").unwrap();
        let path =
            store.workflow_dir(&state.workflow_id).join("logs").join("reprompt_review_002.md");
        assert_eq!(fs::read_to_string(path).unwrap(), "fix it");
    }

    #[test]
    fn test_list_and_latest_workflows() {
        let (_dir, store) = store();
        assert!(store.latest_workflow().unwrap().is_none());

        let mut first = WorkflowState::new("first");
        first.workflow_id = "20260101_000000_aaaaaaaa".to_string();
        store.save(&mut first).unwrap();
        let mut second = WorkflowState::new("second");
        second.workflow_id = "20260102_000000_bbbbbbbb".to_string();
        store.save(&mut second).unwrap();

        assert_eq!(
            store.list_workflows().unwrap(),
            vec!["20260102_000000_bbbbbbbb".to_string(), "20260101_000000_aaaaaaaa".to_string()]
        );
        assert_eq!(store.latest_workflow().unwrap().as_deref(), Some("20260102_000000_bbbbbbbb"));
    }
}
