//! Local startup readiness checks.
//!
//! Everything here is probeable without network access: the workflow
//! directory skeleton, a state-store write/read round trip, and the gate
//! log path. The controller only consumes the aggregate verdict.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::{CheckOutcome, ReadinessChecker, ReadinessReport};

/// Readiness checker over the workflow's state root.
pub struct FsReadinessChecker {
    root: PathBuf,
    scheduler_interval: Duration,
}

impl FsReadinessChecker {
    pub fn new(root: impl Into<PathBuf>, scheduler_interval: Duration) -> Self {
        Self { root: root.into(), scheduler_interval }
    }

    fn check_workflow_dir(&self) -> CheckOutcome {
        match fs::create_dir_all(&self.root) {
            Ok(()) => CheckOutcome::pass("workflow_dir"),
            Err(e) => CheckOutcome::fail(
                "workflow_dir",
                format!("cannot create {}: {e}", self.root.display()),
            ),
        }
    }

    // Write, read back, and remove a scratch file under the state root.
    fn check_state_store(&self) -> CheckOutcome {
        let path = self.root.join(".readiness_probe");
        let payload = b"probe";
        let result = fs::write(&path, payload)
            .and_then(|()| fs::read(&path))
            .and_then(|read| {
                fs::remove_file(&path)?;
                if read == payload {
                    Ok(())
                } else {
                    Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "read back different bytes",
                    ))
                }
            });
        match result {
            Ok(()) => CheckOutcome::pass("state_store"),
            Err(e) => CheckOutcome::fail("state_store", format!("round-trip failed: {e}")),
        }
    }

    fn check_scheduler(&self) -> CheckOutcome {
        if self.scheduler_interval.is_zero() {
            CheckOutcome::fail("scheduler", "check interval is zero")
        } else {
            CheckOutcome::pass("scheduler")
        }
    }

    fn check_environment(&self) -> CheckOutcome {
        if self.root.is_absolute() || std::env::current_dir().is_ok() {
            CheckOutcome::pass("environment")
        } else {
            CheckOutcome::fail("environment", "no resolvable working directory")
        }
    }
}

#[async_trait]
impl ReadinessChecker for FsReadinessChecker {
    async fn run_checks(&self) -> ReadinessReport {
        let report = ReadinessReport::new(vec![
            self.check_workflow_dir(),
            self.check_state_store(),
            self.check_scheduler(),
            self.check_environment(),
        ]);
        if report.all_passed() {
            tracing::info!("startup readiness: all checks passed");
        } else {
            tracing::warn!(failing = ?report.failing(), "startup readiness failed");
        }
        report
    }
}
