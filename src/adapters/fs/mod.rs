//! Filesystem adapters for the persistence, evidence, and readiness ports.

pub mod evidence_probe;
pub mod readiness;
pub mod state_store;

pub use evidence_probe::FsEvidenceProbe;
pub use readiness::FsReadinessChecker;
pub use state_store::JsonStateStore;
