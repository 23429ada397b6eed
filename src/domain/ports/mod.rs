//! Port trait definitions (hexagonal architecture).
//!
//! These contracts keep the domain independent of concrete infrastructure:
//! - `StateStore`: full-replace persistence and the append-only gate log
//! - `EvidenceProbe`: evidence-file existence checks
//! - `ReadinessChecker`: startup gating
//! - `StageNotifier`: transition event sink

pub mod errors;
pub mod evidence_probe;
pub mod notifier;
pub mod readiness;
pub mod state_store;

pub use errors::StoreError;
pub use evidence_probe::{EvidenceProbe, NullEvidenceProbe};
pub use notifier::{StageNotifier, TracingNotifier};
pub use readiness::{CheckOutcome, ReadinessChecker, ReadinessReport};
pub use state_store::StateStore;
