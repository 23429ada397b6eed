//! Evidence-file existence probe port.

use std::path::Path;

/// Filesystem existence check keyed by an evidence record's `location`.
///
/// Used as an extra gate condition when a location is declared. The gate
/// never reads the file; existence is the whole contract.
pub trait EvidenceProbe: Send + Sync {
    fn exists(&self, location: &Path) -> bool;
}

/// Probe that accepts every location. For tests and for deployments that
/// validate evidence out of band.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEvidenceProbe;

impl EvidenceProbe for NullEvidenceProbe {
    fn exists(&self, _location: &Path) -> bool {
        true
    }
}
