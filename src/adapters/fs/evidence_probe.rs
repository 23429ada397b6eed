//! Filesystem evidence probe.

use std::path::Path;

use crate::domain::ports::EvidenceProbe;

/// Probe that checks evidence locations against the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsEvidenceProbe;

impl EvidenceProbe for FsEvidenceProbe {
    fn exists(&self, location: &Path) -> bool {
        location.exists()
    }
}
