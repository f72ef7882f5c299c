//! Content-fingerprint change detection
//!
//! Keeps an in-memory table of the last fingerprint seen for each artifact
//! path and classifies paths as changed or unchanged between poll cycles.
//! The table is never persisted: a restart reclassifies every path as changed.

use crate::source::ArtifactReader;
use crate::types::Fingerprint;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Compute the fingerprint of raw artifact bytes.
pub fn fingerprint(content: &[u8]) -> Fingerprint {
    *blake3::hash(content).as_bytes()
}

/// Last-seen fingerprint per artifact path
#[derive(Debug, Default, Clone)]
pub struct FingerprintTable {
    entries: HashMap<PathBuf, Fingerprint>,
}

impl FingerprintTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    /// Store `fingerprint` for `path`, returning the previous entry.
    pub fn record(&mut self, path: &Path, fingerprint: Fingerprint) -> Option<Fingerprint> {
        self.entries.insert(path.to_path_buf(), fingerprint)
    }

    pub fn forget(&mut self, path: &Path) -> Option<Fingerprint> {
        self.entries.remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classifies artifact content as new, changed or unchanged
#[derive(Debug, Default)]
pub struct ChangeDetector {
    table: FingerprintTable,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &FingerprintTable {
        &self.table
    }

    /// Whether `content` differs from the last content seen for `path`.
    ///
    /// Always records the new fingerprint. A path never seen before counts
    /// as changed.
    pub fn has_changed(&mut self, path: &Path, content: &[u8]) -> bool {
        let new = fingerprint(content);
        match self.table.record(path, new) {
            Some(previous) => previous != new,
            None => true,
        }
    }

    /// Drop the stored fingerprint so the next classification reports a change.
    pub fn forget(&mut self, path: &Path) {
        self.table.forget(path);
    }

    /// Read every path and return the ones whose content changed, in input order.
    ///
    /// Unreadable paths are logged and skipped.
    pub fn changed_subset<R>(&mut self, paths: &[PathBuf], reader: &R) -> Vec<PathBuf>
    where
        R: ArtifactReader + ?Sized,
    {
        let mut changed = Vec::new();
        for path in paths {
            let content = match reader.read_bytes(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read artifact, skipping");
                    continue;
                }
            };
            if self.has_changed(path, &content) {
                if let Some(fp) = self.table.get(path) {
                    debug!(path = %path.display(), fingerprint = %hex::encode(&fp[..8]), "Artifact changed");
                }
                changed.push(path.clone());
            }
        }
        changed
    }
}
