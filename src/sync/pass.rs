//! One reconciliation pass
//!
//! Classifies the artifact set, reconciles the folder forest built from all
//! artifacts, then uploads the changed ones. Failures are counted and logged
//! but never abort the batch. An artifact whose read or upload failed has its
//! fingerprint forgotten so the next pass retries it; malformed content is
//! skipped until the file changes.

use super::artifact::ArtifactRecord;
use super::upload::UploadDriver;
use crate::change::ChangeDetector;
use crate::error::SyncError;
use crate::remote::FolderReconciler;
use crate::source::ArtifactReader;
use crate::tree::FolderForest;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Counters and errors from one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub total: usize,
    pub changed: usize,
    pub uploaded: usize,
    pub failed_uploads: usize,
    pub skipped_artifacts: usize,
    pub folder_failures: usize,
    pub errors: Vec<String>,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failed_uploads == 0 && self.skipped_artifacts == 0 && self.folder_failures == 0
    }

    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(String::as_str)
    }
}

/// Long-lived pass state: fingerprints, folder reconciler and uploader
pub struct ReconciliationPass {
    base: PathBuf,
    reader: Arc<dyn ArtifactReader>,
    detector: ChangeDetector,
    reconciler: Arc<FolderReconciler>,
    uploader: UploadDriver,
}

impl ReconciliationPass {
    pub fn new(
        base: impl Into<PathBuf>,
        reader: Arc<dyn ArtifactReader>,
        reconciler: Arc<FolderReconciler>,
        uploader: UploadDriver,
    ) -> Self {
        Self {
            base: base.into(),
            reader,
            detector: ChangeDetector::new(),
            reconciler,
            uploader,
        }
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub async fn run(&mut self, all_paths: &[PathBuf], provenance: Option<&str>) -> PassReport {
        let mut report = PassReport {
            total: all_paths.len(),
            ..PassReport::default()
        };

        let changed = self.detector.changed_subset(all_paths, self.reader.as_ref());
        report.changed = changed.len();
        if changed.is_empty() {
            info!(total = report.total, "No dashboard changes detected");
            return report;
        }
        info!(changed = report.changed, total = report.total, "Detected changed dashboards");

        // Folders come from every artifact so unchanged ones still get a home.
        let mut forest = FolderForest::build(all_paths, &self.base);
        for outcome in self.reconciler.reconcile_forest(&mut forest).await {
            if let Err(e) = outcome.result {
                report.folder_failures += 1;
                report.errors.push(e.to_string());
            }
        }

        for path in &changed {
            let artifact = match ArtifactRecord::load(path, &self.base, self.reader.as_ref()) {
                Ok(artifact) => artifact,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load dashboard, skipping");
                    // Malformed content stays skipped until it is edited; read errors retry.
                    if !matches!(e, SyncError::InvalidArtifact { .. }) {
                        self.detector.forget(path);
                    }
                    report.skipped_artifacts += 1;
                    report.errors.push(e.to_string());
                    continue;
                }
            };

            match self.uploader.upload(&artifact, provenance).await {
                Ok(()) => report.uploaded += 1,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to upload dashboard");
                    self.detector.forget(path);
                    report.failed_uploads += 1;
                    report.errors.push(e.to_string());
                }
            }
        }

        info!(
            uploaded = report.uploaded,
            failed = report.failed_uploads,
            skipped = report.skipped_artifacts,
            folder_failures = report.folder_failures,
            "Sync pass completed"
        );
        report
    }
}
