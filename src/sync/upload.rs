//! Artifact upload driver

use super::artifact::ArtifactRecord;
use crate::error::SyncError;
use crate::remote::{DashboardUpsert, FolderReconciler, RemoteApi};
use crate::types::{FolderId, ROOT_FOLDER_ID};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Uploads artifacts into their remote folders
pub struct UploadDriver {
    api: Arc<dyn RemoteApi>,
    reconciler: Arc<FolderReconciler>,
}

impl UploadDriver {
    pub fn new(api: Arc<dyn RemoteApi>, reconciler: Arc<FolderReconciler>) -> Self {
        Self { api, reconciler }
    }

    /// Resolve the artifact's folder and upsert it with optional provenance.
    ///
    /// A folder missing from the cache is reconciled on demand. An upload
    /// rejected with 404 evicts the cached folder so the next attempt
    /// resolves it again.
    pub async fn upload(
        &self,
        artifact: &ArtifactRecord,
        message: Option<&str>,
    ) -> Result<(), SyncError> {
        let folder_id = self.resolve_folder(&artifact.folder_path).await?;
        let request = DashboardUpsert::new(
            artifact.content.clone(),
            folder_id,
            message.map(str::to_string),
        );

        match self.api.upsert_dashboard(&request).await {
            Ok(()) => {
                info!(path = %artifact.source_path.display(), folder = %artifact.folder_path, remote_id = folder_id, "Uploaded dashboard");
                Ok(())
            }
            Err(e) => {
                if e.is_not_found() && !artifact.is_root_level() {
                    warn!(folder = %artifact.folder_path, remote_id = folder_id, "Cached folder no longer exists, evicting");
                    self.reconciler.cache().evict(&artifact.folder_path);
                }
                Err(e.into())
            }
        }
    }

    async fn resolve_folder(&self, folder_path: &str) -> Result<FolderId, SyncError> {
        if folder_path.is_empty() {
            return Ok(ROOT_FOLDER_ID);
        }
        if let Some(id) = self.reconciler.cache().folder_id(folder_path) {
            return Ok(id);
        }

        debug!(folder = folder_path, "Folder not cached, reconciling on demand");
        match self.reconciler.ensure_path(folder_path).await {
            Ok(Some(folder)) => Ok(folder.id),
            Ok(None) => Ok(ROOT_FOLDER_ID),
            Err(e) => {
                warn!(folder = folder_path, failed = %e.path, error = %e.source, "Failed to ensure folder");
                Err(SyncError::FolderUnresolved {
                    path: folder_path.to_string(),
                })
            }
        }
    }
}
