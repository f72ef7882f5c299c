//! Artifact materialization.
//!
//! Copies every valid JSON dashboard from the checked-out repository (or a
//! subdirectory of it) into the dashboards directory, preserving the relative
//! layout. The returned paths are the artifact set for a reconciliation pass.

use crate::error::SyncError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Materializes dashboards from a repository checkout
#[derive(Debug, Clone)]
pub struct DashboardStager {
    repo_dir: PathBuf,
    repo_subdir: Option<String>,
    dashboards_dir: PathBuf,
}

impl DashboardStager {
    pub fn new(
        repo_dir: impl Into<PathBuf>,
        repo_subdir: Option<String>,
        dashboards_dir: impl Into<PathBuf>,
    ) -> Self {
        let repo_subdir = repo_subdir.filter(|s| !s.is_empty() && s != ".");
        Self {
            repo_dir: repo_dir.into(),
            repo_subdir,
            dashboards_dir: dashboards_dir.into(),
        }
    }

    /// Directory artifacts are read from
    pub fn source_root(&self) -> PathBuf {
        match &self.repo_subdir {
            Some(subdir) => self.repo_dir.join(subdir),
            None => self.repo_dir.clone(),
        }
    }

    /// Base directory folder paths are classified against
    pub fn dashboards_dir(&self) -> &Path {
        &self.dashboards_dir
    }

    /// Copy all valid JSON artifacts and return their staged paths, sorted.
    ///
    /// Unreadable or invalid files are logged and skipped.
    pub fn stage(&self) -> Result<Vec<PathBuf>, SyncError> {
        let source_root = self.source_root();
        if !source_root.is_dir() {
            return Err(SyncError::Source(format!(
                "Dashboard source directory does not exist: {}",
                source_root.display()
            )));
        }

        let in_place = same_dir(&source_root, &self.dashboards_dir);
        let dashboards_dir = self.dashboards_dir.clone();
        // Our own output only needs skipping when it lives below the walk root.
        let output_nested = !in_place && dashboards_dir.starts_with(&source_root);
        info!(source = %source_root.display(), dest = %dashboards_dir.display(), "Staging dashboards");

        let mut staged = Vec::new();
        let walker = WalkDir::new(&source_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                if e.file_type().is_dir() && e.file_name() == ".git" {
                    return false;
                }
                !output_nested || e.depth() == 0 || !e.path().starts_with(&dashboards_dir)
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                SyncError::Source(format!("Error walking {}: {}", source_root.display(), e))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let content = match std::fs::read(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read dashboard");
                    continue;
                }
            };
            if let Err(e) = serde_json::from_slice::<serde_json::Value>(&content) {
                warn!(path = %path.display(), error = %e, "Invalid JSON, skipping");
                continue;
            }

            let relative = match path.strip_prefix(&source_root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let dest = self.dashboards_dir.join(relative);

            if !in_place {
                if let Some(parent) = dest.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        warn!(path = %parent.display(), error = %e, "Failed to create directory");
                        continue;
                    }
                }
                if let Err(e) = std::fs::write(&dest, &content) {
                    warn!(path = %dest.display(), error = %e, "Failed to write dashboard");
                    continue;
                }
            }

            debug!(path = %dest.display(), "Dashboard staged");
            staged.push(dest);
        }

        staged.sort();
        info!(count = staged.len(), "Dashboards staged");
        Ok(staged)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
