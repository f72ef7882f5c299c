//! Remote folder reconciliation
//!
//! Walks the folder forest top-down and, for every node, adopts the remote
//! folder with the same name under the same parent or creates it. Every node
//! is queried before any create, so a pass can be re-run each poll cycle
//! without accumulating duplicates. A create answered with a conflict is
//! resolved by querying again and adopting what is there.
//!
//! The walk uses an explicit stack in pre-order, matching a recursive
//! descent: a parent is always resolved before its children, and the first
//! failure inside a root's subtree ends that root's walk. Separate roots are
//! independent.

use super::cache::{FolderCache, FolderRef};
use super::contract::RemoteApi;
use crate::error::RemoteError;
use crate::tree::path::{join_segments, split_folder_path};
use crate::tree::{FolderForest, NodeIndex};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Failure to reconcile one folder
#[derive(Debug, Error)]
#[error("Failed to reconcile folder '{path}': {source}")]
pub struct ReconcileError {
    pub path: String,
    #[source]
    pub source: RemoteError,
}

/// Result of reconciling one forest root and its subtree
#[derive(Debug)]
pub struct RootOutcome {
    pub root: String,
    /// Folders resolved before the walk ended, in visiting order
    pub reconciled: Vec<String>,
    pub result: Result<(), ReconcileError>,
}

impl RootOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Creates or adopts remote folders for a folder forest
pub struct FolderReconciler {
    api: Arc<dyn RemoteApi>,
    cache: Arc<FolderCache>,
}

impl FolderReconciler {
    pub fn new(api: Arc<dyn RemoteApi>, cache: Arc<FolderCache>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<FolderCache> {
        &self.cache
    }

    /// Reconcile every root of `forest`, one independent walk per root.
    pub async fn reconcile_forest(&self, forest: &mut FolderForest) -> Vec<RootOutcome> {
        let roots = forest.roots();
        let mut outcomes = Vec::with_capacity(roots.len());
        for root in roots {
            let outcome = self.reconcile_subtree(forest, root, None).await;
            if let Err(e) = &outcome.result {
                error!(root = %outcome.root, folder = %e.path, error = %e.source, "Failed to reconcile folder tree");
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Reconcile `root` and its descendants under `parent_uid`.
    pub async fn reconcile_subtree(
        &self,
        forest: &mut FolderForest,
        root: NodeIndex,
        parent_uid: Option<&str>,
    ) -> RootOutcome {
        let root_path = forest.node(root).full_path.clone();
        let mut reconciled = Vec::new();
        let mut stack: Vec<(NodeIndex, Option<String>)> =
            vec![(root, parent_uid.map(str::to_string))];

        while let Some((idx, parent)) = stack.pop() {
            let (name, full_path) = {
                let node = forest.node(idx);
                (node.name.clone(), node.full_path.clone())
            };

            let folder = match self.resolve_folder(&name, parent.as_deref()).await {
                Ok(folder) => folder,
                Err(source) => {
                    return RootOutcome {
                        root: root_path,
                        reconciled,
                        result: Err(ReconcileError {
                            path: full_path,
                            source,
                        }),
                    };
                }
            };

            forest.node_mut(idx).assign_remote(folder.id, folder.uid.clone());
            self.cache.insert(&full_path, folder.clone());
            reconciled.push(full_path);

            // Reverse so children are visited in their stored order.
            for &child in forest.children(idx).iter().rev() {
                stack.push((child, Some(folder.uid.clone())));
            }
        }

        RootOutcome {
            root: root_path,
            reconciled,
            result: Ok(()),
        }
    }

    /// Make sure every segment of `folder_path` exists remotely and return the
    /// deepest folder. `None` means the root, which needs no folder.
    ///
    /// A cached full path is returned without network calls; otherwise each
    /// segment is resolved in turn starting from the top level.
    pub async fn ensure_path(&self, folder_path: &str) -> Result<Option<FolderRef>, ReconcileError> {
        let parts = split_folder_path(folder_path);
        if parts.is_empty() {
            return Ok(None);
        }
        let full = join_segments(&parts);
        if let Some(cached) = self.cache.get(&full) {
            return Ok(Some(cached));
        }

        let mut parent: Option<FolderRef> = None;
        for i in 0..parts.len() {
            let current_path = join_segments(&parts[..=i]);
            let folder = self
                .resolve_folder(parts[i], parent.as_ref().map(|p| p.uid.as_str()))
                .await
                .map_err(|source| ReconcileError {
                    path: current_path.clone(),
                    source,
                })?;
            self.cache.insert(&current_path, folder.clone());
            parent = Some(folder);
        }
        Ok(parent)
    }

    /// Adopt the folder named `name` under `parent_uid`, creating it if absent.
    async fn resolve_folder(
        &self,
        name: &str,
        parent_uid: Option<&str>,
    ) -> Result<FolderRef, RemoteError> {
        if let Some(existing) = self.find_folder(name, parent_uid).await? {
            info!(folder = name, id = existing.id, uid = %existing.uid, parent_uid = ?parent_uid, "Folder already exists");
            return Ok(existing);
        }

        match self.api.create_folder(name, parent_uid).await {
            Ok(created) => {
                info!(folder = name, id = created.id, uid = %created.uid, parent_uid = ?parent_uid, "Created folder");
                Ok(FolderRef {
                    id: created.id,
                    uid: created.uid,
                })
            }
            Err(e) if e.is_conflict() => {
                warn!(folder = name, parent_uid = ?parent_uid, "Folder already exists (conflict), fetching it");
                match self.find_folder(name, parent_uid).await? {
                    Some(existing) => Ok(existing),
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// First folder under `parent_uid` whose name equals `name`.
    async fn find_folder(
        &self,
        name: &str,
        parent_uid: Option<&str>,
    ) -> Result<Option<FolderRef>, RemoteError> {
        let folders = self.api.list_folders(parent_uid).await?;
        let found = folders
            .into_iter()
            .find(|f| f.name == name && f.parent() == parent_uid)
            .map(|f| FolderRef { id: f.id, uid: f.uid });
        debug!(folder = name, parent_uid = ?parent_uid, found = found.is_some(), "Queried folder");
        Ok(found)
    }
}
