//! Folder path to remote reference cache
//!
//! Populated only by the reconciler after a folder was found or created.
//! Entries live until the process exits or the upload driver evicts one
//! whose folder turned out to be gone remotely.

use crate::tree::path::normalize_folder_path;
use crate::types::FolderId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Remote identifiers of one folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    pub id: FolderId,
    pub uid: String,
}

/// Process-wide `full_path -> FolderRef` mapping
#[derive(Debug, Default)]
pub struct FolderCache {
    entries: RwLock<HashMap<String, FolderRef>>,
}

impl FolderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, full_path: &str, folder: FolderRef) {
        self.entries
            .write()
            .insert(normalize_folder_path(full_path), folder);
    }

    /// Cached numeric id for `full_path`; `None` for the root or unknown paths.
    pub fn folder_id(&self, full_path: &str) -> Option<FolderId> {
        self.get(full_path).map(|f| f.id)
    }

    pub fn get(&self, full_path: &str) -> Option<FolderRef> {
        let key = normalize_folder_path(full_path);
        if key.is_empty() {
            return None;
        }
        self.entries.read().get(&key).cloned()
    }

    pub fn evict(&self, full_path: &str) -> Option<FolderRef> {
        self.entries.write().remove(&normalize_folder_path(full_path))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
