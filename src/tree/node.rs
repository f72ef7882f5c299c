//! Folder node representation

use crate::types::FolderId;

/// Index of a node inside its [`super::FolderForest`] arena
pub type NodeIndex = usize;

/// One directory level, mapped to (eventually) one remote folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    /// Last path segment
    pub name: String,
    /// Slash-joined relative path, unique within the forest
    pub full_path: String,
    /// Remote numeric id, set once reconciled
    pub remote_id: Option<FolderId>,
    /// Remote string id, used as the parent reference for children
    pub remote_uid: Option<String>,
    /// Direct children, in first-seen order, without duplicates
    pub children: Vec<NodeIndex>,
}

impl FolderNode {
    pub fn new(name: impl Into<String>, full_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
            remote_id: None,
            remote_uid: None,
            children: Vec::new(),
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.remote_id.is_some() && self.remote_uid.is_some()
    }

    pub fn assign_remote(&mut self, id: FolderId, uid: impl Into<String>) {
        self.remote_id = Some(id);
        self.remote_uid = Some(uid.into());
    }
}
