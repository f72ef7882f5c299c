//! Folder forest construction
//!
//! Nodes live in an arena indexed by [`NodeIndex`]; `index` maps each
//! `full_path` to its slot. Node identity is the arena slot, so a child is
//! linked to its parent at most once no matter how many artifacts share it.

use super::node::{FolderNode, NodeIndex};
use super::path::{classify, join_segments, split_folder_path};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directed forest of folder nodes mirroring the artifact directory layout
#[derive(Debug, Clone, Default)]
pub struct FolderForest {
    nodes: Vec<FolderNode>,
    index: HashMap<String, NodeIndex>,
}

impl FolderForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the forest for a set of artifact files located under `base`.
    ///
    /// Files that do not sit under `base` are skipped with a warning.
    pub fn build(artifact_paths: &[PathBuf], base: &Path) -> Self {
        let mut forest = Self::new();
        for path in artifact_paths {
            match classify(base, path) {
                Ok(folder_path) => forest.insert_folder_path(&folder_path),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unclassifiable artifact"),
            }
        }
        debug!(folders = forest.len(), roots = forest.roots().len(), "Built folder forest");
        forest
    }

    /// Build the forest directly from logical folder paths.
    pub fn from_folder_paths<I, S>(folder_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut forest = Self::new();
        for path in folder_paths {
            forest.insert_folder_path(path.as_ref());
        }
        forest
    }

    /// Ensure a node exists for every prefix of `folder_path`, linking each
    /// to the node one segment shorter. The root path contributes nothing.
    pub fn insert_folder_path(&mut self, folder_path: &str) {
        let parts = split_folder_path(folder_path);
        let mut parent: Option<NodeIndex> = None;

        for i in 0..parts.len() {
            let current_path = join_segments(&parts[..=i]);
            let current = self.ensure_node(parts[i], current_path);

            if let Some(parent_idx) = parent {
                let siblings = &mut self.nodes[parent_idx].children;
                if !siblings.contains(&current) {
                    siblings.push(current);
                }
            }
            parent = Some(current);
        }
    }

    fn ensure_node(&mut self, name: &str, full_path: String) -> NodeIndex {
        if let Some(&idx) = self.index.get(&full_path) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(FolderNode::new(name, full_path.clone()));
        self.index.insert(full_path, idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, full_path: &str) -> Option<NodeIndex> {
        self.index.get(full_path).copied()
    }

    pub fn get(&self, full_path: &str) -> Option<&FolderNode> {
        self.index_of(full_path).map(|idx| &self.nodes[idx])
    }

    /// Panics if `idx` did not come from this forest.
    pub fn node(&self, idx: NodeIndex) -> &FolderNode {
        &self.nodes[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIndex) -> &mut FolderNode {
        &mut self.nodes[idx]
    }

    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.nodes[idx].children
    }

    pub fn iter(&self) -> impl Iterator<Item = &FolderNode> {
        self.nodes.iter()
    }

    /// Whether any node lists `idx` as a child.
    ///
    /// Linear scan; called once per node per reconciliation pass.
    pub fn has_parent(&self, idx: NodeIndex) -> bool {
        self.nodes.iter().any(|n| n.children.contains(&idx))
    }

    /// Nodes without a parent edge, ordered by `full_path`.
    pub fn roots(&self) -> Vec<NodeIndex> {
        let mut roots: Vec<NodeIndex> = (0..self.nodes.len())
            .filter(|&idx| !self.has_parent(idx))
            .collect();
        roots.sort_by(|a, b| self.nodes[*a].full_path.cmp(&self.nodes[*b].full_path));
        roots
    }

    /// All nodes' full paths, sorted.
    pub fn paths(&self) -> BTreeSet<String> {
        self.index.keys().cloned().collect()
    }

    /// Parent/child edges as `(parent_path, child_path)` pairs, sorted.
    ///
    /// Two forests with equal `paths()` and `edges()` are structurally identical.
    pub fn edges(&self) -> BTreeSet<(String, String)> {
        let mut edges = BTreeSet::new();
        for node in &self.nodes {
            for &child in &node.children {
                edges.insert((node.full_path.clone(), self.nodes[child].full_path.clone()));
            }
        }
        edges
    }
}
