//! Folder tree derived from artifact paths.
//!
//! `path` turns an artifact's location into a logical folder path, `graph`
//! assembles those folder paths into a forest of [`FolderNode`]s.

pub mod graph;
pub mod node;
pub mod path;

pub use graph::FolderForest;
pub use node::{FolderNode, NodeIndex};
pub use path::classify;
