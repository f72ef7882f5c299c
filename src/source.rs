//! Source tree collaborator: fetching revisions and materializing artifacts.

pub mod contract;
pub mod git;
pub mod stage;

pub use contract::{ArtifactReader, FsReader, RevisionInfo, SourceRepository};
pub use git::{GitAuth, GitRepository};
pub use stage::DashboardStager;
