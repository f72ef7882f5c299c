//! Source collaborator contract.
//!
//! The sync engine only needs a revision id to detect new commits, revision
//! metadata for provenance, and a way to read artifact bytes.

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use std::io;
use std::path::Path;

/// Metadata of the revision currently checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub email: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RevisionInfo {
    /// Human-readable provenance attached to uploaded dashboards.
    ///
    /// Format: `commit abc1234: <message> - <author>`
    pub fn provenance_message(&self) -> String {
        let short: String = self.hash.chars().take(7).collect();
        format!("commit {}: {} - {}", short, self.message, self.author)
    }
}

/// Version-controlled source of artifacts
pub trait SourceRepository: Send {
    /// Materialize the source locally. Called once at startup.
    fn prepare(&mut self) -> Result<(), SyncError>;

    /// Bring the local copy up to date and return the current revision id.
    fn fetch_latest_revision(&mut self) -> Result<String, SyncError>;

    /// Metadata of the current revision.
    fn revision_info(&self) -> Result<RevisionInfo, SyncError>;
}

/// Reads raw artifact bytes
pub trait ArtifactReader: Send + Sync {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads artifacts from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl ArtifactReader for FsReader {
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_message_shortens_hash() {
        let info = RevisionInfo {
            hash: "0123456789abcdef".to_string(),
            message: "Update latency panel".to_string(),
            author: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            timestamp: None,
        };
        assert_eq!(
            info.provenance_message(),
            "commit 0123456: Update latency panel - Dana"
        );
    }

    #[test]
    fn test_provenance_message_short_hash_kept_whole() {
        let info = RevisionInfo {
            hash: "abc".to_string(),
            message: "m".to_string(),
            author: "a".to_string(),
            email: String::new(),
            timestamp: None,
        };
        assert_eq!(info.provenance_message(), "commit abc: m - a");
    }
}
