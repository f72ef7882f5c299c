//! Artifact records
//!
//! One parsed dashboard plus the folder it belongs in. Built fresh every
//! pass and dropped after the upload attempt.

use crate::error::SyncError;
use crate::source::ArtifactReader;
use crate::tree::classify;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A parsed source artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRecord {
    pub source_path: PathBuf,
    /// Derived from `source_path` and the base directory; empty for the root
    pub folder_path: String,
    pub content: Value,
}

impl ArtifactRecord {
    /// Read and parse `path`, deriving its folder relative to `base`.
    ///
    /// The content must be a JSON object.
    pub fn load<R>(path: &Path, base: &Path, reader: &R) -> Result<Self, SyncError>
    where
        R: ArtifactReader + ?Sized,
    {
        let folder_path = classify(base, path)?;
        let bytes = reader.read_bytes(path)?;
        let content: Value =
            serde_json::from_slice(&bytes).map_err(|e| SyncError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("invalid JSON: {}", e),
            })?;
        if !content.is_object() {
            return Err(SyncError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: "dashboard must be a JSON object".to_string(),
            });
        }
        Ok(Self {
            source_path: path.to_path_buf(),
            folder_path,
            content,
        })
    }

    pub fn is_root_level(&self) -> bool {
        self.folder_path.is_empty()
    }
}
