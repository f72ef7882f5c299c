//! Core scalar types shared across the sync engine.

/// Fingerprint: BLAKE3 digest of an artifact's raw bytes
pub type Fingerprint = [u8; 32];

/// Numeric folder identifier assigned by the remote server
pub type FolderId = i64;

/// Folder id the remote server uses for its top-level (root) folder
pub const ROOT_FOLDER_ID: FolderId = 0;

/// Separator used in logical folder paths
pub const PATH_SEPARATOR: char = '/';
