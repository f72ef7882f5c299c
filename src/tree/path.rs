//! Logical folder paths.
//!
//! Folder paths are relative, slash-separated and never carry a leading or
//! trailing separator. The empty string names the root.

use crate::error::SyncError;
use crate::types::PATH_SEPARATOR;
use std::path::Path;

/// Split a path on either separator convention, dropping empty and `.`
/// segments and resolving `..` against the preceding segment.
fn segments(raw: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for part in raw.split(|c| c == '/' || c == '\\') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn is_absolute(raw: &str) -> bool {
    raw.starts_with('/') || raw.starts_with('\\')
}

/// Compute the folder path of `file`'s containing directory relative to `base`.
///
/// Both arguments may use `/` or `\` as separator; the result always uses `/`.
/// Returns an empty string for artifacts that sit directly in `base`.
pub fn classify(base: &Path, file: &Path) -> Result<String, SyncError> {
    let base_raw = base.to_string_lossy();
    let file_raw = file.to_string_lossy();

    let outside = || SyncError::InvalidArtifact {
        path: file.to_path_buf(),
        reason: format!("not located under {}", base.display()),
    };

    if is_absolute(&base_raw) != is_absolute(&file_raw) {
        return Err(outside());
    }

    let base_parts = segments(&base_raw);
    let mut file_parts = segments(&file_raw);
    if file_parts.pop().is_none() {
        return Err(SyncError::InvalidArtifact {
            path: file.to_path_buf(),
            reason: "empty path".to_string(),
        });
    }

    if file_parts.len() < base_parts.len() || file_parts[..base_parts.len()] != base_parts[..] {
        return Err(outside());
    }

    Ok(join_segments(&file_parts[base_parts.len()..]))
}

/// Split a logical folder path into its ordered segments.
pub fn split_folder_path(folder_path: &str) -> Vec<&str> {
    segments(folder_path)
}

/// Join segments with the canonical separator.
pub fn join_segments(parts: &[&str]) -> String {
    let mut joined = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            joined.push(PATH_SEPARATOR);
        }
        joined.push_str(part);
    }
    joined
}

/// Canonical form of a folder path (`a\\b/./c/` becomes `a/b/c`).
pub fn normalize_folder_path(folder_path: &str) -> String {
    join_segments(&split_folder_path(folder_path))
}
