//! Remote API contract.
//!
//! The three calls the sync engine needs from the dashboard server. Shapes
//! follow the server's JSON; the HTTP implementation lives in `http`.

use crate::error::RemoteError;
use crate::types::FolderId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Folder as listed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolder {
    pub id: FolderId,
    pub uid: String,
    #[serde(rename = "title")]
    pub name: String,
    #[serde(rename = "parentUid", default, skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<String>,
}

impl RemoteFolder {
    /// Parent reference with the server's empty-string root folded into `None`.
    pub fn parent(&self) -> Option<&str> {
        self.parent_uid.as_deref().filter(|p| !p.is_empty())
    }
}

/// Identifiers assigned to a newly created folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFolder {
    pub id: FolderId,
    pub uid: String,
}

/// Create-or-overwrite request for one dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardUpsert {
    pub dashboard: serde_json::Value,
    #[serde(rename = "folderId")]
    pub folder_id: FolderId,
    pub overwrite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DashboardUpsert {
    pub fn new(dashboard: serde_json::Value, folder_id: FolderId, message: Option<String>) -> Self {
        Self {
            dashboard,
            folder_id,
            overwrite: true,
            message: message.filter(|m| !m.is_empty()),
        }
    }
}

/// Calls the sync engine issues against the dashboard server
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// List folders directly under `parent_uid` (top level when `None`).
    async fn list_folders(&self, parent_uid: Option<&str>) -> Result<Vec<RemoteFolder>, RemoteError>;

    /// Create a folder. Name collisions surface as [`RemoteError::Conflict`].
    async fn create_folder(
        &self,
        name: &str,
        parent_uid: Option<&str>,
    ) -> Result<CreatedFolder, RemoteError>;

    /// Create or overwrite a dashboard.
    async fn upsert_dashboard(&self, request: &DashboardUpsert) -> Result<(), RemoteError>;
}
