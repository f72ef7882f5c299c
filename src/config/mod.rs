//! Configuration
//!
//! `SyncConfig` is assembled from built-in defaults, an optional TOML file,
//! `DASHSYNC_*` environment variables and the flat environment variables
//! used by existing sidecar deployments (highest precedence).

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::SyncError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const MASK: &str = "***";

/// Where dashboards come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub repo_url: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub ssh_key: String,
    #[serde(default)]
    pub https_user: String,
    #[serde(default)]
    pub https_password: String,
    #[serde(default = "default_data_dir")]
    pub repo_dir: PathBuf,
    /// Subdirectory of the checkout holding dashboards; empty for the whole repo
    #[serde(default)]
    pub repo_subdir: String,
    /// Staging directory; folder paths are derived relative to it
    #[serde(default = "default_data_dir")]
    pub dashboards_dir: PathBuf,
}

/// The dashboard server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Service account token; provisioned at startup when empty
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,
    #[serde(default = "default_service_account")]
    pub service_account: String,
    #[serde(default = "default_token_name")]
    pub token_name: String,
}

/// Complete process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_health_addr")]
    pub health_addr: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/tmp/grafana_data")
}

fn default_request_timeout() -> u64 {
    10
}

fn default_ready_timeout() -> u64 {
    120
}

fn default_service_account() -> String {
    "git-sync-sa".to_string()
}

fn default_token_name() -> String {
    "git-sync-token".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_health_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo_url: String::new(),
            branch: String::new(),
            ssh_key: String::new(),
            https_user: String::new(),
            https_password: String::new(),
            repo_dir: default_data_dir(),
            repo_subdir: String::new(),
            dashboards_dir: default_data_dir(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: String::new(),
            password: String::new(),
            token: String::new(),
            request_timeout_secs: default_request_timeout(),
            ready_timeout_secs: default_ready_timeout(),
            service_account: default_service_account(),
            token_name: default_token_name(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            remote: RemoteConfig::default(),
            poll_interval_secs: default_poll_interval(),
            health_addr: default_health_addr(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RemoteConfig {
    pub fn has_basic_auth(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

impl SourceConfig {
    pub fn has_ssh_key(&self) -> bool {
        !self.ssh_key.is_empty()
    }

    pub fn has_https_auth(&self) -> bool {
        !self.https_user.is_empty() && !self.https_password.is_empty()
    }

    pub fn repo_subdir(&self) -> Option<String> {
        Some(self.repo_subdir.clone()).filter(|s| !s.is_empty())
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Check required fields and that both sides have usable credentials.
    pub fn validate(&self) -> Result<(), SyncError> {
        let required = [
            ("source.repo_url (GIT_REPO_URL)", &self.source.repo_url),
            ("source.branch (GIT_BRANCH)", &self.source.branch),
            ("remote.url (GRAFANA_URL)", &self.remote.url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(SyncError::ConfigError(format!("{} is required", name)));
            }
        }
        if !self.source.has_ssh_key() && !self.source.has_https_auth() {
            return Err(SyncError::ConfigError(
                "No git authentication provided (SSH key or HTTPS credentials required)".to_string(),
            ));
        }
        if !self.remote.has_token() && !self.remote.has_basic_auth() {
            return Err(SyncError::ConfigError(
                "No remote authentication provided (token or user and password required)".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(SyncError::ConfigError(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy with every non-empty secret replaced by `***`.
    pub fn safe_for_log(&self) -> SyncConfig {
        let mut masked = self.clone();
        for secret in [
            &mut masked.source.ssh_key,
            &mut masked.source.https_password,
            &mut masked.remote.password,
            &mut masked.remote.token,
        ] {
            if !secret.is_empty() {
                *secret = MASK.to_string();
            }
        }
        masked
    }
}
