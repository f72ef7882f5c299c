//! Git-backed source repository driven through the `git` CLI.

use super::contract::{RevisionInfo, SourceRepository};
use crate::error::SyncError;
use chrono::{DateTime, Utc};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Credentials used to reach the remote repository
#[derive(Clone, PartialEq, Eq)]
pub enum GitAuth {
    Ssh { private_key: String },
    Https { user: String, password: String },
}

impl std::fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitAuth::Ssh { .. } => f.write_str("GitAuth::Ssh { private_key: *** }"),
            GitAuth::Https { user, .. } => {
                write!(f, "GitAuth::Https {{ user: {:?}, password: *** }}", user)
            }
        }
    }
}

impl GitAuth {
    /// Pick the auth method for `repo_url`.
    ///
    /// An SSH key is used only for SSH-style URLs; otherwise both HTTPS
    /// credentials must be present.
    pub fn select(
        repo_url: &str,
        ssh_key: Option<&str>,
        https_user: Option<&str>,
        https_password: Option<&str>,
    ) -> Result<Self, SyncError> {
        let is_ssh_url = repo_url.starts_with("ssh://") || repo_url.starts_with("git@");
        if let Some(key) = ssh_key.filter(|k| !k.is_empty()) {
            if is_ssh_url {
                let expanded = expand_private_key(key);
                if expanded.trim().is_empty() {
                    return Err(SyncError::ConfigError("SSH key is empty".to_string()));
                }
                return Ok(GitAuth::Ssh {
                    private_key: expanded,
                });
            }
        }

        match (https_user, https_password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Ok(GitAuth::Https {
                    user: user.to_string(),
                    password: password.to_string(),
                })
            }
            _ => Err(SyncError::ConfigError(
                "No git authentication usable for this repository URL (SSH key or HTTPS credentials required)"
                    .to_string(),
            )),
        }
    }
}

/// Keys passed through environment variables often carry literal `\n`.
fn expand_private_key(key: &str) -> String {
    let mut expanded = key.replace("\\n", "\n");
    if !expanded.ends_with('\n') {
        expanded.push('\n');
    }
    expanded
}

/// Shallow single-branch checkout of a remote repository
pub struct GitRepository {
    repo_url: String,
    branch: String,
    repo_dir: PathBuf,
    auth: GitAuth,
    ssh_key_file: Option<NamedTempFile>,
}

impl GitRepository {
    pub fn new(
        repo_url: impl Into<String>,
        branch: impl Into<String>,
        repo_dir: impl Into<PathBuf>,
        auth: GitAuth,
    ) -> Result<Self, SyncError> {
        let ssh_key_file = match &auth {
            GitAuth::Ssh { private_key } => {
                let mut file = NamedTempFile::new()?;
                file.write_all(private_key.as_bytes())?;
                file.flush()?;
                info!(bytes = private_key.len(), "Using SSH key authentication");
                Some(file)
            }
            GitAuth::Https { .. } => {
                info!("Using HTTPS authentication");
                None
            }
        };

        Ok(Self {
            repo_url: repo_url.into(),
            branch: branch.into(),
            repo_dir: repo_dir.into(),
            auth,
            ssh_key_file,
        })
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Clone URL with HTTPS credentials embedded (percent-encoded).
    fn authenticated_url(&self) -> Result<String, SyncError> {
        match &self.auth {
            GitAuth::Ssh { .. } => Ok(self.repo_url.clone()),
            GitAuth::Https { user, password } => {
                let mut url = reqwest::Url::parse(&self.repo_url).map_err(|e| {
                    SyncError::ConfigError(format!("Invalid repository URL {}: {}", self.repo_url, e))
                })?;
                url.set_username(user).map_err(|_| {
                    SyncError::ConfigError(format!("Cannot set credentials on {}", self.repo_url))
                })?;
                url.set_password(Some(password)).map_err(|_| {
                    SyncError::ConfigError(format!("Cannot set credentials on {}", self.repo_url))
                })?;
                Ok(url.to_string())
            }
        }
    }

    fn redact(&self, text: &str) -> String {
        match &self.auth {
            GitAuth::Https { password, .. } if !password.is_empty() => text.replace(password.as_str(), "***"),
            _ => text.to_string(),
        }
    }

    fn is_prepared(&self) -> bool {
        self.repo_dir.join(".git").exists()
    }

    fn git<I, S>(&self, args: I) -> Result<String, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new("git");
        command.args(args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(key_file) = &self.ssh_key_file {
            command.env(
                "GIT_SSH_COMMAND",
                format!(
                    "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null",
                    key_file.path().display()
                ),
            );
        }

        let output = command
            .output()
            .map_err(|e| SyncError::Source(format!("Failed to run git: {}", e)))?;
        if !output.status.success() {
            return Err(SyncError::Source(self.redact(&format!(
                "git exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn git_in_repo(&self, args: &[&str]) -> Result<String, SyncError> {
        let mut full: Vec<&OsStr> = vec![OsStr::new("-C"), self.repo_dir.as_os_str()];
        full.extend(args.iter().map(OsStr::new));
        self.git(full)
    }
}

impl SourceRepository for GitRepository {
    fn prepare(&mut self) -> Result<(), SyncError> {
        info!(branch = %self.branch, dir = %self.repo_dir.display(), "Cloning repository");

        if self.repo_dir.exists() {
            std::fs::remove_dir_all(&self.repo_dir)?;
        }
        if let Some(parent) = self.repo_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = self.authenticated_url()?;
        self.git([
            OsStr::new("clone"),
            OsStr::new("--depth"),
            OsStr::new("1"),
            OsStr::new("--single-branch"),
            OsStr::new("--branch"),
            OsStr::new(&self.branch),
            OsStr::new(&url),
            self.repo_dir.as_os_str(),
        ])?;

        info!("Repository cloned");
        Ok(())
    }

    fn fetch_latest_revision(&mut self) -> Result<String, SyncError> {
        if !self.is_prepared() {
            return Err(SyncError::Source(
                "Repository not initialized, call prepare first".to_string(),
            ));
        }

        self.git_in_repo(&["fetch", "--depth", "1", "origin", self.branch.as_str()])?;
        self.git_in_repo(&["reset", "--hard", "FETCH_HEAD"])?;
        let head = self.git_in_repo(&["rev-parse", "HEAD"])?;
        let head = head.trim().to_string();
        debug!(revision = %head, "Fetched latest revision");
        Ok(head)
    }

    fn revision_info(&self) -> Result<RevisionInfo, SyncError> {
        if !self.is_prepared() {
            return Err(SyncError::Source("Repository not initialized".to_string()));
        }
        let raw = self.git_in_repo(&["log", "-1", "--format=%H%x00%an%x00%ae%x00%aI%x00%B"])?;
        parse_log_record(&raw)
    }
}

/// Parse one `%H%x00%an%x00%ae%x00%aI%x00%B` record.
fn parse_log_record(raw: &str) -> Result<RevisionInfo, SyncError> {
    let mut fields = raw.splitn(5, '\0');
    let mut next = |name: &str| {
        fields
            .next()
            .ok_or_else(|| SyncError::Source(format!("git log output missing {}", name)))
    };
    let hash = next("hash")?.trim().to_string();
    let author = next("author")?.to_string();
    let email = next("email")?.to_string();
    let date = next("date")?;
    let message = next("message")?.trim().to_string();

    let timestamp = DateTime::parse_from_rfc3339(date.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc));

    Ok(RevisionInfo {
        hash,
        message,
        author,
        email,
        timestamp,
    })
}
