//! Poll loop
//!
//! Owns the source checkout, the stager and the long-lived pass state, and
//! drives one reconciliation per new revision. A revision only counts as
//! synced once a pass over it finished without failures, so a failed pass is
//! retried on the next poll even when no new commit arrived.

use super::pass::{PassReport, ReconciliationPass};
use super::upload::UploadDriver;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::health::HealthChecker;
use crate::remote::{FolderCache, FolderReconciler, GrafanaClient, RemoteApi, RemoteAuth};
use crate::source::{DashboardStager, FsReader, GitAuth, GitRepository, SourceRepository};
use chrono::Utc;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const BASIC_AUTH_ATTEMPTS: usize = 30;

/// What one poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The revision was already synced
    Unchanged { revision: String },
    /// A pass ran over the revision
    Synced { revision: String, report: PassReport },
}

impl CycleOutcome {
    pub fn is_clean(&self) -> bool {
        match self {
            CycleOutcome::Unchanged { .. } => true,
            CycleOutcome::Synced { report, .. } => report.is_clean(),
        }
    }
}

pub struct SyncDaemon {
    source: Arc<Mutex<Box<dyn SourceRepository>>>,
    stager: DashboardStager,
    pass: ReconciliationPass,
    health: Arc<HealthChecker>,
    poll_interval: Duration,
    last_synced: Option<String>,
}

impl SyncDaemon {
    /// Wire a daemon around an already prepared source and remote.
    pub fn new(
        source: Box<dyn SourceRepository>,
        stager: DashboardStager,
        api: Arc<dyn RemoteApi>,
        health: Arc<HealthChecker>,
        poll_interval: Duration,
    ) -> Self {
        let reconciler = Arc::new(FolderReconciler::new(api.clone(), Arc::new(FolderCache::new())));
        let uploader = UploadDriver::new(api, reconciler.clone());
        let pass = ReconciliationPass::new(
            stager.dashboards_dir(),
            Arc::new(FsReader),
            reconciler,
            uploader,
        );
        Self {
            source: Arc::new(Mutex::new(source)),
            stager,
            pass,
            health,
            poll_interval,
            last_synced: None,
        }
    }

    /// Run the startup sequence: wait for the remote, provision a token when
    /// none is configured, and clone the repository. Any failure is fatal.
    pub async fn start(config: &SyncConfig, health: Arc<HealthChecker>) -> Result<Self, SyncError> {
        let remote = &config.remote;
        let auth = if remote.has_token() {
            RemoteAuth::Token(remote.token.clone())
        } else {
            RemoteAuth::Basic {
                user: remote.user.clone(),
                password: remote.password.clone(),
            }
        };
        let mut client = GrafanaClient::new(remote.url.clone(), auth, remote.request_timeout())?;

        client.wait_for_ready(remote.ready_timeout()).await?;
        health.set_remote_healthy(true);

        if remote.has_token() {
            info!("Using provided service account token");
        } else {
            info!("No token configured, provisioning a service account token");
            client.validate_basic_auth(BASIC_AUTH_ATTEMPTS).await?;
            let token = client
                .provision_service_account_token(
                    &remote.service_account,
                    &remote.token_name,
                    remote.ready_timeout(),
                )
                .await?;
            client = client.with_token(token);
        }

        let source_config = &config.source;
        let git_auth = GitAuth::select(
            &source_config.repo_url,
            Some(source_config.ssh_key.as_str()),
            Some(source_config.https_user.as_str()),
            Some(source_config.https_password.as_str()),
        )?;
        let repo = GitRepository::new(
            source_config.repo_url.clone(),
            source_config.branch.clone(),
            source_config.repo_dir.clone(),
            git_auth,
        )?;
        let stager = DashboardStager::new(
            source_config.repo_dir.clone(),
            source_config.repo_subdir(),
            source_config.dashboards_dir.clone(),
        );

        let daemon = Self::new(
            Box::new(repo),
            stager,
            Arc::new(client),
            health.clone(),
            config.poll_interval(),
        );
        daemon
            .with_source(|source| source.prepare())
            .await
            .map_err(|e| SyncError::Startup(format!("Failed to clone repository: {}", e)))?;
        health.set_source_healthy(true);
        Ok(daemon)
    }

    pub fn last_synced_revision(&self) -> Option<&str> {
        self.last_synced.as_deref()
    }

    pub fn health(&self) -> &Arc<HealthChecker> {
        &self.health
    }

    /// Git calls block; run them off the async workers.
    async fn with_source<T, F>(&self, f: F) -> Result<T, SyncError>
    where
        F: FnOnce(&mut Box<dyn SourceRepository>) -> Result<T, SyncError> + Send + 'static,
        T: Send + 'static,
    {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || {
            let mut guard = source.lock();
            f(&mut *guard)
        })
        .await
        .map_err(|e| SyncError::Source(format!("Source task failed: {}", e)))?
    }

    /// One poll: fetch, and when the revision is not yet synced, stage and
    /// run a pass.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, SyncError> {
        let revision = match self.with_source(|source| source.fetch_latest_revision()).await {
            Ok(revision) => revision,
            Err(e) => {
                warn!(error = %e, "Failed to fetch latest revision");
                self.health.set_source_healthy(false);
                self.health.record_error(e.to_string());
                return Err(e);
            }
        };
        self.health.set_source_healthy(true);

        if self.last_synced.as_deref() == Some(revision.as_str()) {
            info!(revision = %revision, "No new revision");
            return Ok(CycleOutcome::Unchanged { revision });
        }
        info!(revision = %revision, "Syncing revision");

        let provenance = match self.with_source(|source| source.revision_info()).await {
            Ok(revision_info) => {
                let message = revision_info.provenance_message();
                info!(version = %message, "Revision metadata");
                Some(message)
            }
            Err(e) => {
                warn!(error = %e, "Failed to read revision metadata");
                None
            }
        };

        let stager = self.stager.clone();
        let staged = tokio::task::spawn_blocking(move || stager.stage())
            .await
            .map_err(|e| SyncError::Source(format!("Staging task failed: {}", e)))
            .and_then(|staged| staged);
        let staged = match staged {
            Ok(staged) => staged,
            Err(e) => {
                error!(error = %e, "Failed to stage dashboards");
                self.health.record_error(e.to_string());
                return Err(e);
            }
        };

        let report = self.pass.run(&staged, provenance.as_deref()).await;
        self.record_pass(&revision, &report);
        Ok(CycleOutcome::Synced { revision, report })
    }

    fn record_pass(&mut self, revision: &str, report: &PassReport) {
        self.health.record_sync(Utc::now());

        // Only a pass where every upload failed marks the server unusable.
        self.health
            .set_remote_healthy(report.uploaded > 0 || report.failed_uploads == 0);

        if report.is_clean() {
            self.health.clear_error();
            self.last_synced = Some(revision.to_string());
        } else {
            warn!(revision = %revision, errors = report.errors.len(), "Pass had failures, will retry");
            if let Some(last) = report.last_error() {
                self.health.record_error(last);
            }
        }
    }

    /// Poll until `shutdown` resolves. A cycle in flight always completes.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(interval_secs = self.poll_interval.as_secs(), "Starting sync loop");
        loop {
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "Sync cycle failed");
            }
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down sync loop");
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
