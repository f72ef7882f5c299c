//! Health reporting
//!
//! A small status record updated by the sync loop and served over HTTP. The
//! server only reads these flags; it never sees the folder cache or the
//! fingerprint table.

use crate::error::SyncError;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Aggregate health derived from the component flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    fn from_flags(remote_healthy: bool, source_healthy: bool) -> Self {
        match (remote_healthy, source_healthy) {
            (true, true) => HealthState::Healthy,
            (false, false) => HealthState::Unhealthy,
            _ => HealthState::Degraded,
        }
    }

    /// Degraded still answers 200 so orchestrators keep the process alive.
    pub fn http_status(self) -> StatusCode {
        match self {
            HealthState::Healthy | HealthState::Degraded => StatusCode::OK,
            HealthState::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Snapshot served by the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub timestamp: DateTime<Utc>,
    pub remote_healthy: bool,
    pub source_healthy: bool,
    #[serde(rename = "last_sync_time", default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct HealthFlags {
    remote_healthy: bool,
    source_healthy: bool,
    last_sync: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Shared health state. Both components start unhealthy.
#[derive(Debug, Default)]
pub struct HealthChecker {
    flags: RwLock<HealthFlags>,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remote_healthy(&self, healthy: bool) {
        self.flags.write().remote_healthy = healthy;
    }

    pub fn set_source_healthy(&self, healthy: bool) {
        self.flags.write().source_healthy = healthy;
    }

    pub fn record_sync(&self, at: DateTime<Utc>) {
        self.flags.write().last_sync = Some(at);
    }

    pub fn record_error(&self, message: impl Into<String>) {
        self.flags.write().last_error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.flags.write().last_error = None;
    }

    pub fn status(&self) -> HealthStatus {
        let flags = self.flags.read();
        HealthStatus {
            status: HealthState::from_flags(flags.remote_healthy, flags.source_healthy),
            timestamp: Utc::now(),
            remote_healthy: flags.remote_healthy,
            source_healthy: flags.source_healthy,
            last_sync: flags.last_sync,
            last_error: flags.last_error.clone(),
        }
    }
}

async fn health_handler(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    let status = checker.status();
    (status.status.http_status(), Json(status))
}

/// Router answering on `/`, `/health` and `/healthz`.
pub fn router(checker: Arc<HealthChecker>) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route("/healthz", get(health_handler))
        .with_state(checker)
}

/// Bind `addr` and serve health requests until `shutdown` resolves.
///
/// Binding happens before this returns so address errors surface at startup.
/// Returns the bound address and the server task.
pub async fn serve<F>(
    addr: &str,
    checker: Arc<HealthChecker>,
    shutdown: F,
) -> Result<(SocketAddr, JoinHandle<()>), SyncError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| SyncError::Startup(format!("Failed to bind health server on {}: {}", addr, e)))?;
    let local = listener.local_addr()?;
    info!(addr = %local, "Starting health check server");

    let app = router(checker);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
            error!(error = %e, "Health server error");
        }
    });
    Ok((local, handle))
}
