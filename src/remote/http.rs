//! HTTP implementation of the remote API for a Grafana server.

use super::contract::{CreatedFolder, DashboardUpsert, RemoteApi, RemoteFolder};
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Credentials presented to the server
#[derive(Clone, PartialEq, Eq)]
pub enum RemoteAuth {
    Token(String),
    Basic { user: String, password: String },
}

impl std::fmt::Debug for RemoteAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteAuth::Token(_) => f.write_str("RemoteAuth::Token(***)"),
            RemoteAuth::Basic { user, .. } => {
                write!(f, "RemoteAuth::Basic {{ user: {:?}, password: *** }}", user)
            }
        }
    }
}

/// Grafana HTTP API client
#[derive(Clone)]
pub struct GrafanaClient {
    base_url: String,
    auth: RemoteAuth,
    basic: Option<(String, String)>,
    http: reqwest::Client,
    retry_interval: Duration,
}

impl std::fmt::Debug for GrafanaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrafanaClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ServiceAccountSearch {
    #[serde(rename = "serviceAccounts", default)]
    service_accounts: Vec<NamedEntity>,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedToken {
    key: String,
}

impl GrafanaClient {
    pub fn new(
        base_url: impl Into<String>,
        auth: RemoteAuth,
        request_timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        let basic = match &auth {
            RemoteAuth::Basic { user, password } => Some((user.clone(), password.clone())),
            RemoteAuth::Token(_) => None,
        };
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            basic,
            http,
            retry_interval: Duration::from_secs(2),
        })
    }

    /// Delay between attempts in the startup wait loops.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Same server, switched to token auth. Basic credentials are kept for
    /// service-account administration.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        let mut client = self.clone();
        client.auth = RemoteAuth::Token(token.into());
        client
    }

    pub fn auth(&self) -> &RemoteAuth {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            RemoteAuth::Token(token) => request.bearer_auth(token),
            RemoteAuth::Basic { user, password } => request.basic_auth(user, Some(password)),
        }
    }

    fn admin(&self, request: RequestBuilder) -> Result<RequestBuilder, RemoteError> {
        match &self.basic {
            Some((user, password)) => Ok(request.basic_auth(user, Some(password))),
            None => Err(RemoteError::Unauthorized {
                status: 0,
                body: "Service account administration requires basic credentials".to_string(),
            }),
        }
    }

    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::from_status(status.as_u16(), body))
    }

    /// Poll `/api/health` until it answers 200 or `timeout` elapses.
    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<(), RemoteError> {
        info!(url = %self.base_url, "Waiting for remote API");
        let deadline = Instant::now() + timeout;
        let url = self.url("/api/health");

        while Instant::now() < deadline {
            match self.http.get(&url).send().await {
                Ok(resp) if resp.status() == StatusCode::OK => {
                    info!("Remote API is ready");
                    return Ok(());
                }
                Ok(resp) => warn!(status = resp.status().as_u16(), "Remote API not ready"),
                Err(e) => warn!(error = %e, "Remote API not reachable"),
            }
            tokio::time::sleep(self.retry_interval).await;
        }

        Err(RemoteError::Transport(format!(
            "Remote API did not become ready within {:?}",
            timeout
        )))
    }

    /// Check basic credentials against `/api/health`, retrying on anything
    /// but an explicit 401.
    pub async fn validate_basic_auth(&self, attempts: usize) -> Result<(), RemoteError> {
        info!("Validating remote credentials");
        let url = self.url("/api/health");

        for _ in 0..attempts {
            match self.admin(self.http.get(&url))?.send().await {
                Ok(resp) if resp.status() == StatusCode::OK => {
                    info!("Remote authentication OK");
                    return Ok(());
                }
                Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED => {
                    return Err(RemoteError::Unauthorized {
                        status: 401,
                        body: "Invalid credentials".to_string(),
                    });
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = resp.text().await.unwrap_or_default();
                    warn!(status, body = %body, "Unexpected auth check response");
                }
                Err(e) => warn!(error = %e, "Network error during auth check"),
            }
            tokio::time::sleep(self.retry_interval).await;
        }

        Err(RemoteError::Transport(
            "Remote authentication check timed out".to_string(),
        ))
    }

    /// Find or create the service account, replace its token named
    /// `token_name`, and wait until the new token is accepted.
    pub async fn provision_service_account_token(
        &self,
        account_name: &str,
        token_name: &str,
        ready_timeout: Duration,
    ) -> Result<String, RemoteError> {
        let account_id = self.ensure_service_account(account_name).await?;
        let token = self.replace_token(account_id, token_name).await?;
        self.wait_for_token(&token, ready_timeout).await?;
        info!(account = account_name, "Service account token ready");
        Ok(token)
    }

    async fn ensure_service_account(&self, account_name: &str) -> Result<i64, RemoteError> {
        let resp = self
            .admin(self.http.get(self.url("/api/serviceaccounts/search")))?
            .send()
            .await?;
        let search: ServiceAccountSearch = Self::check(resp).await?.json().await?;

        if let Some(existing) = search.service_accounts.iter().find(|sa| sa.name == account_name) {
            debug!(account = account_name, id = existing.id, "Service account exists");
            return Ok(existing.id);
        }

        let resp = self
            .admin(self.http.post(self.url("/api/serviceaccounts")))?
            .json(&json!({ "name": account_name, "role": "Admin" }))
            .send()
            .await?;
        let created: NamedEntity = Self::check(resp).await?.json().await?;
        info!(account = account_name, id = created.id, "Service account created");
        Ok(created.id)
    }

    async fn replace_token(&self, account_id: i64, token_name: &str) -> Result<String, RemoteError> {
        let tokens_url = self.url(&format!("/api/serviceaccounts/{}/tokens", account_id));
        let resp = self.admin(self.http.get(&tokens_url))?.send().await?;
        let tokens: Vec<NamedEntity> = Self::check(resp).await?.json().await?;

        if let Some(old) = tokens.iter().find(|t| t.name == token_name) {
            let delete_url = format!("{}/{}", tokens_url, old.id);
            match self.admin(self.http.delete(&delete_url))?.send().await {
                Ok(_) => info!(token = token_name, "Old token deleted"),
                Err(e) => warn!(token = token_name, error = %e, "Failed to delete old token"),
            }
        }

        let resp = self
            .admin(self.http.post(&tokens_url))?
            .json(&json!({ "name": token_name }))
            .send()
            .await?;
        let created: CreatedToken = Self::check(resp).await?.json().await?;
        info!(token = token_name, "Token created");
        Ok(created.key)
    }

    async fn wait_for_token(&self, token: &str, timeout: Duration) -> Result<(), RemoteError> {
        let url = self.url("/api/folders");
        let deadline = Instant::now() + timeout;

        while Instant::now() < deadline {
            match self.http.get(&url).bearer_auth(token).send().await {
                Ok(resp) if resp.status() == StatusCode::OK => return Ok(()),
                Ok(resp)
                    if resp.status() == StatusCode::UNAUTHORIZED
                        || resp.status() == StatusCode::FORBIDDEN =>
                {
                    return Err(RemoteError::Unauthorized {
                        status: resp.status().as_u16(),
                        body: "Service account token unauthorized".to_string(),
                    });
                }
                Ok(resp) => warn!(status = resp.status().as_u16(), "Token not accepted yet"),
                Err(e) => warn!(error = %e, "Token check failed"),
            }
            tokio::time::sleep(self.retry_interval).await;
        }

        Err(RemoteError::Transport(format!(
            "Service account token not ready within {:?}",
            timeout
        )))
    }
}

#[async_trait]
impl RemoteApi for GrafanaClient {
    async fn list_folders(&self, parent_uid: Option<&str>) -> Result<Vec<RemoteFolder>, RemoteError> {
        let mut request = self
            .authorize(self.http.get(self.url("/api/folders")))
            .query(&[("limit", "1000")]);
        if let Some(parent) = parent_uid {
            request = request.query(&[("parentUid", parent)]);
        }
        let resp = Self::check(request.send().await?).await?;
        let folders: Vec<RemoteFolder> = resp.json().await?;
        debug!(parent = ?parent_uid, count = folders.len(), "Listed folders");
        Ok(folders)
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_uid: Option<&str>,
    ) -> Result<CreatedFolder, RemoteError> {
        let mut payload = json!({ "title": name });
        if let Some(parent) = parent_uid {
            payload["parentUid"] = json!(parent);
        }
        let resp = self
            .authorize(self.http.post(self.url("/api/folders")))
            .json(&payload)
            .send()
            .await?;
        let created: CreatedFolder = Self::check(resp).await?.json().await?;
        Ok(created)
    }

    async fn upsert_dashboard(&self, request: &DashboardUpsert) -> Result<(), RemoteError> {
        let resp = self
            .authorize(self.http.post(self.url("/api/dashboards/db")))
            .json(request)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
