//! Test doubles for the remote dashboard server.

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use dashsync::error::RemoteError;
use dashsync::remote::{CreatedFolder, DashboardUpsert, RemoteApi, RemoteFolder};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// In-process remote with call counters
#[derive(Default)]
pub struct MemoryRemote {
    pub folders: Mutex<Vec<RemoteFolder>>,
    pub uploads: Mutex<Vec<DashboardUpsert>>,
    pub list_calls: Mutex<usize>,
    pub create_calls: Mutex<usize>,
}

impl MemoryRemote {
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().len()
    }

    pub fn folder_named(&self, name: &str) -> Option<RemoteFolder> {
        self.folders.lock().iter().find(|f| f.name == name).cloned()
    }
}

#[async_trait]
impl RemoteApi for MemoryRemote {
    async fn list_folders(&self, parent_uid: Option<&str>) -> Result<Vec<RemoteFolder>, RemoteError> {
        *self.list_calls.lock() += 1;
        Ok(self
            .folders
            .lock()
            .iter()
            .filter(|f| f.parent() == parent_uid)
            .cloned()
            .collect())
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_uid: Option<&str>,
    ) -> Result<CreatedFolder, RemoteError> {
        *self.create_calls.lock() += 1;
        let mut folders = self.folders.lock();
        let id = folders.len() as i64 + 1;
        let uid = format!("mem-{}", id);
        folders.push(RemoteFolder {
            id,
            uid: uid.clone(),
            name: name.to_string(),
            parent_uid: parent_uid.map(str::to_string),
        });
        Ok(CreatedFolder { id, uid })
    }

    async fn upsert_dashboard(&self, request: &DashboardUpsert) -> Result<(), RemoteError> {
        self.uploads.lock().push(request.clone());
        Ok(())
    }
}

pub const STATIC_TOKEN: &str = "static-token";

/// State behind the fake HTTP server
#[derive(Debug, Default)]
pub struct GrafanaState {
    pub folders: Vec<RemoteFolder>,
    pub dashboards: Vec<Value>,
    pub service_accounts: Vec<(i64, String)>,
    /// (token id, account id, name, key)
    pub tokens: Vec<(i64, i64, String, String)>,
    pub deleted_tokens: Vec<i64>,
    next_id: i64,
}

impl GrafanaState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn accepts(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };
        if value.starts_with("Basic ") {
            return true;
        }
        match value.strip_prefix("Bearer ") {
            Some(token) => token == STATIC_TOKEN || self.tokens.iter().any(|t| t.3 == token),
            None => false,
        }
    }
}

type Shared = Arc<Mutex<GrafanaState>>;

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({"database": "ok"}))
}

async fn list_folders(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = state.lock();
    if !state.accepts(&headers) {
        return unauthorized();
    }
    let parent = query.get("parentUid").map(String::as_str);
    let folders: Vec<RemoteFolder> = state
        .folders
        .iter()
        .filter(|f| f.parent() == parent)
        .cloned()
        .collect();
    Json(folders).into_response()
}

async fn create_folder(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock();
    if !state.accepts(&headers) {
        return unauthorized();
    }
    let title = body["title"].as_str().unwrap_or_default().to_string();
    let parent = body["parentUid"].as_str().map(str::to_string);
    if state
        .folders
        .iter()
        .any(|f| f.name == title && f.parent() == parent.as_deref())
    {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "a folder with the same name already exists"})),
        )
            .into_response();
    }
    let id = state.next_id();
    let uid = format!("uid-{}", id);
    state.folders.push(RemoteFolder {
        id,
        uid: uid.clone(),
        name: title.clone(),
        parent_uid: parent,
    });
    Json(json!({"id": id, "uid": uid, "title": title})).into_response()
}

async fn upsert_dashboard(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock();
    if !state.accepts(&headers) {
        return unauthorized();
    }
    let folder_id = body["folderId"].as_i64().unwrap_or_default();
    if folder_id != 0 && !state.folders.iter().any(|f| f.id == folder_id) {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "folder not found"}))).into_response();
    }
    state.dashboards.push(body);
    Json(json!({"status": "success"})).into_response()
}

async fn search_accounts(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock();
    let accounts: Vec<Value> = state
        .service_accounts
        .iter()
        .map(|(id, name)| json!({"id": id, "name": name}))
        .collect();
    Json(json!({"serviceAccounts": accounts}))
}

async fn create_account(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let mut state = state.lock();
    let id = state.next_id();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    state.service_accounts.push((id, name.clone()));
    Json(json!({"id": id, "name": name, "role": body["role"]}))
}

async fn list_tokens(State(state): State<Shared>, Path(account): Path<i64>) -> Json<Value> {
    let state = state.lock();
    let tokens: Vec<Value> = state
        .tokens
        .iter()
        .filter(|t| t.1 == account)
        .map(|t| json!({"id": t.0, "name": t.2}))
        .collect();
    Json(Value::Array(tokens))
}

async fn create_token(
    State(state): State<Shared>,
    Path(account): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock();
    let id = state.next_id();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let key = format!("glsa_{}", id);
    state.tokens.push((id, account, name.clone(), key.clone()));
    Json(json!({"id": id, "name": name, "key": key}))
}

async fn delete_token(
    State(state): State<Shared>,
    Path((_account, token)): Path<(i64, i64)>,
) -> StatusCode {
    let mut state = state.lock();
    state.tokens.retain(|t| t.0 != token);
    state.deleted_tokens.push(token);
    StatusCode::OK
}

/// Serve a fake Grafana API on an ephemeral port. Returns its base URL.
pub async fn spawn_fake_grafana(state: Shared) -> String {
    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/folders", get(list_folders).post(create_folder))
        .route("/api/dashboards/db", post(upsert_dashboard))
        .route("/api/serviceaccounts/search", get(search_accounts))
        .route("/api/serviceaccounts", post(create_account))
        .route(
            "/api/serviceaccounts/{id}/tokens",
            get(list_tokens).post(create_token),
        )
        .route(
            "/api/serviceaccounts/{id}/tokens/{token_id}",
            delete(delete_token),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}
