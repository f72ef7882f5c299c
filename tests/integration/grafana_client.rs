use super::support::{spawn_fake_grafana, GrafanaState, STATIC_TOKEN};
use dashsync::error::RemoteError;
use dashsync::remote::{
    DashboardUpsert, FolderCache, FolderReconciler, GrafanaClient, RemoteApi, RemoteAuth,
};
use dashsync::tree::FolderForest;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn client_with(auth: RemoteAuth) -> (Arc<Mutex<GrafanaState>>, GrafanaClient) {
    let state = Arc::new(Mutex::new(GrafanaState::default()));
    let url = spawn_fake_grafana(state.clone()).await;
    let client = GrafanaClient::new(url, auth, Duration::from_secs(5))
        .unwrap()
        .with_retry_interval(Duration::from_millis(10));
    (state, client)
}

async fn token_client() -> (Arc<Mutex<GrafanaState>>, GrafanaClient) {
    client_with(RemoteAuth::Token(STATIC_TOKEN.to_string())).await
}

#[tokio::test]
async fn wait_for_ready_answers_when_server_is_up() {
    let (_, client) = token_client().await;
    client.wait_for_ready(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn wait_for_ready_times_out_on_dead_server() {
    let client = GrafanaClient::new(
        "http://127.0.0.1:9",
        RemoteAuth::Token(STATIC_TOKEN.to_string()),
        Duration::from_millis(200),
    )
    .unwrap()
    .with_retry_interval(Duration::from_millis(10));
    let err = client.wait_for_ready(Duration::from_millis(100)).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn reconciles_nested_folders_over_http() {
    let (state, client) = token_client().await;
    let reconciler = FolderReconciler::new(Arc::new(client), Arc::new(FolderCache::new()));
    let mut forest = FolderForest::from_folder_paths(["team/ops/db", "team/dev"]);

    let outcomes = reconciler.reconcile_forest(&mut forest).await;
    assert!(outcomes.iter().all(|o| o.is_ok()));

    let state = state.lock();
    assert_eq!(state.folders.len(), 4);
    let team = state.folders.iter().find(|f| f.name == "team").unwrap();
    let ops = state.folders.iter().find(|f| f.name == "ops").unwrap();
    let db = state.folders.iter().find(|f| f.name == "db").unwrap();
    assert_eq!(team.parent(), None);
    assert_eq!(ops.parent(), Some(team.uid.as_str()));
    assert_eq!(db.parent(), Some(ops.uid.as_str()));
    assert_eq!(forest.get("team/ops/db").unwrap().remote_id, Some(db.id));
}

#[tokio::test]
async fn second_reconcile_over_http_creates_nothing() {
    let (state, client) = token_client().await;
    let api: Arc<dyn RemoteApi> = Arc::new(client);

    let first = FolderReconciler::new(api.clone(), Arc::new(FolderCache::new()));
    first
        .reconcile_forest(&mut FolderForest::from_folder_paths(["a/b"]))
        .await;

    // Fresh cache, as after a restart.
    let second = FolderReconciler::new(api, Arc::new(FolderCache::new()));
    let mut forest = FolderForest::from_folder_paths(["a/b"]);
    let outcomes = second.reconcile_forest(&mut forest).await;

    assert!(outcomes[0].is_ok());
    assert_eq!(state.lock().folders.len(), 2);
    assert!(forest.get("a/b").unwrap().is_reconciled());
}

#[tokio::test]
async fn duplicate_create_maps_to_conflict() {
    let (_, client) = token_client().await;
    client.create_folder("dup", None).await.unwrap();
    let err = client.create_folder("dup", None).await.unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn upsert_sends_folder_and_message() {
    let (state, client) = token_client().await;
    let folder = client.create_folder("team", None).await.unwrap();

    let request = DashboardUpsert::new(
        json!({"title": "cpu"}),
        folder.id,
        Some("commit abc1234: tweak - Dana".to_string()),
    );
    client.upsert_dashboard(&request).await.unwrap();

    let state = state.lock();
    let stored = &state.dashboards[0];
    assert_eq!(stored["folderId"], folder.id);
    assert_eq!(stored["overwrite"], true);
    assert_eq!(stored["message"], "commit abc1234: tweak - Dana");
    assert_eq!(stored["dashboard"]["title"], "cpu");
}

#[tokio::test]
async fn upsert_into_missing_folder_is_not_found() {
    let (_, client) = token_client().await;
    let request = DashboardUpsert::new(json!({}), 404_404, None);
    let err = client.upsert_dashboard(&request).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn bad_token_is_unauthorized() {
    let (_, client) = client_with(RemoteAuth::Token("wrong".to_string())).await;
    let err = client.list_folders(None).await.unwrap_err();
    assert!(matches!(err, RemoteError::Unauthorized { status: 401, .. }));
}

#[tokio::test]
async fn provisions_service_account_token() {
    let (state, client) = client_with(RemoteAuth::Basic {
        user: "admin".to_string(),
        password: "admin".to_string(),
    })
    .await;

    client.validate_basic_auth(3).await.unwrap();
    let token = client
        .provision_service_account_token("git-sync-sa", "git-sync-token", Duration::from_secs(2))
        .await
        .unwrap();
    assert!(token.starts_with("glsa_"));

    let tokened = client.with_token(token.clone());
    assert!(tokened.list_folders(None).await.unwrap().is_empty());

    // Provisioning again reuses the account and replaces the token.
    let replacement = client
        .provision_service_account_token("git-sync-sa", "git-sync-token", Duration::from_secs(2))
        .await
        .unwrap();
    assert_ne!(replacement, token);

    let state = state.lock();
    assert_eq!(state.service_accounts.len(), 1);
    assert_eq!(state.tokens.len(), 1);
    assert_eq!(state.deleted_tokens.len(), 1);
}
