use super::support::MemoryRemote;
use dashsync::change::ChangeDetector;
use dashsync::remote::{FolderCache, FolderReconciler};
use dashsync::source::{DashboardStager, FsReader};
use dashsync::sync::{ReconciliationPass, UploadDriver};
use dashsync::tree::FolderForest;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn pass_over(dashboards: &Path, remote: Arc<MemoryRemote>) -> ReconciliationPass {
    let reconciler = Arc::new(FolderReconciler::new(remote.clone(), Arc::new(FolderCache::new())));
    let uploader = UploadDriver::new(remote, reconciler.clone());
    ReconciliationPass::new(dashboards, Arc::new(FsReader), reconciler, uploader)
}

#[test]
fn forest_roots_follow_base_directory() {
    let base = PathBuf::from("/data/a");
    let paths = vec![
        base.join("b/dash1.json"),
        base.join("c/dash2.json"),
        base.join("b/dash3.json"),
    ];

    let forest = FolderForest::build(&paths, &base);

    let roots: Vec<&str> = forest
        .roots()
        .into_iter()
        .map(|idx| forest.node(idx).full_path.as_str())
        .collect();
    assert_eq!(roots, vec!["b", "c"]);
    assert_eq!(forest.len(), 2);
    assert!(forest.edges().is_empty());
}

#[test]
fn change_detection_over_staged_files() {
    let repo = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    write(repo.path(), "team/a.json", r#"{"v":1}"#);
    write(repo.path(), "team/b.json", r#"{"v":1}"#);
    let stager = DashboardStager::new(repo.path(), None, staging.path());
    let mut detector = ChangeDetector::new();

    let staged = stager.stage().unwrap();
    assert_eq!(detector.changed_subset(&staged, &FsReader).len(), 2);
    assert!(detector.changed_subset(&staged, &FsReader).is_empty());

    write(repo.path(), "team/b.json", r#"{"v":2}"#);
    let staged = stager.stage().unwrap();
    assert_eq!(
        detector.changed_subset(&staged, &FsReader),
        vec![staging.path().join("team/b.json")]
    );
}

#[tokio::test]
async fn unchanged_dashboard_is_uploaded_once_across_cycles() {
    let repo = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    write(repo.path(), "ops/db/latency.json", r#"{"title":"latency"}"#);
    write(repo.path(), "home.json", r#"{"title":"home"}"#);
    let stager = DashboardStager::new(repo.path(), None, staging.path());
    let remote = Arc::new(MemoryRemote::default());
    let mut pass = pass_over(staging.path(), remote.clone());

    let first = pass.run(&stager.stage().unwrap(), Some("commit 1111111: init - Dana")).await;
    assert_eq!(first.uploaded, 2);
    assert!(first.is_clean());

    let second = pass.run(&stager.stage().unwrap(), Some("commit 2222222: docs - Dana")).await;
    assert_eq!(second.changed, 0);
    assert_eq!(remote.upload_count(), 2);

    let db = remote.folder_named("db").unwrap();
    let ops = remote.folder_named("ops").unwrap();
    assert_eq!(db.parent(), Some(ops.uid.as_str()));
    let uploads = remote.uploads.lock();
    let latency = uploads
        .iter()
        .find(|u| u.dashboard["title"] == "latency")
        .unwrap();
    assert_eq!(latency.folder_id, db.id);
    let home = uploads.iter().find(|u| u.dashboard["title"] == "home").unwrap();
    assert_eq!(home.folder_id, 0);
}

#[tokio::test]
async fn existing_remote_tree_is_adopted_without_creates() {
    let staging = tempfile::tempdir().unwrap();
    write(staging.path(), "x/y/z/d.json", "{}");
    let paths = vec![staging.path().join("x/y/z/d.json")];
    let remote = Arc::new(MemoryRemote::default());

    pass_over(staging.path(), remote.clone()).run(&paths, None).await;
    *remote.list_calls.lock() = 0;
    *remote.create_calls.lock() = 0;

    // A restarted process starts with empty fingerprints and cache.
    let report = pass_over(staging.path(), remote.clone()).run(&paths, None).await;

    assert_eq!(report.uploaded, 1);
    assert_eq!(*remote.list_calls.lock(), 3);
    assert_eq!(*remote.create_calls.lock(), 0);
}

#[tokio::test]
async fn folder_added_between_cycles_is_created() {
    let staging = tempfile::tempdir().unwrap();
    write(staging.path(), "first/a.json", "{}");
    let remote = Arc::new(MemoryRemote::default());
    let mut pass = pass_over(staging.path(), remote.clone());

    pass.run(&[staging.path().join("first/a.json")], None).await;

    write(staging.path(), "second/nested/b.json", "{}");
    let paths = vec![
        staging.path().join("first/a.json"),
        staging.path().join("second/nested/b.json"),
    ];
    let report = pass.run(&paths, None).await;

    assert_eq!(report.changed, 1);
    assert_eq!(report.uploaded, 1);
    let nested = remote.folder_named("nested").unwrap();
    assert_eq!(remote.uploads.lock().last().unwrap().folder_id, nested.id);
}
