use dashsync::health::{serve, HealthChecker};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;

#[tokio::test]
async fn health_routes_report_status_codes() {
    let checker = Arc::new(HealthChecker::new());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let (addr, server) = serve("127.0.0.1:0", checker.clone(), async move {
        let _ = stop_rx.await;
    })
    .await
    .unwrap();
    let http = reqwest::Client::new();

    for route in ["/", "/health", "/healthz"] {
        let resp = http.get(format!("http://{}{}", addr, route)).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 503, "route {}", route);
    }

    checker.set_remote_healthy(true);
    let resp = http.get(format!("http://{}/healthz", addr)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["remote_healthy"], true);
    assert_eq!(body["source_healthy"], false);

    checker.set_source_healthy(true);
    checker.record_error("upload failed");
    let body: Value = http
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["last_error"], "upload failed");

    stop_tx.send(()).unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn bind_failure_is_startup_error() {
    let checker = Arc::new(HealthChecker::new());
    let result = serve("not-an-address", checker, async {}).await;
    assert!(result.is_err());
}
