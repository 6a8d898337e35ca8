//! Integration tests for the HTTP health endpoint.
//!
//! Validates that `GET /health` returns `200 OK` with body `"ok"` without
//! opening a session.

use super::test_helpers::{spawn_server, test_config};

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let (addr, ct) = spawn_server(test_config()).await;

    let response = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("health request");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("body"), "ok");

    ct.cancel();
}
