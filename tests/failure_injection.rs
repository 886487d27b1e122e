//! Failure injection tests for the load balancer.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::net::TcpListener;

mod common;

#[tokio::test]
async fn test_round_robin_order() {
    let b0 = common::start_mock_backend("b0").await;
    let b1 = common::start_mock_backend("b1").await;
    let b2 = common::start_mock_backend("b2").await;

    let proxy = common::start_proxy(common::config_for(&[b0, b1, b2])).await;
    let client = common::client();

    let mut bodies = Vec::new();
    for _ in 0..4 {
        let res = client.get(proxy.url("/")).send().await.expect("Proxy unreachable");
        assert_eq!(res.status(), 200);
        bodies.push(res.text().await.unwrap());
    }
    assert_eq!(bodies, vec!["b1", "b2", "b0", "b1"]);
}

#[tokio::test]
async fn test_dead_backend_is_demoted_and_skipped() {
    let b0 = common::start_mock_backend("b0").await;
    let dead = common::dead_address().await;
    let b2 = common::start_mock_backend("b2").await;

    let proxy = common::start_proxy(common::config_for(&[b0, dead, b2])).await;
    let client = common::client();

    // First pick lands on the dead backend and fails over.
    let res = client.get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "b2");
    assert!(!proxy.pool.backends()[1].is_alive(), "dead backend should be demoted");

    for _ in 0..6 {
        let res = client.get(proxy.url("/")).send().await.unwrap();
        assert_eq!(res.status(), 200);
        let body = res.text().await.unwrap();
        assert!(body == "b0" || body == "b2", "unexpected body {}", body);
    }
}

#[tokio::test]
async fn test_all_backends_dead_returns_503() {
    let dead_a = common::dead_address().await;
    let dead_b = common::dead_address().await;

    let proxy = common::start_proxy(common::config_for(&[dead_a, dead_b])).await;
    let client = common::client();

    let res = client.get(proxy.url("/anything")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE.as_u16());
    assert_eq!(res.text().await.unwrap(), "Service not available");
    assert!(proxy.pool.backends().iter().all(|b| !b.is_alive()));

    // Nothing alive any more: rejected without forwarding.
    let res = client.get(proxy.url("/again")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE.as_u16());
}

#[tokio::test]
async fn test_backend_error_status_is_relayed_without_retry() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let backend = common::start_programmable_backend(move || {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (500, "boom".into())
        }
    })
    .await;

    let proxy = common::start_proxy(common::config_for(&[backend])).await;
    let res = common::client().get(proxy.url("/")).send().await.unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "boom");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(proxy.pool.backends()[0].is_alive());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let backend = common::start_mock_backend("ok").await;
    let proxy = common::start_proxy(common::config_for(&[backend])).await;

    let res = common::client().get(proxy.url("/")).send().await.unwrap();
    assert!(res.headers().get("x-request-id").is_some());

    let res = common::client()
        .get(proxy.url("/"))
        .header("x-request-id", "fixed-id")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "fixed-id");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let backend = common::start_mock_backend("ok").await;
    let mut config = common::config_for(&[backend]);
    config.listener.max_body_bytes = 8;
    let proxy = common::start_proxy(config).await;

    let res = common::client()
        .post(proxy.url("/upload"))
        .body(vec![b'x'; 64])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE.as_u16());
}

#[tokio::test]
async fn test_health_monitor_revives_backend() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = common::config_for(&[addr]);
    config.health_check.enabled = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    let proxy = common::start_proxy(config).await;

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!proxy.pool.backends()[0].is_alive(), "probe should mark closed port dead");

    let listener = TcpListener::bind(addr).await.unwrap();
    common::serve_programmable(listener, || async { (200, "back".to_string()) });

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(proxy.pool.backends()[0].is_alive(), "probe should revive backend");

    let res = common::client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "back");
}
